//! Geom (mark) implementations
//!
//! Each mark lives in its own file as a unit struct implementing
//! [`GeomTrait`]. [`Geom`] is the cheap, clonable handle stored on layers.
//!
//! | mark      | required            | stat                      |
//! |-----------|---------------------|---------------------------|
//! | point     | x, y                |                           |
//! | line      | x, y                |                           |
//! | area      | x, y                |                           |
//! | bar       | x                   | count when y is unmapped  |
//! | histogram | x                   | bin                       |
//! | tile      | x, y                |                           |
//! | text      | x, y, label         |                           |
//! | segment   | x, y, xend, yend    |                           |
//! | ribbon    | x, ymin, ymax       |                           |
//! | path      | x, y                |                           |
//! | polygon   | x, y                |                           |
//! | errorbar  | x, ymin, ymax       |                           |

use crate::plot::{Mappings, ParameterValue, Stat};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::sync::Arc;

mod area;
mod bar;
mod errorbar;
mod histogram;
mod line;
mod path;
mod point;
mod polygon;
mod ribbon;
mod segment;
mod text;
mod tile;
mod types;

pub use types::{DefaultParam, GeomAesthetics, ParamKind};

/// Closed set of mark kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GeomType {
    Point,
    Line,
    Area,
    Bar,
    Histogram,
    Tile,
    Text,
    Segment,
    Ribbon,
    Path,
    Polygon,
    ErrorBar,
}

impl GeomType {
    pub const ALL: [GeomType; 12] = [
        GeomType::Point,
        GeomType::Line,
        GeomType::Area,
        GeomType::Bar,
        GeomType::Histogram,
        GeomType::Tile,
        GeomType::Text,
        GeomType::Segment,
        GeomType::Ribbon,
        GeomType::Path,
        GeomType::Polygon,
        GeomType::ErrorBar,
    ];
}

/// Behaviour of one mark kind
pub trait GeomTrait: std::fmt::Debug + std::fmt::Display + Send + Sync {
    fn geom_type(&self) -> GeomType;

    fn aesthetics(&self) -> GeomAesthetics;

    /// SETTING keys accepted besides literal aesthetics
    fn default_params(&self) -> &'static [DefaultParam] {
        &[]
    }

    /// Stat transform the layer needs, decided from its resolved mappings
    fn stat(
        &self,
        _mappings: &Mappings,
        _parameters: &BTreeMap<String, ParameterValue>,
    ) -> Option<Stat> {
        None
    }
}

/// Handle to a mark implementation
#[derive(Clone)]
pub struct Geom(Arc<dyn GeomTrait>);

impl Geom {
    pub fn point() -> Self {
        Self(Arc::new(point::Point))
    }

    pub fn line() -> Self {
        Self(Arc::new(line::Line))
    }

    pub fn area() -> Self {
        Self(Arc::new(area::Area))
    }

    pub fn bar() -> Self {
        Self(Arc::new(bar::Bar))
    }

    pub fn histogram() -> Self {
        Self(Arc::new(histogram::Histogram))
    }

    pub fn tile() -> Self {
        Self(Arc::new(tile::Tile))
    }

    pub fn text() -> Self {
        Self(Arc::new(text::Text))
    }

    pub fn segment() -> Self {
        Self(Arc::new(segment::Segment))
    }

    pub fn ribbon() -> Self {
        Self(Arc::new(ribbon::Ribbon))
    }

    pub fn path() -> Self {
        Self(Arc::new(path::Path))
    }

    pub fn polygon() -> Self {
        Self(Arc::new(polygon::Polygon))
    }

    pub fn errorbar() -> Self {
        Self(Arc::new(errorbar::ErrorBar))
    }

    pub fn from_type(geom_type: GeomType) -> Self {
        match geom_type {
            GeomType::Point => Self::point(),
            GeomType::Line => Self::line(),
            GeomType::Area => Self::area(),
            GeomType::Bar => Self::bar(),
            GeomType::Histogram => Self::histogram(),
            GeomType::Tile => Self::tile(),
            GeomType::Text => Self::text(),
            GeomType::Segment => Self::segment(),
            GeomType::Ribbon => Self::ribbon(),
            GeomType::Path => Self::path(),
            GeomType::Polygon => Self::polygon(),
            GeomType::ErrorBar => Self::errorbar(),
        }
    }

    /// Look up a mark by its DRAW name, case-insensitively
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        GeomType::ALL
            .iter()
            .map(|t| Self::from_type(*t))
            .find(|g| g.to_string() == lower)
    }

    /// Names accepted after DRAW, for error messages
    pub fn names() -> Vec<String> {
        GeomType::ALL
            .iter()
            .map(|t| Self::from_type(*t).to_string())
            .collect()
    }

    pub fn geom_type(&self) -> GeomType {
        self.0.geom_type()
    }

    pub fn aesthetics(&self) -> GeomAesthetics {
        self.0.aesthetics()
    }

    pub fn default_params(&self) -> &'static [DefaultParam] {
        self.0.default_params()
    }

    pub fn stat(
        &self,
        mappings: &Mappings,
        parameters: &BTreeMap<String, ParameterValue>,
    ) -> Option<Stat> {
        self.0.stat(mappings, parameters)
    }
}

impl std::fmt::Debug for Geom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Geom({})", self.0)
    }
}

impl std::fmt::Display for Geom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl PartialEq for Geom {
    fn eq(&self, other: &Self) -> bool {
        self.geom_type() == other.geom_type()
    }
}

impl Serialize for Geom {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.geom_type().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plot::{Aesthetic, AestheticValue, MappingSource};

    #[test]
    fn test_from_name() {
        assert_eq!(Geom::from_name("POINT"), Some(Geom::point()));
        assert_eq!(Geom::from_name("histogram"), Some(Geom::histogram()));
        assert_eq!(Geom::from_name("ErrorBar"), Some(Geom::errorbar()));
        assert_eq!(Geom::from_name("polygon"), Some(Geom::polygon()));
        assert_eq!(Geom::from_name("invalid_geom"), None);
    }

    #[test]
    fn test_required_is_subset_of_supported() {
        for t in GeomType::ALL {
            let aes = Geom::from_type(t).aesthetics();
            for req in aes.required {
                assert!(aes.is_supported(*req), "{:?} requires unsupported {}", t, req);
            }
        }
    }

    #[test]
    fn test_bar_counts_only_without_y() {
        let params = BTreeMap::new();
        let mut mappings = Mappings::new();
        mappings.insert(
            Aesthetic::X,
            AestheticValue::standard_column("a"),
            MappingSource::Explicit,
        );
        assert_eq!(Geom::bar().stat(&mappings, &params), Some(Stat::Count));

        mappings.insert(
            Aesthetic::Y,
            AestheticValue::standard_column("b"),
            MappingSource::Explicit,
        );
        assert_eq!(Geom::bar().stat(&mappings, &params), None);
    }

    #[test]
    fn test_histogram_bins_setting() {
        let mappings = Mappings::new();
        let mut params = BTreeMap::new();
        assert_eq!(
            Geom::histogram().stat(&mappings, &params),
            Some(Stat::Bin {
                bins: Stat::DEFAULT_BINS
            })
        );

        params.insert("bins".to_string(), ParameterValue::Number(12.0));
        assert_eq!(
            Geom::histogram().stat(&mappings, &params),
            Some(Stat::Bin { bins: 12 })
        );
    }

    #[test]
    fn test_param_kinds() {
        assert!(ParamKind::PositiveInteger.accepts(&ParameterValue::Number(3.0)));
        assert!(!ParamKind::PositiveInteger.accepts(&ParameterValue::Number(0.0)));
        assert!(!ParamKind::PositiveInteger.accepts(&ParameterValue::Number(2.5)));
        assert!(ParamKind::Text.accepts(&ParameterValue::String("step".into())));
    }
}

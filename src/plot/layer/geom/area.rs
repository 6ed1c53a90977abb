//! Area geom implementation

use super::{DefaultParam, GeomAesthetics, GeomTrait, GeomType, ParamKind};
use crate::plot::Aesthetic;

/// Area geom - filled area under a line
#[derive(Debug, Clone, Copy)]
pub struct Area;

impl GeomTrait for Area {
    fn geom_type(&self) -> GeomType {
        GeomType::Area
    }

    fn aesthetics(&self) -> GeomAesthetics {
        GeomAesthetics {
            supported: &[
                Aesthetic::X,
                Aesthetic::Y,
                Aesthetic::Color,
                Aesthetic::Fill,
                Aesthetic::Stroke,
                Aesthetic::Opacity,
            ],
            required: &[Aesthetic::X, Aesthetic::Y],
        }
    }

    fn default_params(&self) -> &'static [DefaultParam] {
        &[DefaultParam {
            name: "interpolate",
            kind: ParamKind::Text,
        }]
    }
}

impl std::fmt::Display for Area {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "area")
    }
}

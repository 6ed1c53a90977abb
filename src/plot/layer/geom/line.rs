//! Line geom implementation

use super::{DefaultParam, GeomAesthetics, GeomTrait, GeomType, ParamKind};
use crate::plot::Aesthetic;

/// Line geom - line charts with connected points
#[derive(Debug, Clone, Copy)]
pub struct Line;

impl GeomTrait for Line {
    fn geom_type(&self) -> GeomType {
        GeomType::Line
    }

    fn aesthetics(&self) -> GeomAesthetics {
        GeomAesthetics {
            supported: &[
                Aesthetic::X,
                Aesthetic::Y,
                Aesthetic::Color,
                Aesthetic::Stroke,
                Aesthetic::Linewidth,
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

impl std::fmt::Display for Line {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line")
    }
}

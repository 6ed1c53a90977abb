//! Polygon geom implementation

use super::{GeomAesthetics, GeomTrait, GeomType};
use crate::plot::Aesthetic;

/// Polygon geom - filled shapes closed back to their first vertex
#[derive(Debug, Clone, Copy)]
pub struct Polygon;

impl GeomTrait for Polygon {
    fn geom_type(&self) -> GeomType {
        GeomType::Polygon
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
}

impl std::fmt::Display for Polygon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "polygon")
    }
}

//! Segment geom implementation

use super::{GeomAesthetics, GeomTrait, GeomType};
use crate::plot::Aesthetic;

/// Segment geom - line segments between two points
#[derive(Debug, Clone, Copy)]
pub struct Segment;

impl GeomTrait for Segment {
    fn geom_type(&self) -> GeomType {
        GeomType::Segment
    }

    fn aesthetics(&self) -> GeomAesthetics {
        GeomAesthetics {
            supported: &[
                Aesthetic::X,
                Aesthetic::Y,
                Aesthetic::Xend,
                Aesthetic::Yend,
                Aesthetic::Color,
                Aesthetic::Stroke,
                Aesthetic::Linewidth,
                Aesthetic::Opacity,
            ],
            required: &[Aesthetic::X, Aesthetic::Y, Aesthetic::Xend, Aesthetic::Yend],
        }
    }
}

impl std::fmt::Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "segment")
    }
}

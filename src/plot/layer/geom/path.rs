//! Path geom implementation

use super::{GeomAesthetics, GeomTrait, GeomType};
use crate::plot::Aesthetic;

/// Path geom - connected line segments in data order
#[derive(Debug, Clone, Copy)]
pub struct Path;

impl GeomTrait for Path {
    fn geom_type(&self) -> GeomType {
        GeomType::Path
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
}

impl std::fmt::Display for Path {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "path")
    }
}

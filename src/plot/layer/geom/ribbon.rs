//! Ribbon geom implementation

use super::{GeomAesthetics, GeomTrait, GeomType};
use crate::plot::Aesthetic;

/// Ribbon geom - confidence bands and ranges
#[derive(Debug, Clone, Copy)]
pub struct Ribbon;

impl GeomTrait for Ribbon {
    fn geom_type(&self) -> GeomType {
        GeomType::Ribbon
    }

    fn aesthetics(&self) -> GeomAesthetics {
        GeomAesthetics {
            supported: &[
                Aesthetic::X,
                Aesthetic::Ymin,
                Aesthetic::Ymax,
                Aesthetic::Color,
                Aesthetic::Fill,
                Aesthetic::Opacity,
            ],
            required: &[Aesthetic::X, Aesthetic::Ymin, Aesthetic::Ymax],
        }
    }
}

impl std::fmt::Display for Ribbon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ribbon")
    }
}

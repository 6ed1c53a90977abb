//! ErrorBar geom implementation

use super::{GeomAesthetics, GeomTrait, GeomType};
use crate::plot::Aesthetic;

/// ErrorBar geom - vertical intervals from ymin to ymax
#[derive(Debug, Clone, Copy)]
pub struct ErrorBar;

impl GeomTrait for ErrorBar {
    fn geom_type(&self) -> GeomType {
        GeomType::ErrorBar
    }

    fn aesthetics(&self) -> GeomAesthetics {
        GeomAesthetics {
            supported: &[
                Aesthetic::X,
                Aesthetic::Y,
                Aesthetic::Ymin,
                Aesthetic::Ymax,
                Aesthetic::Color,
                Aesthetic::Stroke,
                Aesthetic::Linewidth,
                Aesthetic::Opacity,
            ],
            required: &[Aesthetic::X, Aesthetic::Ymin, Aesthetic::Ymax],
        }
    }
}

impl std::fmt::Display for ErrorBar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "errorbar")
    }
}

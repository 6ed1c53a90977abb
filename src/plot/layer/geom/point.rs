//! Point geom implementation

use super::{GeomAesthetics, GeomTrait, GeomType};
use crate::plot::Aesthetic;

/// Point geom - scatter plots and similar
#[derive(Debug, Clone, Copy)]
pub struct Point;

impl GeomTrait for Point {
    fn geom_type(&self) -> GeomType {
        GeomType::Point
    }

    fn aesthetics(&self) -> GeomAesthetics {
        GeomAesthetics {
            supported: &[
                Aesthetic::X,
                Aesthetic::Y,
                Aesthetic::Color,
                Aesthetic::Fill,
                Aesthetic::Stroke,
                Aesthetic::Size,
                Aesthetic::Shape,
                Aesthetic::Opacity,
            ],
            required: &[Aesthetic::X, Aesthetic::Y],
        }
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "point")
    }
}

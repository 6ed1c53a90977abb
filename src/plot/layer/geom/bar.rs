//! Bar geom implementation

use super::{GeomAesthetics, GeomTrait, GeomType};
use crate::plot::{Aesthetic, Mappings, ParameterValue, Stat};
use std::collections::BTreeMap;

/// Bar geom - bar charts; counts rows per x when y is not mapped
#[derive(Debug, Clone, Copy)]
pub struct Bar;

impl GeomTrait for Bar {
    fn geom_type(&self) -> GeomType {
        GeomType::Bar
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
            required: &[Aesthetic::X],
        }
    }

    fn stat(
        &self,
        mappings: &Mappings,
        _parameters: &BTreeMap<String, ParameterValue>,
    ) -> Option<Stat> {
        if mappings.contains(Aesthetic::Y) {
            None
        } else {
            Some(Stat::Count)
        }
    }
}

impl std::fmt::Display for Bar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "bar")
    }
}

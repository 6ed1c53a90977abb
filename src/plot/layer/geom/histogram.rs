//! Histogram geom implementation

use super::{DefaultParam, GeomAesthetics, GeomTrait, GeomType, ParamKind};
use crate::plot::{Aesthetic, Mappings, ParameterValue, Stat};
use std::collections::BTreeMap;

/// Histogram geom - bins x and counts rows per bin
#[derive(Debug, Clone, Copy)]
pub struct Histogram;

impl GeomTrait for Histogram {
    fn geom_type(&self) -> GeomType {
        GeomType::Histogram
    }

    fn aesthetics(&self) -> GeomAesthetics {
        GeomAesthetics {
            supported: &[
                Aesthetic::X,
                Aesthetic::Color,
                Aesthetic::Fill,
                Aesthetic::Stroke,
                Aesthetic::Opacity,
            ],
            required: &[Aesthetic::X],
        }
    }

    fn default_params(&self) -> &'static [DefaultParam] {
        &[DefaultParam {
            name: "bins",
            kind: ParamKind::PositiveInteger,
        }]
    }

    fn stat(
        &self,
        _mappings: &Mappings,
        parameters: &BTreeMap<String, ParameterValue>,
    ) -> Option<Stat> {
        let bins = parameters
            .get("bins")
            .and_then(|v| v.as_number())
            .filter(|n| *n >= 1.0)
            .map(|n| n as usize)
            .unwrap_or(Stat::DEFAULT_BINS);
        Some(Stat::Bin { bins })
    }
}

impl std::fmt::Display for Histogram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "histogram")
    }
}

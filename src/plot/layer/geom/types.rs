//! Core types for the geom trait system
//!
//! These types are used by all geom implementations and are shared across the module.

use crate::plot::{Aesthetic, ParameterValue};

/// Aesthetics a geom accepts and requires
#[derive(Debug, Clone, Copy)]
pub struct GeomAesthetics {
    /// Every aesthetic that may be mapped, required ones included
    pub supported: &'static [Aesthetic],
    /// Aesthetics that must be mapped before the layer can render
    pub required: &'static [Aesthetic],
}

impl GeomAesthetics {
    pub fn is_supported(&self, aesthetic: Aesthetic) -> bool {
        self.supported.contains(&aesthetic)
    }

    pub fn is_required(&self, aesthetic: Aesthetic) -> bool {
        self.required.contains(&aesthetic)
    }
}

/// Accepted shape of a layer parameter value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Whole number >= 1
    PositiveInteger,
    /// Any string
    Text,
}

impl ParamKind {
    pub fn accepts(&self, value: &ParameterValue) -> bool {
        match self {
            ParamKind::PositiveInteger => value
                .as_number()
                .map(|n| n >= 1.0 && n.fract() == 0.0)
                .unwrap_or(false),
            ParamKind::Text => value.as_str().is_some(),
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            ParamKind::PositiveInteger => "a positive whole number",
            ParamKind::Text => "a string",
        }
    }
}

/// Layer parameter definition: name and accepted value shape
#[derive(Debug, Clone, Copy)]
pub struct DefaultParam {
    pub name: &'static str,
    pub kind: ParamKind,
}

//! Layer type: one DRAW clause

pub mod geom;
mod stat;

pub use geom::{DefaultParam, Geom, GeomAesthetics, GeomTrait, GeomType, ParamKind};
pub use stat::Stat;

use crate::plot::types::{MappingItem, Mappings, ParameterValue};
use serde::Serialize;
use std::collections::BTreeMap;

/// A single visualization layer (from DRAW clause)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layer {
    /// Mark kind
    pub geom: Geom,
    /// The layer's MAPPING list as written (empty when there is none)
    pub mapping: Vec<MappingItem>,
    /// True when the layer has no MAPPING and takes the top-level list
    pub inherits_global: bool,
    /// SETTING key => literal pairs
    pub parameters: BTreeMap<String, ParameterValue>,
    /// Raw SQL predicate from FILTER
    pub filter: Option<String>,
    /// Stat transform, decided during validation
    pub stat: Option<Stat>,
    /// Resolved aesthetic mappings, filled in by the validator
    pub aesthetics: Mappings,
    /// Byte offset of the DRAW keyword in the visual text
    #[serde(skip)]
    pub offset: usize,
}

impl Layer {
    pub fn new(geom: Geom) -> Self {
        Self {
            geom,
            mapping: Vec::new(),
            inherits_global: true,
            parameters: BTreeMap::new(),
            filter: None,
            stat: None,
            aesthetics: Mappings::new(),
            offset: 0,
        }
    }

    pub fn with_mapping(mut self, mapping: Vec<MappingItem>) -> Self {
        self.mapping = mapping;
        self.inherits_global = false;
        self
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: ParameterValue) -> Self {
        self.parameters.insert(name.into(), value);
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// True when the layer needs SQL of its own beyond the base query
    pub fn needs_query(&self) -> bool {
        self.filter.is_some() || self.stat.is_some()
    }
}

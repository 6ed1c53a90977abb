//! Plot types for ggsql visualization specifications
//!
//! This module contains all the types that represent a parsed ggsql visualization
//! specification: the [`Plot`] AST, layers and their marks, aesthetics, facets
//! and labels.
//!
//! - `main` - Plot struct and Labels types
//! - `types` - Value types: MappingItem, Mappings, AestheticValue, ParameterValue
//! - `aesthetic` - The closed Aesthetic enum
//! - `layer` - Layer struct, Geom subsystem and Stat
//! - `facet` - Facet types for small multiples
//! - `projection` - PROJECT clause coordinate systems

pub mod aesthetic;
pub mod facet;
pub mod layer;
pub mod main;
pub mod projection;
pub mod types;

pub use aesthetic::*;
pub use facet::*;
pub use layer::*;
pub use main::*;
pub use projection::*;
pub use types::*;

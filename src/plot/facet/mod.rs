//! Facet types for ggsql visualization specifications
//!
//! This module defines faceting configuration for small multiples.

mod types;

pub use types::Facet;

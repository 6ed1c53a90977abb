//! Output writer abstraction layer for ggsql
//!
//! The writer module provides a pluggable interface for turning a
//! [`Prepared`] query result into a chart specification.
//!
//! # Architecture
//!
//! All writers implement the `Writer` trait, which provides:
//! - Prepared → typed chart conversion ([`Writer::render_chart`])
//! - Prepared → JSON text ([`Writer::render_json`])
//!
//! # Example
//!
//! ```rust,ignore
//! use ggsql_core::writer::{Writer, VegaLiteWriter};
//!
//! let writer = VegaLiteWriter::new();
//! let json = writer.render_json(&prepared)?;
//! println!("{}", json);
//! ```

use crate::reader::Prepared;
use crate::{GgsqlError, Result};
use serde::Serialize;

#[cfg(feature = "vegalite")]
pub mod vegalite;

#[cfg(feature = "vegalite")]
pub use vegalite::VegaLiteWriter;

/// Trait for visualization output writers
///
/// Writers take the data and resolved plot held by a [`Prepared`] and
/// produce a serialisable chart.
pub trait Writer {
    /// Chart document produced by this writer
    type Chart: Serialize;

    /// Build the chart for a prepared query
    ///
    /// # Errors
    ///
    /// Returns `GgsqlError::WriterError` if:
    /// - A layer has no resolved aesthetic mappings
    /// - A layer's dataset is missing from the prepared data
    /// - A mapped column does not exist in the layer's dataset
    fn render_chart(&self, prepared: &Prepared) -> Result<Self::Chart>;

    /// Render the chart as pretty-printed JSON
    ///
    /// Always the serialisation of [`render_chart`](Writer::render_chart).
    fn render_json(&self, prepared: &Prepared) -> Result<String> {
        let chart = self.render_chart(prepared)?;
        serde_json::to_string_pretty(&chart)
            .map_err(|e| GgsqlError::WriterError(format!("Failed to serialize chart JSON: {}", e)))
    }
}

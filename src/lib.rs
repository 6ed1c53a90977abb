/*!
# ggsql-core

Compiler core for a SQL dialect with a `VISUALISE` clause.

A ggsql query is an ordinary SQL statement followed by a visualisation
specification. The crate splits the two, parses the visualisation into a
typed [`Plot`], validates it against the columns the SQL produces, runs the
SQL through a [`reader::Reader`] and renders the result with a
[`writer::Writer`].

```rust,ignore
use ggsql_core::reader::{DuckDBReader, Reader};
use ggsql_core::writer::{VegaLiteWriter, Writer};

let mut reader = DuckDBReader::from_connection_string("duckdb://memory")?;
let prepared = reader.execute(
    "SELECT 1 AS x, 2 AS y VISUALISE x, y DRAW point",
    None,
)?;
let json = VegaLiteWriter::new().render_json(&prepared)?;
```

## Pipeline

1. [`parser::split_query`] separates the SQL from the `VISUALISE` text.
2. [`parser::parse_visual`] builds the [`Plot`] AST.
3. [`validate::validate`] resolves mappings and reports errors and warnings.
4. [`execute::execute_query`] registers caller tables, runs the SQL, the
   per-layer filters and stats, and returns a [`reader::Prepared`].
5. A writer turns the [`reader::Prepared`] into a chart.
*/

pub mod execute;
pub mod naming;
pub mod parser;
pub mod plot;
pub mod reader;
pub mod validate;
pub mod writer;

pub use plot::{
    Aesthetic, AestheticValue, Facet, Geom, Label, LabelKey, Labels, Layer, MappingItem,
    Mappings, ParameterValue, Plot, Stat,
};
pub use reader::{Metadata, Prepared};
pub use validate::{validate, Location, Validated, ValidationError, ValidationWarning};

// Re-export polars so callers can build DataFrames for registration
pub use polars::prelude::DataFrame;

/// Main library error type
#[derive(thiserror::Error, Debug)]
pub enum GgsqlError {
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Data source error: {0}")]
    ReaderError(String),

    #[error("Output generation error: {0}")]
    WriterError(String),

    #[error("No visualization: {0}")]
    NoVisualiseError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

pub type Result<T> = std::result::Result<T, GgsqlError>;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

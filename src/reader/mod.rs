//! Readers: where a query's SQL runs
//!
//! A reader owns a database connection, turns SQL into Polars DataFrames and
//! drives the whole ggsql pipeline through [`Reader::execute`], which returns
//! a [`Prepared`] ready for a writer.
//!
//! Caller DataFrames can be exposed to the SQL as tables. Tables passed to
//! `execute` live only for that call; [`Reader::register`] makes one that
//! lives until [`Reader::unregister`].
//!
//! ```rust,ignore
//! use ggsql_core::reader::{DuckDBReader, Reader};
//!
//! let mut reader = DuckDBReader::from_connection_string("duckdb://memory")?;
//!
//! let mut data = HashMap::new();
//! data.insert("trips".to_string(), trips_df);
//! let prepared = reader.execute(
//!     "SELECT hour, COUNT(*) AS n FROM trips GROUP BY hour VISUALISE hour AS x, n AS y DRAW bar",
//!     Some(data),
//! )?;
//! assert!(reader.execute_sql("SELECT * FROM trips").is_err());
//! ```

use std::collections::HashMap;

use crate::execute::execute_query;
use crate::{DataFrame, GgsqlError, Result};

#[cfg(feature = "duckdb")]
pub mod duckdb;

pub mod connection;
mod prepared;

#[cfg(feature = "duckdb")]
pub use duckdb::DuckDBReader;
pub use prepared::{Metadata, Prepared};

// ============================================================================
// Reader Trait
// ============================================================================

/// A SQL backend that yields DataFrames
///
/// Only [`execute_sql`](Reader::execute_sql) is required. Backends that can
/// load a DataFrame into a table override the registration methods and
/// return true from [`supports_register`](Reader::supports_register).
pub trait Reader {
    /// Run one or more `;`-separated statements; the last one's result is
    /// returned, or an empty frame when it produces no rows.
    ///
    /// Failures of any kind surface as `GgsqlError::ReaderError`.
    fn execute_sql(&self, sql: &str) -> Result<DataFrame>;

    /// Expose `df` to SQL as table `name`, replacing any earlier table of
    /// that name
    fn register(&mut self, name: &str, _df: DataFrame) -> Result<()> {
        Err(GgsqlError::ReaderError(format!(
            "This reader does not support DataFrame registration for table '{}'",
            name
        )))
    }

    /// Remove a table created by [`register`](Reader::register)
    ///
    /// Unknown names are ignored.
    fn unregister(&mut self, _name: &str) -> Result<()> {
        Ok(())
    }

    /// Whether [`register`](Reader::register) is implemented
    fn supports_register(&self) -> bool {
        false
    }

    /// Execute a ggsql query and return the data ready for rendering.
    ///
    /// Tables in `data` are registered for the duration of this call only.
    ///
    /// # Errors
    ///
    /// - `NoVisualiseError` if the query has no VISUALISE clause
    /// - `ParseError` if the query syntax is invalid
    /// - `ValidationError` if the plot does not fit the query result
    /// - `ReaderError` if the SQL execution or registration fails
    fn execute(
        &mut self,
        query: &str,
        data: Option<HashMap<String, DataFrame>>,
    ) -> Result<Prepared> {
        execute_query(self, query, data)
    }
}

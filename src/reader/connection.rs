//! Connection string parsing for data sources
//!
//! Parses URI-style connection strings to determine which reader to build and
//! where it should point.

use crate::{GgsqlError, Result};

/// Parsed connection information
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionInfo {
    /// DuckDB in-memory database
    DuckDBMemory,
    /// DuckDB file-based database
    DuckDBFile(String),
}

/// Parse a connection string into connection information
///
/// # Supported Formats
///
/// - `duckdb://memory` - DuckDB in-memory database
/// - `duckdb:///absolute/path/file.db` - DuckDB file (absolute path)
/// - `duckdb://relative/file.db` - DuckDB file (relative path)
///
/// # Examples
///
/// ```
/// use ggsql_core::reader::connection::{parse_connection_string, ConnectionInfo};
///
/// let info = parse_connection_string("duckdb://memory").unwrap();
/// assert_eq!(info, ConnectionInfo::DuckDBMemory);
///
/// let info = parse_connection_string("duckdb://data.db").unwrap();
/// assert_eq!(info, ConnectionInfo::DuckDBFile("data.db".to_string()));
/// ```
pub fn parse_connection_string(uri: &str) -> Result<ConnectionInfo> {
    let uri = uri.trim();
    if uri == "duckdb://memory" || uri == "duckdb://:memory:" {
        return Ok(ConnectionInfo::DuckDBMemory);
    }

    if let Some(path) = uri.strip_prefix("duckdb://") {
        if path.is_empty() || path.trim_start_matches('/').is_empty() {
            return Err(GgsqlError::ReaderError(
                "DuckDB file path cannot be empty".to_string(),
            ));
        }
        // A third slash marks an absolute path
        let path = if path.starts_with('/') {
            format!("/{}", path.trim_start_matches('/'))
        } else {
            path.to_string()
        };
        return Ok(ConnectionInfo::DuckDBFile(path));
    }

    Err(GgsqlError::ReaderError(format!(
        "Unsupported connection string format: {}. Supported: duckdb://memory, duckdb://<path>",
        uri
    )))
}

//! DuckDB data source implementation
//!
//! Provides a reader for DuckDB databases with direct Polars DataFrame integration.
//! Results come back through DuckDB's Arrow interface and registered frames go
//! in through the `arrow` table function, so neither direction is row by row.

use std::collections::HashSet;
use std::sync::Arc;

use crate::naming::quote_ident;
use crate::parser::split_statements;
use crate::reader::{connection::ConnectionInfo, Reader};
use crate::{DataFrame, GgsqlError, Result};
use arrow::array::{
    Array, ArrayRef, AsArray, BooleanArray, Date32Array, Float64Array, Int64Array, StringArray,
    Time64MicrosecondArray, TimestampMicrosecondArray, UInt64Array,
};
use arrow::datatypes::{
    ArrowPrimitiveType, DataType as ArrowType, Date32Type, Date64Type, Decimal128Type, Field as ArrowField,
    Float32Type, Float64Type, Int16Type, Int32Type, Int64Type, Int8Type, Schema as ArrowSchema,
    Time32MillisecondType, Time32SecondType, Time64MicrosecondType, Time64NanosecondType,
    TimeUnit as ArrowUnit, TimestampMicrosecondType, TimestampMillisecondType,
    TimestampNanosecondType, TimestampSecondType, UInt16Type, UInt32Type, UInt64Type, UInt8Type,
};
use arrow::record_batch::RecordBatch;
use arrow::util::display::{ArrayFormatter, FormatOptions};
use duckdb::vtab::arrow::ArrowVTab;
use duckdb::vtab::arrow_recordbatch_to_query_params;
use duckdb::{params, Connection};
use polars::prelude::*;
use tracing::{debug, info, warn};

/// DuckDB database reader
///
/// Executes SQL queries against DuckDB databases (in-memory or file-based)
/// and returns results as Polars DataFrames. Registered DataFrames become
/// temporary tables that live until [`Reader::unregister`] or until the
/// reader is dropped.
///
/// # Examples
///
/// ```rust,ignore
/// use ggsql_core::reader::{Reader, DuckDBReader};
///
/// // In-memory database
/// let reader = DuckDBReader::from_connection_string("duckdb://memory")?;
/// let df = reader.execute_sql("SELECT 1 as x, 2 as y")?;
///
/// // File-based database
/// let reader = DuckDBReader::from_connection_string("duckdb://data.db")?;
/// let df = reader.execute_sql("SELECT * FROM sales")?;
/// ```
pub struct DuckDBReader {
    conn: Connection,
    registered: HashSet<String>,
}

impl std::fmt::Debug for DuckDBReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuckDBReader")
            .field("registered", &self.registered)
            .finish_non_exhaustive()
    }
}

impl DuckDBReader {
    /// Create a new DuckDB reader from a connection string
    ///
    /// # Arguments
    ///
    /// * `uri` - Connection string (e.g., "duckdb://memory" or "duckdb://file.db")
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The connection string format is invalid
    /// - The database file cannot be opened
    /// - DuckDB initialization fails
    pub fn from_connection_string(uri: &str) -> Result<Self> {
        let conn_info = super::connection::parse_connection_string(uri)?;

        let conn = match conn_info {
            ConnectionInfo::DuckDBMemory => Connection::open_in_memory().map_err(|e| {
                GgsqlError::ReaderError(format!("Failed to open in-memory DuckDB: {}", e))
            })?,
            ConnectionInfo::DuckDBFile(path) => Connection::open(&path).map_err(|e| {
                GgsqlError::ReaderError(format!("Failed to open DuckDB file '{}': {}", path, e))
            })?,
        };
        debug!(uri, "Opened DuckDB connection");

        Self::from_connection(conn)
    }

    /// Wrap an existing DuckDB connection
    ///
    /// Installs the `arrow` table function used by [`Reader::register`].
    pub fn from_connection(conn: Connection) -> Result<Self> {
        conn.register_table_function::<ArrowVTab>("arrow")
            .map_err(|e| {
                GgsqlError::ReaderError(format!("Failed to install arrow table function: {}", e))
            })?;
        Ok(Self {
            conn,
            registered: HashSet::new(),
        })
    }

    /// Get a reference to the underlying DuckDB connection
    ///
    /// Useful for executing setup queries (CREATE TABLE, INSERT, etc.)
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Names currently registered through [`Reader::register`]
    pub fn registered_tables(&self) -> impl Iterator<Item = &str> {
        self.registered.iter().map(|s| s.as_str())
    }

    fn query_frame(&self, sql: &str) -> Result<DataFrame> {
        if returns_no_rows(sql) {
            self.conn
                .execute_batch(sql)
                .map_err(|e| GgsqlError::ReaderError(format!("Failed to execute DDL: {}", e)))?;
            return Ok(DataFrame::empty());
        }

        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|e| GgsqlError::ReaderError(format!("Failed to prepare SQL: {}", e)))?;

        // One execution; the schema comes from the result itself
        let result = stmt
            .query_arrow(params![])
            .map_err(|e| GgsqlError::ReaderError(format!("Failed to execute SQL: {}", e)))?;
        let schema = result.get_schema();
        let batches: Vec<RecordBatch> = result.collect();

        if schema.fields().is_empty() {
            return Ok(DataFrame::empty());
        }

        let batch = arrow::compute::concat_batches(&schema, &batches)
            .map_err(|e| GgsqlError::ReaderError(format!("Failed to collect result: {}", e)))?;

        let columns = schema
            .fields()
            .iter()
            .zip(batch.columns())
            .map(|(field, array)| arrow_to_series(field.name(), array).map(Column::from))
            .collect::<Result<Vec<_>>>()?;

        let df = DataFrame::new(columns)
            .map_err(|e| GgsqlError::ReaderError(format!("Failed to create DataFrame: {}", e)))?;
        debug!(
            rows = df.height(),
            columns = df.width(),
            batches = batches.len(),
            "Collected query result"
        );
        Ok(df)
    }
}

/// Statements that never produce a result set
fn returns_no_rows(sql: &str) -> bool {
    const KEYWORDS: &[&str] = &[
        "CREATE", "DROP", "INSERT", "UPDATE", "DELETE", "ALTER", "ATTACH", "DETACH", "USE",
        "SET", "INSTALL", "LOAD", "BEGIN", "COMMIT", "ROLLBACK",
    ];
    let first = sql
        .trim_start()
        .split(|c: char| c.is_whitespace() || c == '(')
        .next()
        .unwrap_or_default();
    KEYWORDS.iter().any(|k| first.eq_ignore_ascii_case(k))
}

// ============================================================================
// Arrow -> Polars
// ============================================================================

fn primitive<T: ArrowPrimitiveType>(array: &dyn Array) -> Vec<Option<T::Native>> {
    array.as_primitive::<T>().iter().collect()
}

fn scaled(values: Vec<Option<i64>>, factor: i64) -> Vec<Option<i64>> {
    values
        .into_iter()
        .map(|v| v.and_then(|v| v.checked_mul(factor)))
        .collect()
}

fn widen(values: Vec<Option<i32>>) -> Vec<Option<i64>> {
    values.into_iter().map(|v| v.map(i64::from)).collect()
}

fn temporal(values: Vec<Option<i64>>, name: &str, dtype: &DataType) -> Result<Series> {
    Series::new(name.into(), values)
        .cast(dtype)
        .map_err(|e| GgsqlError::ReaderError(format!("Column '{}': {}", name, e)))
}

/// Convert one result column
///
/// Types Polars has no natural home for (ENUM, INTERVAL, nested values) are
/// rendered as text. A column that cannot be rendered is an error.
fn arrow_to_series(name: &str, array: &ArrayRef) -> Result<Series> {
    let pl_name: PlSmallStr = name.into();
    let series = match array.data_type() {
        ArrowType::Null => Series::full_null(pl_name, array.len(), &DataType::Null),
        ArrowType::Boolean => {
            let values: Vec<Option<bool>> = array.as_boolean().iter().collect();
            Series::new(pl_name, values)
        }
        ArrowType::Int8 => Series::new(pl_name, primitive::<Int8Type>(array)),
        ArrowType::Int16 => Series::new(pl_name, primitive::<Int16Type>(array)),
        ArrowType::Int32 => Series::new(pl_name, primitive::<Int32Type>(array)),
        ArrowType::Int64 => Series::new(pl_name, primitive::<Int64Type>(array)),
        ArrowType::UInt8 => Series::new(pl_name, primitive::<UInt8Type>(array)),
        ArrowType::UInt16 => Series::new(pl_name, primitive::<UInt16Type>(array)),
        ArrowType::UInt32 => Series::new(pl_name, primitive::<UInt32Type>(array)),
        ArrowType::UInt64 => {
            let values = primitive::<UInt64Type>(array);
            if values.iter().flatten().all(|v| i64::try_from(*v).is_ok()) {
                let values: Vec<Option<i64>> =
                    values.into_iter().map(|v| v.map(|v| v as i64)).collect();
                Series::new(pl_name, values)
            } else {
                warn!(column = name, "UBIGINT values overflow i64, converting to string");
                return text_series(name, array);
            }
        }
        ArrowType::Float32 => Series::new(pl_name, primitive::<Float32Type>(array)),
        ArrowType::Float64 => Series::new(pl_name, primitive::<Float64Type>(array)),
        ArrowType::Utf8 => {
            let values: Vec<Option<&str>> = array.as_string::<i32>().iter().collect();
            Series::new(pl_name, values)
        }
        ArrowType::LargeUtf8 => {
            let values: Vec<Option<&str>> = array.as_string::<i64>().iter().collect();
            Series::new(pl_name, values)
        }
        ArrowType::Utf8View => {
            let values: Vec<Option<&str>> = array.as_string_view().iter().collect();
            Series::new(pl_name, values)
        }
        ArrowType::Date32 => Series::new(pl_name, primitive::<Date32Type>(array))
            .cast(&DataType::Date)
            .map_err(|e| GgsqlError::ReaderError(format!("Column '{}': {}", name, e)))?,
        ArrowType::Date64 => temporal(
            scaled(primitive::<Date64Type>(array), 1_000),
            name,
            &DataType::Datetime(TimeUnit::Microseconds, None),
        )?,
        ArrowType::Timestamp(unit, _) => {
            let micros = match unit {
                ArrowUnit::Second => scaled(primitive::<TimestampSecondType>(array), 1_000_000),
                ArrowUnit::Millisecond => scaled(primitive::<TimestampMillisecondType>(array), 1_000),
                ArrowUnit::Microsecond => primitive::<TimestampMicrosecondType>(array),
                ArrowUnit::Nanosecond => primitive::<TimestampNanosecondType>(array)
                    .into_iter()
                    .map(|v| v.map(|v| v.div_euclid(1_000)))
                    .collect(),
            };
            temporal(micros, name, &DataType::Datetime(TimeUnit::Microseconds, None))?
        }
        ArrowType::Time32(unit) => {
            let nanos = match unit {
                ArrowUnit::Second => scaled(widen(primitive::<Time32SecondType>(array)), 1_000_000_000),
                _ => scaled(widen(primitive::<Time32MillisecondType>(array)), 1_000_000),
            };
            temporal(nanos, name, &DataType::Time)?
        }
        ArrowType::Time64(unit) => {
            let nanos = match unit {
                ArrowUnit::Nanosecond => primitive::<Time64NanosecondType>(array),
                _ => scaled(primitive::<Time64MicrosecondType>(array), 1_000),
            };
            temporal(nanos, name, &DataType::Time)?
        }
        ArrowType::Decimal128(_, scale) => {
            let raw = primitive::<Decimal128Type>(array);
            if *scale == 0 && raw.iter().flatten().all(|v| i64::try_from(*v).is_ok()) {
                let values: Vec<Option<i64>> =
                    raw.into_iter().map(|v| v.map(|v| v as i64)).collect();
                Series::new(pl_name, values)
            } else {
                let divisor = 10f64.powi(i32::from(*scale));
                let values: Vec<Option<f64>> = raw
                    .into_iter()
                    .map(|v| v.map(|v| v as f64 / divisor))
                    .collect();
                Series::new(pl_name, values)
            }
        }
        ArrowType::Dictionary(_, _) => {
            let decoded = arrow::compute::cast(array, &ArrowType::Utf8).map_err(|e| {
                GgsqlError::ReaderError(format!("Column '{}': cannot decode values: {}", name, e))
            })?;
            return arrow_to_series(name, &decoded);
        }
        other => {
            debug!(column = name, dtype = %other, "Rendering column as text");
            return text_series(name, array);
        }
    };
    Ok(series)
}

/// Render every value of `array` with Arrow's display rules
fn text_series(name: &str, array: &ArrayRef) -> Result<Series> {
    let options = FormatOptions::default();
    let formatter = ArrayFormatter::try_new(array.as_ref(), &options).map_err(|e| {
        GgsqlError::ReaderError(format!(
            "Column '{}' has unsupported type {}: {}",
            name,
            array.data_type(),
            e
        ))
    })?;
    let values: Vec<Option<String>> = (0..array.len())
        .map(|i| (!array.is_null(i)).then(|| formatter.value(i).to_string()))
        .collect();
    Ok(Series::new(name.into(), values))
}

// ============================================================================
// Polars -> Arrow
// ============================================================================

/// Convert one DataFrame column for the `arrow` table function
fn series_to_arrow(series: &Series) -> Result<(ArrowField, ArrayRef)> {
    let name = series.name().to_string();
    let convert_err =
        |e: PolarsError| GgsqlError::ReaderError(format!("Failed to convert column '{}': {}", name, e));

    let array: ArrayRef = match series.dtype() {
        DataType::Boolean => {
            let values: Vec<Option<bool>> = series.bool().map_err(convert_err)?.into_iter().collect();
            Arc::new(BooleanArray::from(values))
        }
        dt if dt.is_signed_integer() => {
            let cast = series.cast(&DataType::Int64).map_err(convert_err)?;
            let values: Vec<Option<i64>> = cast.i64().map_err(convert_err)?.into_iter().collect();
            Arc::new(Int64Array::from(values))
        }
        dt if dt.is_unsigned_integer() => {
            let cast = series.cast(&DataType::UInt64).map_err(convert_err)?;
            let values: Vec<Option<u64>> = cast.u64().map_err(convert_err)?.into_iter().collect();
            Arc::new(UInt64Array::from(values))
        }
        dt if dt.is_float() => {
            let cast = series.cast(&DataType::Float64).map_err(convert_err)?;
            let values: Vec<Option<f64>> = cast.f64().map_err(convert_err)?.into_iter().collect();
            Arc::new(Float64Array::from(values))
        }
        DataType::String => {
            let values: Vec<Option<&str>> = series.str().map_err(convert_err)?.into_iter().collect();
            Arc::new(StringArray::from(values))
        }
        DataType::Date => {
            let cast = series.cast(&DataType::Int32).map_err(convert_err)?;
            let values: Vec<Option<i32>> = cast.i32().map_err(convert_err)?.into_iter().collect();
            Arc::new(Date32Array::from(values))
        }
        DataType::Datetime(unit, _) => {
            let unit = *unit;
            let cast = series.cast(&DataType::Int64).map_err(convert_err)?;
            let values: Vec<Option<i64>> = cast
                .i64()
                .map_err(convert_err)?
                .into_iter()
                .map(|v| {
                    v.and_then(|v| match unit {
                        TimeUnit::Nanoseconds => Some(v.div_euclid(1_000)),
                        TimeUnit::Microseconds => Some(v),
                        TimeUnit::Milliseconds => v.checked_mul(1_000),
                    })
                })
                .collect();
            Arc::new(TimestampMicrosecondArray::from(values))
        }
        DataType::Time => {
            let cast = series.cast(&DataType::Int64).map_err(convert_err)?;
            let values: Vec<Option<i64>> = cast
                .i64()
                .map_err(convert_err)?
                .into_iter()
                .map(|v| v.map(|nanos| nanos / 1_000))
                .collect();
            Arc::new(Time64MicrosecondArray::from(values))
        }
        other => {
            warn!(
                column = %name,
                dtype = %other,
                "Registering column of unsupported type as text"
            );
            let cast = series.cast(&DataType::String).map_err(convert_err)?;
            let values: Vec<Option<&str>> = cast.str().map_err(convert_err)?.into_iter().collect();
            Arc::new(StringArray::from(values))
        }
    };

    let field = ArrowField::new(name, array.data_type().clone(), true);
    Ok((field, array))
}

fn frame_to_batch(df: &DataFrame) -> Result<RecordBatch> {
    let (fields, arrays): (Vec<ArrowField>, Vec<ArrayRef>) = df
        .get_columns()
        .iter()
        .map(|c| series_to_arrow(c.as_materialized_series()))
        .collect::<Result<Vec<_>>>()?
        .into_iter()
        .unzip();
    RecordBatch::try_new(Arc::new(ArrowSchema::new(fields)), arrays)
        .map_err(|e| GgsqlError::ReaderError(format!("Failed to build record batch: {}", e)))
}

// ============================================================================
// Reader
// ============================================================================

impl Reader for DuckDBReader {
    /// Runs every statement in `sql`; the last one produces the result.
    fn execute_sql(&self, sql: &str) -> Result<DataFrame> {
        let statements = split_statements(sql);
        let Some((last, setup)) = statements.split_last() else {
            return Err(GgsqlError::ReaderError(
                "No SQL statements to execute".to_string(),
            ));
        };

        for stmt in setup {
            debug!(sql = %stmt, "Executing setup statement");
            self.conn
                .execute_batch(stmt)
                .map_err(|e| GgsqlError::ReaderError(format!("Failed to execute SQL: {}", e)))?;
        }

        info!(sql = %last, "Executing query");
        self.query_frame(last)
    }

    fn register(&mut self, name: &str, df: DataFrame) -> Result<()> {
        if df.width() == 0 {
            return Err(GgsqlError::ReaderError(format!(
                "Cannot register table '{}' without columns",
                name
            )));
        }

        let rows = df.height();
        let batch = frame_to_batch(&df)?;
        let sql = format!(
            "CREATE OR REPLACE TEMP TABLE {} AS SELECT * FROM arrow(?, ?)",
            quote_ident(name)
        );
        self.conn
            .execute(&sql, arrow_recordbatch_to_query_params(batch))
            .map_err(|e| {
                GgsqlError::ReaderError(format!("Failed to register table '{}': {}", name, e))
            })?;

        self.registered.insert(name.to_string());
        debug!(table = name, rows, "Registered DataFrame");
        Ok(())
    }

    fn unregister(&mut self, name: &str) -> Result<()> {
        if !self.registered.remove(name) {
            return Ok(());
        }
        self.conn
            .execute_batch(&format!("DROP TABLE IF EXISTS temp.{}", quote_ident(name)))
            .map_err(|e| {
                GgsqlError::ReaderError(format!("Failed to unregister table '{}': {}", name, e))
            })?;
        debug!(table = name, "Unregistered DataFrame");
        Ok(())
    }

    fn supports_register(&self) -> bool {
        true
    }
}

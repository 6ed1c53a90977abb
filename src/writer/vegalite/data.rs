//! DataFrame to JSON conversion for the Vega-Lite writer
//!
//! Columns are converted one at a time into JSON values, then zipped into
//! row objects. Temporal columns become ISO-8601 strings that Vega-Lite
//! parses without a format hint.

use crate::{naming, DataFrame, GgsqlError, Result};
use polars::prelude::*;
use serde_json::{json, Map, Value};
use std::collections::BTreeSet;
use tracing::warn;

fn cast_error(dtype: &str, e: PolarsError) -> GgsqlError {
    GgsqlError::WriterError(format!("Failed to cast to {}: {}", dtype, e))
}

/// Convert Polars DataFrame to Vega-Lite data values (array of objects)
pub(super) fn dataframe_to_values(df: &DataFrame) -> Result<Vec<Value>> {
    let mut columns: Vec<(String, Vec<Value>)> = Vec::with_capacity(df.width());
    for column in df.get_columns() {
        let series = column.as_materialized_series();
        columns.push((series.name().to_string(), column_values(series)?));
    }

    let mut rows = Vec::with_capacity(df.height());
    for row_idx in 0..df.height() {
        let mut row = Map::new();
        for (name, values) in &columns {
            let value = values.get(row_idx).cloned().unwrap_or(Value::Null);
            row.insert(name.clone(), value);
        }
        rows.push(Value::Object(row));
    }
    Ok(rows)
}

/// All values of a series as JSON, nulls preserved
pub(super) fn column_values(series: &Series) -> Result<Vec<Value>> {
    let dtype = series.dtype().clone();
    match dtype {
        DataType::Boolean => {
            let ca = series.bool().map_err(|e| cast_error("bool", e))?;
            Ok(ca.into_iter().map(|v| v.map(Value::Bool).unwrap_or(Value::Null)).collect())
        }
        DataType::String => {
            let ca = series.str().map_err(|e| cast_error("string", e))?;
            Ok(ca.into_iter().map(|v| v.map(|s| json!(s)).unwrap_or(Value::Null)).collect())
        }
        DataType::Date => {
            let days = series
                .cast(&DataType::Int32)
                .map_err(|e| cast_error("date", e))?;
            let ca = days.i32().map_err(|e| cast_error("date", e))?;
            Ok(ca
                .into_iter()
                .map(|v| v.and_then(format_date).map(Value::String).unwrap_or(Value::Null))
                .collect())
        }
        DataType::Datetime(unit, _) => {
            let raw = series
                .cast(&DataType::Int64)
                .map_err(|e| cast_error("datetime", e))?;
            let ca = raw.i64().map_err(|e| cast_error("datetime", e))?;
            Ok(ca
                .into_iter()
                .map(|v| {
                    v.and_then(|v| format_datetime(unit, v))
                        .map(Value::String)
                        .unwrap_or(Value::Null)
                })
                .collect())
        }
        DataType::Time => {
            let nanos = series
                .cast(&DataType::Int64)
                .map_err(|e| cast_error("time", e))?;
            let ca = nanos.i64().map_err(|e| cast_error("time", e))?;
            Ok(ca
                .into_iter()
                .map(|v| v.and_then(format_time).map(Value::String).unwrap_or(Value::Null))
                .collect())
        }
        dt if dt.is_integer() => {
            let ints = series
                .cast(&DataType::Int64)
                .map_err(|e| cast_error("i64", e))?;
            let ca = ints.i64().map_err(|e| cast_error("i64", e))?;
            Ok(ca.into_iter().map(|v| v.map(|v| json!(v)).unwrap_or(Value::Null)).collect())
        }
        dt if dt.is_float() => {
            let floats = series
                .cast(&DataType::Float64)
                .map_err(|e| cast_error("f64", e))?;
            let ca = floats.f64().map_err(|e| cast_error("f64", e))?;
            Ok(ca.into_iter().map(|v| v.map(|v| json!(v)).unwrap_or(Value::Null)).collect())
        }
        other => {
            warn!(column = %series.name(), dtype = %other, "Writing column as text");
            let text = series
                .cast(&DataType::String)
                .map_err(|e| cast_error("string", e))?;
            column_values(&text)
        }
    }
}

/// Days since the epoch as `YYYY-MM-DD`
fn format_date(days: i32) -> Option<String> {
    // 719_163 days from 0001-01-01 to 1970-01-01
    chrono::NaiveDate::from_num_days_from_ce_opt(days.checked_add(719_163)?)
        .map(|d| d.format("%Y-%m-%d").to_string())
}

/// Epoch timestamp as UTC ISO-8601 with millisecond precision
fn format_datetime(unit: TimeUnit, value: i64) -> Option<String> {
    let dt = match unit {
        TimeUnit::Nanoseconds => Some(chrono::DateTime::from_timestamp_nanos(value)),
        TimeUnit::Microseconds => chrono::DateTime::from_timestamp_micros(value),
        TimeUnit::Milliseconds => chrono::DateTime::from_timestamp_millis(value),
    }?;
    Some(dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string())
}

/// Nanoseconds since midnight as `HH:MM:SS.sss`
fn format_time(nanos: i64) -> Option<String> {
    let secs = u32::try_from(nanos.div_euclid(1_000_000_000)).ok()?;
    let frac = u32::try_from(nanos.rem_euclid(1_000_000_000)).ok()?;
    chrono::NaiveTime::from_num_seconds_from_midnight_opt(secs, frac)
        .map(|t| t.format("%H:%M:%S%.3f").to_string())
}

/// Merge per-key row sets into one dataset
///
/// Every row carries the union of all columns (null where its own dataset
/// lacks one) plus [`naming::SOURCE_COLUMN`] set to its dataset key.
pub(super) fn unify_datasets(datasets: &[(String, Vec<Value>)]) -> Vec<Value> {
    let mut all_columns: BTreeSet<&str> = BTreeSet::new();
    for (_, rows) in datasets {
        for row in rows {
            if let Some(obj) = row.as_object() {
                all_columns.extend(obj.keys().map(String::as_str));
            }
        }
    }

    let mut unified = Vec::new();
    for (key, rows) in datasets {
        for row in rows {
            let Some(obj) = row.as_object() else {
                continue;
            };
            let mut new_row = Map::new();
            for name in &all_columns {
                let value = obj.get(*name).cloned().unwrap_or(Value::Null);
                new_row.insert((*name).to_string(), value);
            }
            new_row.insert(naming::SOURCE_COLUMN.to_string(), json!(key));
            unified.push(Value::Object(new_row));
        }
    }
    unified
}

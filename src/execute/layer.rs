//! Layer query building and stat application.
//!
//! Layer queries read from the materialised base result. Stat queries wrap
//! the layer query (or the base result when there is no FILTER) and produce
//! the reserved `__ggsql_stat_*__` columns that the layer's aesthetics are
//! then remapped onto.

use crate::naming::{self, quote_ident};
use crate::plot::{Aesthetic, AestheticValue, Layer, MappingSource, Stat};

/// Build the FILTER query for a layer, if it has one
pub fn layer_query(layer: &Layer, source: &str) -> Option<String> {
    layer
        .filter
        .as_ref()
        .map(|filter| format!("SELECT * FROM {} WHERE {}", source, filter))
}

/// Columns a stat groups by: every mapped column except `skip`, then the
/// facet columns, without duplicates.
fn group_columns(layer: &Layer, skip: Option<Aesthetic>, facet_columns: &[String]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for (aes, value) in layer.aesthetics.iter() {
        if Some(aes) == skip {
            continue;
        }
        if let Some(name) = value.column_name() {
            if !columns.iter().any(|c| c == name) {
                columns.push(name.to_string());
            }
        }
    }
    for column in facet_columns {
        if !columns.contains(column) {
            columns.push(column.clone());
        }
    }
    columns
}

/// Build the stat query for a layer
///
/// `from` is a table name or a parenthesised subquery with alias.
pub fn stat_query(layer: &Layer, stat: Stat, from: &str, facet_columns: &[String]) -> String {
    match stat {
        Stat::Count => count_query(layer, from, facet_columns),
        Stat::Bin { bins } => bin_query(layer, bins, from, facet_columns),
    }
}

fn count_query(layer: &Layer, from: &str, facet_columns: &[String]) -> String {
    let groups: Vec<String> = group_columns(layer, Some(Aesthetic::Y), facet_columns)
        .iter()
        .map(|c| quote_ident(c))
        .collect();
    let count = format!("COUNT(*) AS {}", quote_ident(naming::STAT_COUNT));
    if groups.is_empty() {
        return format!("SELECT {} FROM {}", count, from);
    }
    let list = groups.join(", ");
    format!(
        "SELECT {list}, {count} FROM {from} GROUP BY {list} ORDER BY {list}",
        list = list,
        count = count,
        from = from
    )
}

fn bin_query(layer: &Layer, bins: usize, from: &str, facet_columns: &[String]) -> String {
    let x = quote_ident(layer.aesthetics.column(Aesthetic::X).unwrap_or_default());
    let groups: Vec<String> = group_columns(layer, Some(Aesthetic::X), facet_columns)
        .iter()
        .map(|c| quote_ident(c))
        .collect();
    let group_select: String = groups.iter().map(|g| format!(", {}", g)).collect();

    let source = quote_ident("__ggsql_bin_source__");
    let bounds = quote_ident("__ggsql_bin_bounds__");
    let lo = quote_ident("__ggsql_bin_lo__");
    let hi = quote_ident("__ggsql_bin_hi__");
    let idx = quote_ident("__ggsql_bin_idx__");
    let n = bins as f64;

    format!(
        "WITH {source} AS (SELECT * FROM {from}), \
         {bounds} AS (SELECT CAST(MIN({x}) AS DOUBLE) AS {lo}, CAST(MAX({x}) AS DOUBLE) AS {hi} \
         FROM {source} WHERE {x} IS NOT NULL) \
         SELECT {lo} + ({hi} - {lo}) * {idx} / {n} AS {bin}, \
         {lo} + ({hi} - {lo}) * ({idx} + 1) / {n} AS {bin_end}{group_select}, \
         COUNT(*) AS {count} \
         FROM (SELECT {source}.*, CAST(LEAST(COALESCE(FLOOR((CAST({x} AS DOUBLE) - {lo}) \
         / NULLIF({hi} - {lo}, 0) * {n}), 0), {last}) AS BIGINT) AS {idx}, {lo}, {hi} \
         FROM {source}, {bounds} WHERE {x} IS NOT NULL) \
         GROUP BY {idx}, {lo}, {hi}{group_select} \
         ORDER BY {idx}{group_select}",
        source = source,
        from = from,
        bounds = bounds,
        x = x,
        lo = lo,
        hi = hi,
        idx = idx,
        n = format_float(n),
        last = bins.saturating_sub(1),
        bin = quote_ident(naming::STAT_BIN),
        bin_end = quote_ident(naming::STAT_BIN_END),
        count = quote_ident(naming::STAT_COUNT),
        group_select = group_select,
    )
}

/// Float literal DuckDB reads as DOUBLE, so bin arithmetic is never integral
fn format_float(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

/// Point a layer's aesthetics at the columns its stat produced
pub fn apply_stat_remappings(layer: &mut Layer, stat: Stat) {
    let count = AestheticValue::column_with_original(naming::STAT_COUNT, "count");
    match stat {
        Stat::Count => {
            layer
                .aesthetics
                .insert(Aesthetic::Y, count, MappingSource::Stat);
        }
        Stat::Bin { .. } => {
            let original = layer
                .aesthetics
                .column(Aesthetic::X)
                .unwrap_or_default()
                .to_string();
            layer.aesthetics.insert(
                Aesthetic::X,
                AestheticValue::column_with_original(naming::STAT_BIN, original),
                MappingSource::Stat,
            );
            layer
                .aesthetics
                .insert(Aesthetic::Y, count, MappingSource::Stat);
        }
    }
}

//! Reserved names shared by the executor and the writers
//!
//! Every synthetic table, dataset key and column introduced by ggsql uses the
//! `__ggsql_<kind>__` shape so it can never collide with user columns in
//! practice, and so [`is_synthetic_column`] can recognise it.

/// Key of the base query result in the prepared data map. The executor also
/// registers the base result under this table name while layer SQL runs.
pub const GLOBAL_DATA_KEY: &str = "__ggsql_global__";

/// Column added to every row of the unified writer dataset, naming the
/// dataset the row came from.
pub const SOURCE_COLUMN: &str = "__ggsql_source__";

/// Row count produced by the count and bin stats.
pub const STAT_COUNT: &str = "__ggsql_stat_count__";

/// Lower bin edge produced by the bin stat.
pub const STAT_BIN: &str = "__ggsql_stat_bin__";

/// Upper bin edge produced by the bin stat.
pub const STAT_BIN_END: &str = "__ggsql_stat_bin_end__";

/// Dataset key for a layer's filtered data.
pub fn layer_key(layer_idx: usize) -> String {
    format!("__ggsql_layer_{}__", layer_idx)
}

/// Dataset key for a layer's stat output.
pub fn stat_key(layer_idx: usize) -> String {
    format!("__ggsql_stat_{}__", layer_idx)
}

/// True for any name following the reserved `__ggsql_*__` convention.
pub fn is_synthetic_column(name: &str) -> bool {
    name.strip_prefix("__ggsql_")
        .and_then(|rest| rest.strip_suffix("__"))
        .is_some_and(|body| !body.is_empty())
}

/// Quote a column or table name for DuckDB.
///
/// Embedded double quotes are doubled.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

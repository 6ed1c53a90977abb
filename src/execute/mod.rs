//! Query execution module for ggsql
//!
//! Turns a full ggsql query into a [`Prepared`] by running the SQL portion
//! and the per-layer FILTER and stat queries through a [`Reader`].
//!
//! Caller-supplied tables are registered in a [`RegistrationScope`] that is
//! released on every exit path, so a failed query never leaves tables behind
//! on the reader.

mod layer;

pub use layer::{apply_stat_remappings, layer_query, stat_query};

use std::collections::HashMap;

use crate::naming::{self, quote_ident};
use crate::parser::{self, split_statements};
use crate::reader::{Prepared, Reader};
use crate::validate::{resolve_plot, ValidationWarning};
use crate::{DataFrame, GgsqlError, Result};
use tracing::{debug, info, warn};

// =============================================================================
// Registration Scope
// =============================================================================

/// Tables registered on a reader for the duration of one execution
///
/// Call [`release`](RegistrationScope::release) once the work is done,
/// whether it succeeded or not.
#[derive(Debug, Default)]
pub struct RegistrationScope {
    names: Vec<String>,
}

impl RegistrationScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every table in `data`
    ///
    /// Tables registered before a failure stay tracked and are dropped by
    /// [`release`](RegistrationScope::release).
    pub fn acquire<R: Reader + ?Sized>(
        &mut self,
        reader: &mut R,
        data: HashMap<String, DataFrame>,
    ) -> Result<()> {
        if data.is_empty() {
            return Ok(());
        }
        if !reader.supports_register() {
            return Err(GgsqlError::ReaderError(
                "This reader does not support DataFrame registration".to_string(),
            ));
        }
        let mut tables: Vec<(String, DataFrame)> = data.into_iter().collect();
        tables.sort_by(|a, b| a.0.cmp(&b.0));
        for (name, df) in tables {
            self.register(reader, &name, df)?;
        }
        Ok(())
    }

    /// Register a single table in this scope
    pub fn register<R: Reader + ?Sized>(
        &mut self,
        reader: &mut R,
        name: &str,
        df: DataFrame,
    ) -> Result<()> {
        reader.register(name, df)?;
        if !self.names.iter().any(|n| n == name) {
            self.names.push(name.to_string());
        }
        debug!(table = name, "Registered scoped table");
        Ok(())
    }

    /// Names registered so far, in registration order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Unregister everything, most recent first
    ///
    /// Every table is attempted even after a failure; the first failure is
    /// returned.
    pub fn release<R: Reader + ?Sized>(&mut self, reader: &mut R) -> Result<()> {
        let mut first_err = None;
        while let Some(name) = self.names.pop() {
            if let Err(e) = reader.unregister(&name) {
                warn!(table = %name, error = %e, "Failed to unregister table");
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}

// =============================================================================
// Execution
// =============================================================================

/// Execute a ggsql query against a reader
///
/// `data` tables are registered before any SQL runs and unregistered
/// afterwards, on success and on failure.
///
/// # Errors
///
/// - `NoVisualiseError` when the query has no VISUALISE clause
/// - `ParseError` for split and grammar errors, or when there is no SQL
/// - `ValidationError` listing every validation error
/// - `ReaderError` for registration and SQL failures
pub fn execute_query<R: Reader + ?Sized>(
    reader: &mut R,
    query: &str,
    data: Option<HashMap<String, DataFrame>>,
) -> Result<Prepared> {
    let split = parser::split_query(query)?;
    if !split.has_visual() {
        return Err(GgsqlError::NoVisualiseError(
            "Query has no VISUALISE clause. Use execute_sql() for plain SQL queries".to_string(),
        ));
    }
    if split.sql.is_empty() {
        return Err(GgsqlError::ParseError(
            "Query has no SQL to visualise. Add a SELECT before VISUALISE or use VISUALISE FROM <table>"
                .to_string(),
        ));
    }
    let plot = parser::parse_visual(&split.visual)?;

    let mut scope = RegistrationScope::new();
    let result = scope
        .acquire(reader, data.unwrap_or_default())
        .and_then(|_| run(reader, &mut scope, split.sql, split.visual, plot));
    let released = scope.release(reader);

    match (result, released) {
        (Ok(prepared), Ok(())) => Ok(prepared),
        (Ok(_), Err(e)) => Err(e),
        (Err(e), _) => Err(e),
    }
}

fn run<R: Reader + ?Sized>(
    reader: &mut R,
    scope: &mut RegistrationScope,
    sql: String,
    visual: String,
    mut plot: crate::plot::Plot,
) -> Result<Prepared> {
    let base = reader.execute_sql(&sql)?;
    let schema: Vec<String> = base
        .get_column_names()
        .iter()
        .map(|c| c.to_string())
        .collect();
    debug!(rows = base.height(), columns = ?schema, "Executed base query");

    let diagnostics = resolve_plot(&mut plot, Some(schema.as_slice()), &visual);
    if !diagnostics.errors.is_empty() {
        let messages: Vec<String> = diagnostics.errors.into_iter().map(|e| e.message).collect();
        return Err(GgsqlError::ValidationError(messages.join("; ")));
    }
    let mut warnings = diagnostics.warnings;

    // Layer SQL reads the base result under a reserved name. Readers that
    // cannot register tables get the base query inlined instead.
    let source = if plot.layers.iter().any(|l| l.needs_query()) {
        if reader.supports_register() {
            scope.register(reader, naming::GLOBAL_DATA_KEY, base.clone())?;
            quote_ident(naming::GLOBAL_DATA_KEY)
        } else {
            let last = split_statements(&sql).pop().unwrap_or_default();
            format!("({}) AS {}", last, quote_ident(naming::GLOBAL_DATA_KEY))
        }
    } else {
        quote_ident(naming::GLOBAL_DATA_KEY)
    };

    let facet_columns: Vec<String> = plot
        .facet
        .as_ref()
        .map(|f| f.columns().into_iter().map(String::from).collect())
        .unwrap_or_default();

    let mut data: HashMap<String, DataFrame> = HashMap::new();
    let mut layer_sql = Vec::with_capacity(plot.layers.len());
    let mut stat_sql = Vec::with_capacity(plot.layers.len());
    for (idx, layer) in plot.layers.iter_mut().enumerate() {
        let filtered = layer_query(layer, &source);
        let mut rows = base.height();
        if let Some(query) = &filtered {
            let df = reader.execute_sql(query)?;
            debug!(layer = idx + 1, rows = df.height(), "Executed layer query");
            rows = df.height();
            data.insert(naming::layer_key(idx), df);
        }

        let stat = match layer.stat {
            Some(stat) => {
                let from = match &filtered {
                    Some(query) => format!("({}) AS {}", query, quote_ident(&naming::layer_key(idx))),
                    None => source.clone(),
                };
                let query = stat_query(layer, stat, &from, &facet_columns);
                let df = reader.execute_sql(&query)?;
                debug!(layer = idx + 1, stat = %stat, rows = df.height(), "Executed stat query");
                rows = df.height();
                data.insert(naming::stat_key(idx), df);
                apply_stat_remappings(layer, stat);
                Some(query)
            }
            None => None,
        };

        if rows == 0 {
            warnings.push(ValidationWarning {
                message: format!("Layer {} returned no rows", idx + 1),
                location: None,
            });
        }
        layer_sql.push(filtered);
        stat_sql.push(stat);
    }

    data.insert(naming::GLOBAL_DATA_KEY.to_string(), base);
    let prepared = Prepared::new(plot, data, sql, visual, layer_sql, stat_sql, warnings);
    info!(
        rows = prepared.metadata().rows,
        layers = prepared.metadata().layer_count,
        warnings = prepared.warnings().len(),
        "Prepared visualisation"
    );
    Ok(prepared)
}

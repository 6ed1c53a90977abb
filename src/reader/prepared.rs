//! Executed query, ready for rendering

use std::collections::HashMap;

use crate::naming;
use crate::plot::Plot;
use crate::validate::ValidationWarning;
use crate::DataFrame;

/// Result of executing a ggsql query, ready for rendering.
///
/// Immutable once built. Data frames are keyed by [`naming::GLOBAL_DATA_KEY`]
/// for the base result, [`naming::layer_key`] for FILTER results and
/// [`naming::stat_key`] for stat results.
#[derive(Debug, Clone)]
pub struct Prepared {
    plot: Plot,
    data: HashMap<String, DataFrame>,
    metadata: Metadata,
    sql: String,
    visual: String,
    /// Per-layer filter queries (None = uses global data directly)
    layer_sql: Vec<Option<String>>,
    /// Per-layer stat transform queries (None = no stat transform)
    stat_sql: Vec<Option<String>>,
    warnings: Vec<ValidationWarning>,
}

/// Metadata about the prepared visualization.
#[derive(Debug, Clone, PartialEq)]
pub struct Metadata {
    /// Rows in the base query result
    pub rows: usize,
    /// Columns of the base query result, in order
    pub columns: Vec<String>,
    pub layer_count: usize,
}

impl Prepared {
    pub(crate) fn new(
        plot: Plot,
        data: HashMap<String, DataFrame>,
        sql: String,
        visual: String,
        layer_sql: Vec<Option<String>>,
        stat_sql: Vec<Option<String>>,
        warnings: Vec<ValidationWarning>,
    ) -> Self {
        let (rows, columns) = data
            .get(naming::GLOBAL_DATA_KEY)
            .map(|df| {
                let columns = df
                    .get_column_names()
                    .iter()
                    .map(|c| c.to_string())
                    .collect();
                (df.height(), columns)
            })
            .unwrap_or_default();
        let metadata = Metadata {
            rows,
            columns,
            layer_count: plot.layers.len(),
        };
        Self {
            plot,
            data,
            metadata,
            sql,
            visual,
            layer_sql,
            stat_sql,
            warnings,
        }
    }

    /// The resolved plot
    pub fn plot(&self) -> &Plot {
        &self.plot
    }

    pub fn layer_count(&self) -> usize {
        self.plot.layers.len()
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// The main SQL query that was executed
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// The raw VISUALISE portion text
    pub fn visual(&self) -> &str {
        &self.visual
    }

    /// Base query result
    pub fn data(&self) -> Option<&DataFrame> {
        self.data.get(naming::GLOBAL_DATA_KEY)
    }

    /// Result of a layer's FILTER query, if it has one
    pub fn layer_data(&self, index: usize) -> Option<&DataFrame> {
        self.data.get(&naming::layer_key(index))
    }

    /// Result of a layer's stat query, if it has one
    pub fn stat_data(&self, index: usize) -> Option<&DataFrame> {
        self.data.get(&naming::stat_key(index))
    }

    pub fn layer_sql(&self, index: usize) -> Option<&str> {
        self.layer_sql.get(index).and_then(|s| s.as_deref())
    }

    pub fn stat_sql(&self, index: usize) -> Option<&str> {
        self.stat_sql.get(index).and_then(|s| s.as_deref())
    }

    /// Key in [`Prepared::data_map`] of the frame a layer draws from
    ///
    /// The stat result wins over the FILTER result, which wins over the
    /// base result.
    pub fn data_key(&self, index: usize) -> String {
        if self.stat_sql(index).is_some() {
            naming::stat_key(index)
        } else if self.layer_sql(index).is_some() {
            naming::layer_key(index)
        } else {
            naming::GLOBAL_DATA_KEY.to_string()
        }
    }

    pub fn warnings(&self) -> &[ValidationWarning] {
        &self.warnings
    }

    /// All data frames keyed by dataset name
    pub fn data_map(&self) -> &HashMap<String, DataFrame> {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plot::{Geom, Layer};
    use polars::prelude::*;

    fn prepared() -> Prepared {
        let mut plot = Plot::new();
        plot.layers.push(Layer::new(Geom::point()));
        plot.layers.push(Layer::new(Geom::bar()));
        plot.layers.push(Layer::new(Geom::histogram()));

        let mut data = HashMap::new();
        data.insert(
            naming::GLOBAL_DATA_KEY.to_string(),
            df! { "x" => &[1i64, 2, 3], "y" => &[4i64, 5, 6] }.unwrap(),
        );
        data.insert(
            naming::layer_key(1),
            df! { "x" => &[1i64], "y" => &[4i64] }.unwrap(),
        );
        Prepared::new(
            plot,
            data,
            "SELECT * FROM t".to_string(),
            "VISUALISE x, y DRAW point".to_string(),
            vec![None, Some("SELECT * FROM g WHERE x < 2".to_string()), None],
            vec![None, None, Some("SELECT bins".to_string())],
            Vec::new(),
        )
    }

    #[test]
    fn test_metadata_from_global_frame() {
        let p = prepared();
        assert_eq!(
            p.metadata(),
            &Metadata {
                rows: 3,
                columns: vec!["x".to_string(), "y".to_string()],
                layer_count: 3,
            }
        );
        assert_eq!(p.layer_count(), 3);
    }

    #[test]
    fn test_layer_accessors() {
        let p = prepared();
        assert!(p.layer_sql(0).is_none());
        assert!(p.layer_sql(1).unwrap().contains("x < 2"));
        assert!(p.layer_sql(7).is_none());
        assert_eq!(p.layer_data(1).unwrap().height(), 1);
        assert!(p.stat_data(2).is_none());
    }

    #[test]
    fn test_data_key_precedence() {
        let p = prepared();
        assert_eq!(p.data_key(0), naming::GLOBAL_DATA_KEY);
        assert_eq!(p.data_key(1), naming::layer_key(1));
        assert_eq!(p.data_key(2), naming::stat_key(2));
    }
}

//! Vega-Lite JSON writer implementation
//!
//! Converts a [`Prepared`] query result into a Vega-Lite v6 chart for
//! web-based interactive visualizations.
//!
//! # Mapping Strategy
//!
//! - ggsql Geom -> Vega-Lite mark type
//! - ggsql aesthetics -> Vega-Lite encoding channels
//! - ggsql layers -> Vega-Lite layer composition
//! - Polars DataFrames -> one unified dataset, each layer filtering its rows
//!   by [`naming::SOURCE_COLUMN`]
//!
//! # Example
//!
//! ```rust,ignore
//! use ggsql_core::writer::{Writer, VegaLiteWriter};
//!
//! let writer = VegaLiteWriter::new().with_inline_limit(1_000);
//! let vega_json = writer.render_json(&prepared)?;
//! // Can be rendered in browser with vega-embed
//! ```

mod chart;
mod data;
mod encoding;

pub use chart::{ChartData, ChartTitle, FacetSpec, VegaLiteChart};

use crate::plot::{Facet, Layer, Stat};
use crate::reader::Prepared;
use crate::writer::Writer;
use crate::{naming, DataFrame, GgsqlError, Result};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use tracing::debug;

use data::{dataframe_to_values, unify_datasets};
use encoding::{build_encoding, flip_axes, geom_to_mark, infer_field_type};

/// Default Vega-Lite schema URL
pub const DEFAULT_SCHEMA: &str = "https://vega.github.io/schema/vega-lite/v6.json";

/// Rows embedded in `data.values` before switching to a named dataset
pub const DEFAULT_INLINE_LIMIT: usize = 10_000;

/// Name of the unified dataset when it is not inlined
const UNIFIED_DATASET: &str = "__ggsql_data__";

/// Vega-Lite JSON writer
///
/// Generates Vega-Lite v6 specifications from prepared query results.
#[derive(Debug, Clone)]
pub struct VegaLiteWriter {
    /// Vega-Lite schema version
    schema: String,
    inline_limit: usize,
}

impl VegaLiteWriter {
    /// Create a new Vega-Lite writer with default settings
    pub fn new() -> Self {
        Self {
            schema: DEFAULT_SCHEMA.to_string(),
            inline_limit: DEFAULT_INLINE_LIMIT,
        }
    }

    /// Use a different `$schema` URL
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = schema.into();
        self
    }

    /// Inline at most `rows` rows; larger data goes into `datasets`
    pub fn with_inline_limit(mut self, rows: usize) -> Self {
        self.inline_limit = rows;
        self
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn inline_limit(&self) -> usize {
        self.inline_limit
    }

    fn build_layer(layer: &Layer, data_key: &str, df: &DataFrame, prepared: &Prepared) -> Value {
        let plot = prepared.plot();
        let mut encoding = build_encoding(layer, df, plot.labels.as_ref());
        if plot.project.is_some_and(|p| p.is_flipped()) {
            flip_axes(&mut encoding);
        }
        json!({
            "mark": geom_to_mark(layer),
            "transform": [{
                "filter": {
                    "field": naming::SOURCE_COLUMN,
                    "equal": data_key
                }
            }],
            "encoding": Value::Object(encoding),
        })
    }
}

impl Default for VegaLiteWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Check that every column a layer's encoding references exists
fn validate_layer_columns(layer: &Layer, df: &DataFrame, data_key: &str, layer_idx: usize) -> Result<()> {
    let mut columns = layer.aesthetics.columns();
    if matches!(layer.stat, Some(Stat::Bin { .. })) {
        columns.push(naming::STAT_BIN_END);
    }
    for column in columns {
        if df.column(column).is_err() {
            return Err(GgsqlError::WriterError(format!(
                "Layer {}: column '{}' does not exist in dataset '{}'",
                layer_idx + 1,
                column,
                data_key
            )));
        }
    }
    Ok(())
}

fn facet_encoding(facet: &Facet, df: Option<&DataFrame>) -> Value {
    let field = |column: &str| {
        let field_type = df.map(|df| infer_field_type(df, column)).unwrap_or("nominal");
        json!({ "field": column, "type": field_type })
    };
    match facet {
        Facet::Wrap { column } => field(column),
        Facet::Grid { row, column } => {
            let mut facet_spec = Map::new();
            facet_spec.insert("row".to_string(), field(row));
            if let Some(column) = column {
                facet_spec.insert("column".to_string(), field(column));
            }
            Value::Object(facet_spec)
        }
    }
}

impl Writer for VegaLiteWriter {
    type Chart = VegaLiteChart;

    fn render_chart(&self, prepared: &Prepared) -> Result<VegaLiteChart> {
        let plot = prepared.plot();
        if plot.layers.is_empty() {
            return Err(GgsqlError::WriterError(
                "Chart has no layers to render".to_string(),
            ));
        }

        // Determine which dataset key each layer should use
        let layer_data_keys: Vec<String> = (0..plot.layers.len())
            .map(|idx| prepared.data_key(idx))
            .collect();

        // Validate layers and collect each distinct dataset once, in layer order
        let mut datasets: Vec<(String, Vec<Value>)> = Vec::new();
        let mut frames: Vec<&DataFrame> = Vec::with_capacity(plot.layers.len());
        for (layer_idx, (layer, key)) in plot.layers.iter().zip(&layer_data_keys).enumerate() {
            if layer.aesthetics.is_empty() {
                return Err(GgsqlError::WriterError(format!(
                    "Layer {} has no aesthetic mappings",
                    layer_idx + 1
                )));
            }
            let df = prepared.data_map().get(key).ok_or_else(|| {
                GgsqlError::WriterError(format!(
                    "Missing data source '{}' for layer {}",
                    key,
                    layer_idx + 1
                ))
            })?;
            validate_layer_columns(layer, df, key, layer_idx)?;

            if !datasets.iter().any(|(k, _)| k == key) {
                datasets.push((key.clone(), dataframe_to_values(df)?));
            }
            frames.push(df);
        }

        // Unify all datasets into a single dataset with source identification
        let unified = unify_datasets(&datasets);
        let (data, named) = if unified.len() <= self.inline_limit {
            (ChartData::Values { values: unified }, None)
        } else {
            debug!(rows = unified.len(), limit = self.inline_limit, "Moving chart data to named dataset");
            let mut named = BTreeMap::new();
            named.insert(UNIFIED_DATASET.to_string(), unified);
            (
                ChartData::Named {
                    name: UNIFIED_DATASET.to_string(),
                },
                Some(named),
            )
        };

        let layers: Vec<Value> = plot
            .layers
            .iter()
            .zip(&layer_data_keys)
            .zip(&frames)
            .map(|((layer, key), df)| Self::build_layer(layer, key, df, prepared))
            .collect();

        let title = plot
            .labels
            .as_ref()
            .and_then(|labels| ChartTitle::from_parts(labels.title(), labels.subtitle()));

        let mut chart = VegaLiteChart {
            schema: self.schema.clone(),
            title,
            width: "container".to_string(),
            height: "container".to_string(),
            data,
            datasets: named,
            layer: Some(layers),
            facet: None,
            spec: None,
        };

        // Move layers into the inner spec (data reference stays at top level)
        if let Some(facet) = &plot.facet {
            let facet_data = prepared.data().or_else(|| frames.first().copied());
            chart.facet = Some(facet_encoding(facet, facet_data));
            chart.spec = chart.layer.take().map(|layer| FacetSpec { layer });
        }

        debug!(
            layers = plot.layers.len(),
            datasets = datasets.len(),
            faceted = chart.is_faceted(),
            "Rendered Vega-Lite chart"
        );
        Ok(chart)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plot::{
        Aesthetic, AestheticValue, CoordKind, Geom, LabelKey, Labels, MappingSource, Plot,
        Projection,
    };
    use polars::prelude::*;
    use proptest::prelude::*;
    use std::collections::HashMap;

    fn xy_layer(geom: Geom) -> Layer {
        let mut layer = Layer::new(geom);
        layer.aesthetics.insert(
            Aesthetic::X,
            AestheticValue::standard_column("x"),
            MappingSource::Inherited,
        );
        layer.aesthetics.insert(
            Aesthetic::Y,
            AestheticValue::standard_column("y"),
            MappingSource::Inherited,
        );
        layer
    }

    fn prepared(plot: Plot, data: HashMap<String, DataFrame>) -> Prepared {
        let n = plot.layers.len();
        Prepared::new(
            plot,
            data,
            "SELECT * FROM t".to_string(),
            "VISUALISE x, y".to_string(),
            vec![None; n],
            vec![None; n],
            Vec::new(),
        )
    }

    fn global(df: DataFrame) -> HashMap<String, DataFrame> {
        let mut data = HashMap::new();
        data.insert(naming::GLOBAL_DATA_KEY.to_string(), df);
        data
    }

    fn xy_frame() -> DataFrame {
        df! {
            "x" => &[1i64, 2, 3],
            "y" => &[4i64, 5, 6],
        }
        .unwrap()
    }

    #[test]
    fn test_simple_point_spec() {
        let writer = VegaLiteWriter::new();
        let mut plot = Plot::new();
        plot.layers.push(xy_layer(Geom::point()));

        let json_str = writer.render_json(&prepared(plot, global(xy_frame()))).unwrap();
        let vl_spec: Value = serde_json::from_str(&json_str).unwrap();

        assert_eq!(vl_spec["$schema"], writer.schema());
        assert_eq!(vl_spec["width"], "container");
        assert!(vl_spec["layer"].is_array());
        assert_eq!(vl_spec["layer"][0]["mark"]["type"], "point");
        assert_eq!(vl_spec["layer"][0]["mark"]["clip"], true);
        assert_eq!(vl_spec["data"]["values"].as_array().unwrap().len(), 3);
        assert_eq!(
            vl_spec["layer"][0]["transform"][0]["filter"]["equal"],
            naming::GLOBAL_DATA_KEY
        );
        assert_eq!(vl_spec["layer"][0]["encoding"]["x"]["type"], "quantitative");
        assert!(vl_spec.get("datasets").is_none());
    }

    #[test]
    fn test_title_and_subtitle() {
        let mut plot = Plot::new();
        plot.layers.push(xy_layer(Geom::line()));
        let mut labels = Labels::default();
        labels.insert(LabelKey::Title, "My Chart");
        labels.insert(LabelKey::Subtitle, "by day");
        plot.labels = Some(labels);

        let chart = VegaLiteWriter::new()
            .render_chart(&prepared(plot, global(xy_frame())))
            .unwrap();
        let vl_spec = serde_json::to_value(&chart).unwrap();
        assert_eq!(vl_spec["title"], json!({"text": "My Chart", "subtitle": "by day"}));
    }

    #[test]
    fn test_layers_share_one_dataset_copy() {
        let mut plot = Plot::new();
        plot.layers.push(xy_layer(Geom::line()));
        plot.layers.push(xy_layer(Geom::point()));

        let chart = VegaLiteWriter::new()
            .render_chart(&prepared(plot, global(xy_frame())))
            .unwrap();
        match &chart.data {
            ChartData::Values { values } => assert_eq!(values.len(), 3),
            other => panic!("expected inline values, got {:?}", other),
        }
    }

    #[test]
    fn test_filtered_layer_gets_own_rows() {
        let mut plot = Plot::new();
        plot.layers.push(xy_layer(Geom::line()));
        plot.layers.push(xy_layer(Geom::point()).with_filter("y > 4"));

        let mut data = global(xy_frame());
        data.insert(
            naming::layer_key(1),
            df! { "x" => &[2i64, 3], "y" => &[5i64, 6] }.unwrap(),
        );
        let prepared = Prepared::new(
            plot,
            data,
            "SELECT * FROM t".to_string(),
            "VISUALISE x, y".to_string(),
            vec![None, Some("SELECT * FROM g WHERE y > 4".to_string())],
            vec![None, None],
            Vec::new(),
        );

        let vl_spec = serde_json::to_value(VegaLiteWriter::new().render_chart(&prepared).unwrap()).unwrap();
        let rows = vl_spec["data"]["values"].as_array().unwrap();
        assert_eq!(rows.len(), 5);
        let layer_rows = rows
            .iter()
            .filter(|r| r[naming::SOURCE_COLUMN] == naming::layer_key(1).as_str())
            .count();
        assert_eq!(layer_rows, 2);
        assert_eq!(
            vl_spec["layer"][1]["transform"][0]["filter"]["equal"],
            naming::layer_key(1).as_str()
        );
    }

    #[test]
    fn test_inline_limit_moves_data_to_datasets() {
        let mut plot = Plot::new();
        plot.layers.push(xy_layer(Geom::point()));

        let vl_spec = serde_json::to_value(
            VegaLiteWriter::new()
                .with_inline_limit(2)
                .render_chart(&prepared(plot, global(xy_frame())))
                .unwrap(),
        )
        .unwrap();

        assert_eq!(vl_spec["data"], json!({"name": UNIFIED_DATASET}));
        assert_eq!(vl_spec["datasets"][UNIFIED_DATASET].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_custom_schema() {
        let mut plot = Plot::new();
        plot.layers.push(xy_layer(Geom::point()));
        let writer = VegaLiteWriter::new().with_schema("https://example.org/vl.json");

        let chart = writer.render_chart(&prepared(plot, global(xy_frame()))).unwrap();
        assert_eq!(chart.schema, "https://example.org/vl.json");
    }

    #[test]
    fn test_missing_column_error() {
        let mut plot = Plot::new();
        let mut layer = xy_layer(Geom::point());
        layer.aesthetics.insert(
            Aesthetic::Y,
            AestheticValue::standard_column("nonexistent"),
            MappingSource::Explicit,
        );
        plot.layers.push(layer);

        let err = VegaLiteWriter::new()
            .render_chart(&prepared(plot, global(xy_frame())))
            .unwrap_err();
        assert!(matches!(err, GgsqlError::WriterError(_)));
        assert!(err.to_string().contains("nonexistent"));
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_layer_without_mappings_is_rejected() {
        let mut plot = Plot::new();
        plot.layers.push(Layer::new(Geom::point()));

        let err = VegaLiteWriter::new()
            .render_chart(&prepared(plot, global(xy_frame())))
            .unwrap_err();
        assert!(err.to_string().contains("no aesthetic mappings"));
    }

    #[test]
    fn test_missing_dataset_is_rejected() {
        let mut plot = Plot::new();
        plot.layers.push(xy_layer(Geom::point()));

        let err = VegaLiteWriter::new()
            .render_chart(&prepared(plot, HashMap::new()))
            .unwrap_err();
        assert!(err.to_string().contains("Missing data source"));
    }

    #[test]
    fn test_facet_grid_moves_layers_into_spec() {
        let mut plot = Plot::new();
        plot.layers.push(xy_layer(Geom::point()));
        plot.facet = Some(Facet::Grid {
            row: "g".to_string(),
            column: Some("year".to_string()),
        });
        let df = df! {
            "x" => &[1i64, 2],
            "y" => &[3i64, 4],
            "g" => &["a", "b"],
            "year" => &[2020i64, 2021],
        }
        .unwrap();

        let chart = VegaLiteWriter::new()
            .render_chart(&prepared(plot, global(df)))
            .unwrap();
        assert!(chart.layer.is_none());
        assert_eq!(chart.layers().len(), 1);

        let vl_spec = serde_json::to_value(&chart).unwrap();
        assert_eq!(vl_spec["facet"]["row"], json!({"field": "g", "type": "nominal"}));
        assert_eq!(vl_spec["facet"]["column"]["type"], "quantitative");
        assert!(vl_spec["data"]["values"].is_array());
    }

    #[test]
    fn test_flip_projection_swaps_axes() {
        let mut plot = Plot::new();
        plot.layers.push(xy_layer(Geom::bar()));
        plot.project = Some(Projection {
            coord: CoordKind::Flip,
        });

        let chart = VegaLiteWriter::new()
            .render_chart(&prepared(plot, global(xy_frame())))
            .unwrap();
        let layer = &chart.layers()[0];
        assert_eq!(layer["encoding"]["x"]["field"], "y");
        assert_eq!(layer["encoding"]["y"]["field"], "x");
    }

    /// Rows of an x (integer), y (nullable float) and g (text) frame
    fn frame_strategy() -> impl Strategy<Value = Vec<(i64, Option<f64>, String)>> {
        prop::collection::vec(
            (
                any::<i64>(),
                prop::option::of(-1.0e9f64..1.0e9),
                "[a-z]{0,6}",
            ),
            0..40,
        )
    }

    proptest! {
        #[test]
        fn prop_random_prepared_renders_valid_json(
            rows in frame_strategy(),
            layer_count in 1usize..5,
            filtered in prop::collection::vec(any::<bool>(), 4),
            flip in any::<bool>(),
        ) {
            let x: Vec<i64> = rows.iter().map(|r| r.0).collect();
            let y: Vec<Option<f64>> = rows.iter().map(|r| r.1).collect();
            let g: Vec<&str> = rows.iter().map(|r| r.2.as_str()).collect();
            let df = df! { "x" => x, "y" => y, "g" => g }.unwrap();

            let mut plot = Plot::new();
            let mut data = global(df.clone());
            let mut layer_sql = Vec::new();
            for idx in 0..layer_count {
                let mut layer = xy_layer(Geom::from_type(
                    crate::plot::GeomType::ALL[idx % crate::plot::GeomType::ALL.len()],
                ));
                layer.aesthetics.insert(
                    Aesthetic::Color,
                    AestheticValue::standard_column("g"),
                    MappingSource::Explicit,
                );
                plot.layers.push(layer);
                if filtered[idx] {
                    data.insert(naming::layer_key(idx), df.head(Some(rows.len() / 2)));
                    layer_sql.push(Some(format!("SELECT * FROM t LIMIT {}", rows.len() / 2)));
                } else {
                    layer_sql.push(None);
                }
            }
            if flip {
                plot.project = Some(Projection { coord: CoordKind::Flip });
            }

            let filtered_layers = layer_sql.iter().filter(|sql| sql.is_some()).count();
            let prepared = Prepared::new(
                plot,
                data,
                "SELECT * FROM t".to_string(),
                "VISUALISE x, y".to_string(),
                layer_sql,
                vec![None; layer_count],
                Vec::new(),
            );
            let json = VegaLiteWriter::new().render_json(&prepared).unwrap();
            let vl_spec: Value = serde_json::from_str(&json).unwrap();

            let layers = vl_spec["layer"].as_array().unwrap();
            prop_assert_eq!(layers.len(), layer_count);
            let global_rows = if filtered_layers < layer_count { rows.len() } else { 0 };
            let expected_rows = global_rows + filtered_layers * (rows.len() / 2);
            prop_assert_eq!(vl_spec["data"]["values"].as_array().unwrap().len(), expected_rows);
            for layer in layers {
                let x_field = if flip { "y" } else { "x" };
                prop_assert_eq!(&layer["encoding"]["x"]["field"], &json!(x_field));
            }
        }
    }

    proptest! {
        #[test]
        fn prop_one_layer_entry_per_draw(
            kinds in prop::collection::vec(0usize..crate::plot::GeomType::ALL.len(), 1..6)
        ) {
            let geoms: Vec<Geom> = kinds
                .iter()
                .map(|k| Geom::from_type(crate::plot::GeomType::ALL[*k]))
                .collect();
            let mut plot = Plot::new();
            for geom in &geoms {
                plot.layers.push(xy_layer(geom.clone()));
            }

            let chart = VegaLiteWriter::new()
                .render_chart(&prepared(plot, global(xy_frame())))
                .unwrap();
            let layers = chart.layers();
            prop_assert_eq!(layers.len(), geoms.len());
            for (layer, geom) in layers.iter().zip(&geoms) {
                let expected = encoding::geom_to_mark(&Layer::new(geom.clone()));
                prop_assert_eq!(&layer["mark"]["type"], &expected["type"]);
            }
        }
    }
}

//! Encoding channel and mark construction for the Vega-Lite writer

use crate::plot::{GeomType, Layer, Stat};
use crate::{naming, Aesthetic, AestheticValue, DataFrame, LabelKey, Labels};
use polars::prelude::DataType;
use serde_json::{json, Map, Value};

/// Infer Vega-Lite field type from DataFrame column
///
/// Numeric columns are quantitative, dates and times temporal, and
/// everything else (strings included) nominal.
pub(super) fn infer_field_type(df: &DataFrame, field: &str) -> &'static str {
    let Ok(column) = df.column(field) else {
        return "nominal";
    };
    match column.dtype() {
        DataType::Date | DataType::Datetime(_, _) | DataType::Time => "temporal",
        dt if dt.is_integer() || dt.is_float() => "quantitative",
        _ => "nominal",
    }
}

/// Map ggsql aesthetic name to Vega-Lite encoding channel name
///
/// Range aesthetics land on the primary and secondary position channels,
/// so a ribbon draws its band from `y` to `y2`.
pub(super) fn map_aesthetic_name(aesthetic: Aesthetic) -> &'static str {
    match aesthetic {
        Aesthetic::Linewidth => "strokeWidth",
        Aesthetic::Label => "text",
        Aesthetic::Xend => "x2",
        Aesthetic::Yend | Aesthetic::Ymax => "y2",
        Aesthetic::Ymin => "y",
        other => other.name(),
    }
}

/// Secondary channels share the scale of their primary and take no type
fn is_secondary_channel(channel: &str) -> bool {
    matches!(channel, "x2" | "y2")
}

/// Vega-Lite mark for a layer
pub(super) fn geom_to_mark(layer: &Layer) -> Value {
    let mark_type = match layer.geom.geom_type() {
        GeomType::Point => "point",
        GeomType::Line | GeomType::Path => "line",
        GeomType::Area | GeomType::Ribbon => "area",
        GeomType::Bar | GeomType::Histogram => "bar",
        GeomType::Tile => "rect",
        GeomType::Text => "text",
        GeomType::Segment | GeomType::ErrorBar => "rule",
        GeomType::Polygon => {
            return json!({
                "type": "line",
                "interpolate": "linear-closed",
                "filled": true,
                "clip": true
            })
        }
    };
    let mut mark = json!({
        "type": mark_type,
        "clip": true
    });
    if let Some(interpolate) = layer.parameters.get("interpolate").and_then(|v| v.as_str()) {
        mark["interpolate"] = json!(interpolate);
    }
    mark
}

/// Build the `encoding` object for one layer
///
/// Mapped aesthetics become field channels. SETTING literals for supported
/// aesthetics become value channels unless the aesthetic is also mapped.
pub(super) fn build_encoding(layer: &Layer, df: &DataFrame, labels: Option<&Labels>) -> Map<String, Value> {
    let mut encoding = Map::new();
    let binned = matches!(layer.stat, Some(Stat::Bin { .. }));

    for (aesthetic, value) in layer.aesthetics.iter() {
        let channel = map_aesthetic_name(aesthetic);
        let channel_encoding = match value {
            AestheticValue::Literal(lit) => json!({ "value": lit.to_json() }),
            AestheticValue::Column { name, .. } if is_secondary_channel(channel) => {
                json!({ "field": name })
            }
            AestheticValue::Column { name, .. } => {
                let mut field = json!({
                    "field": name,
                    "type": infer_field_type(df, name),
                });
                let title = labels
                    .and_then(|l| l.get(LabelKey::Aesthetic(aesthetic)))
                    .or_else(|| value.label_name());
                if let Some(title) = title {
                    field["title"] = json!(title);
                }
                if binned && aesthetic == Aesthetic::X {
                    field["type"] = json!("quantitative");
                    field["bin"] = json!({ "binned": true });
                }
                field
            }
        };
        encoding.insert(channel.to_string(), channel_encoding);
    }

    // Path and polygon connect rows in data order, not sorted by x
    if matches!(layer.geom.geom_type(), GeomType::Path | GeomType::Polygon) {
        encoding.insert("order".to_string(), json!({ "value": Value::Null }));
    }

    if binned && encoding.contains_key("x") {
        encoding.insert("x2".to_string(), json!({ "field": naming::STAT_BIN_END }));
    }

    let supported = layer.geom.aesthetics();
    for (param_name, param_value) in &layer.parameters {
        let Some(aesthetic) = Aesthetic::from_name(param_name) else {
            continue;
        };
        if !supported.is_supported(aesthetic) || layer.aesthetics.contains(aesthetic) {
            continue;
        }
        let channel = map_aesthetic_name(aesthetic);
        if !encoding.contains_key(channel) {
            encoding.insert(channel.to_string(), json!({ "value": param_value.to_json() }));
        }
    }

    encoding
}

/// Swap horizontal and vertical channels for a flipped projection
pub(super) fn flip_axes(encoding: &mut Map<String, Value>) {
    for (a, b) in [("x", "y"), ("x2", "y2")] {
        let first = encoding.remove(a);
        let second = encoding.remove(b);
        if let Some(value) = second {
            encoding.insert(a.to_string(), value);
        }
        if let Some(value) = first {
            encoding.insert(b.to_string(), value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plot::{Geom, MappingSource, ParameterValue};
    use polars::prelude::*;

    fn mapped(geom: Geom, mappings: &[(Aesthetic, &str)]) -> Layer {
        let mut layer = Layer::new(geom);
        for (aes, col) in mappings {
            layer.aesthetics.insert(
                *aes,
                AestheticValue::standard_column(*col),
                MappingSource::Explicit,
            );
        }
        layer
    }

    #[test]
    fn test_geom_to_mark_mapping() {
        let cases = [
            (Geom::point(), "point"),
            (Geom::line(), "line"),
            (Geom::area(), "area"),
            (Geom::bar(), "bar"),
            (Geom::histogram(), "bar"),
            (Geom::tile(), "rect"),
            (Geom::text(), "text"),
            (Geom::segment(), "rule"),
            (Geom::ribbon(), "area"),
            (Geom::path(), "line"),
            (Geom::polygon(), "line"),
            (Geom::errorbar(), "rule"),
        ];
        for (geom, expected) in cases {
            let mark = geom_to_mark(&Layer::new(geom));
            assert_eq!(mark["type"], expected);
            assert_eq!(mark["clip"], true);
        }
    }

    #[test]
    fn test_polygon_is_closed_filled_line() {
        let mark = geom_to_mark(&Layer::new(Geom::polygon()));
        assert_eq!(mark["interpolate"], "linear-closed");
        assert_eq!(mark["filled"], true);
    }

    #[test]
    fn test_path_keeps_data_order() {
        let layer = mapped(Geom::path(), &[(Aesthetic::X, "a"), (Aesthetic::Y, "b")]);
        let df = df! { "a" => &[2i64, 1], "b" => &[0i64, 1] }.unwrap();
        let encoding = build_encoding(&layer, &df, None);
        assert_eq!(encoding["order"], json!({ "value": null }));

        let line = mapped(Geom::line(), &[(Aesthetic::X, "a"), (Aesthetic::Y, "b")]);
        assert!(!build_encoding(&line, &df, None).contains_key("order"));
    }

    #[test]
    fn test_errorbar_spans_ymin_to_ymax() {
        let layer = mapped(
            Geom::errorbar(),
            &[(Aesthetic::X, "g"), (Aesthetic::Ymin, "lo"), (Aesthetic::Ymax, "hi")],
        );
        let df = df! { "g" => &["a"], "lo" => &[1.0f64], "hi" => &[2.0f64] }.unwrap();
        let encoding = build_encoding(&layer, &df, None);
        assert_eq!(encoding["y"]["field"], "lo");
        assert_eq!(encoding["y2"], json!({ "field": "hi" }));
    }

    #[test]
    fn test_flip_axes_swaps_primary_and_secondary() {
        let mut encoding = Map::new();
        encoding.insert("x".into(), json!({ "field": "a" }));
        encoding.insert("y".into(), json!({ "field": "lo" }));
        encoding.insert("y2".into(), json!({ "field": "hi" }));
        encoding.insert("color".into(), json!({ "value": "red" }));

        flip_axes(&mut encoding);
        assert_eq!(encoding["y"]["field"], "a");
        assert_eq!(encoding["x"]["field"], "lo");
        assert_eq!(encoding["x2"]["field"], "hi");
        assert!(!encoding.contains_key("y2"));
        assert_eq!(encoding["color"]["value"], "red");
    }

    #[test]
    fn test_interpolate_setting_goes_on_mark() {
        let layer = Layer::new(Geom::line())
            .with_parameter("interpolate", ParameterValue::String("step".into()));
        assert_eq!(geom_to_mark(&layer)["interpolate"], "step");
    }

    #[test]
    fn test_aesthetic_name_mapping() {
        assert_eq!(map_aesthetic_name(Aesthetic::X), "x");
        assert_eq!(map_aesthetic_name(Aesthetic::Color), "color");
        assert_eq!(map_aesthetic_name(Aesthetic::Linewidth), "strokeWidth");
        assert_eq!(map_aesthetic_name(Aesthetic::Label), "text");
        assert_eq!(map_aesthetic_name(Aesthetic::Xend), "x2");
        assert_eq!(map_aesthetic_name(Aesthetic::Ymax), "y2");
    }

    #[test]
    fn test_field_type_inference() {
        let df = df! {
            "i" => &[1i64, 2],
            "f" => &[1.0f64, 2.0],
            "s" => &["1", "2"],
            "b" => &[true, false],
        }
        .unwrap();
        assert_eq!(infer_field_type(&df, "i"), "quantitative");
        assert_eq!(infer_field_type(&df, "f"), "quantitative");
        assert_eq!(infer_field_type(&df, "s"), "nominal");
        assert_eq!(infer_field_type(&df, "b"), "nominal");
        assert_eq!(infer_field_type(&df, "missing"), "nominal");

        let d = Series::new("d".into(), &[19723i32])
            .cast(&DataType::Date)
            .unwrap();
        let dates = DataFrame::new(vec![Column::from(d)]).unwrap();
        assert_eq!(infer_field_type(&dates, "d"), "temporal");
    }

    #[test]
    fn test_segment_end_channels_have_no_type() {
        let layer = mapped(
            Geom::segment(),
            &[
                (Aesthetic::X, "x0"),
                (Aesthetic::Y, "y0"),
                (Aesthetic::Xend, "x1"),
                (Aesthetic::Yend, "y1"),
            ],
        );
        let df = df! {
            "x0" => &[0.0f64], "y0" => &[0.0f64], "x1" => &[1.0f64], "y1" => &[1.0f64],
        }
        .unwrap();

        let encoding = build_encoding(&layer, &df, None);
        assert_eq!(encoding["x2"], json!({"field": "x1"}));
        assert_eq!(encoding["y2"], json!({"field": "y1"}));
        assert_eq!(encoding["x"]["type"], "quantitative");
    }

    #[test]
    fn test_ribbon_band_channels() {
        let layer = mapped(
            Geom::ribbon(),
            &[(Aesthetic::X, "t"), (Aesthetic::Ymin, "lo"), (Aesthetic::Ymax, "hi")],
        );
        let df = df! { "t" => &[1i64], "lo" => &[0.5f64], "hi" => &[1.5f64] }.unwrap();

        let encoding = build_encoding(&layer, &df, None);
        assert_eq!(encoding["y"]["field"], "lo");
        assert_eq!(encoding["y2"]["field"], "hi");
    }

    #[test]
    fn test_aesthetic_label_overrides_title() {
        let layer = mapped(Geom::point(), &[(Aesthetic::X, "a"), (Aesthetic::Y, "b")]);
        let df = df! { "a" => &[1i64], "b" => &[2i64] }.unwrap();
        let mut labels = Labels::default();
        labels.insert(LabelKey::Aesthetic(Aesthetic::X), "Alpha");

        let encoding = build_encoding(&layer, &df, Some(&labels));
        assert_eq!(encoding["x"]["title"], "Alpha");
        assert_eq!(encoding["y"]["title"], "b");
    }

    #[test]
    fn test_setting_becomes_value_channel_unless_mapped() {
        let mut layer = mapped(
            Geom::point(),
            &[(Aesthetic::X, "a"), (Aesthetic::Y, "b"), (Aesthetic::Color, "g")],
        );
        layer
            .parameters
            .insert("color".into(), ParameterValue::String("red".into()));
        layer.parameters.insert("size".into(), ParameterValue::Number(4.0));
        let df = df! { "a" => &[1i64], "b" => &[2i64], "g" => &["k"] }.unwrap();

        let encoding = build_encoding(&layer, &df, None);
        assert_eq!(encoding["color"]["field"], "g");
        assert_eq!(encoding["size"], json!({"value": 4.0}));
    }

    #[test]
    fn test_literal_mapping_is_value_channel() {
        let mut layer = mapped(Geom::point(), &[(Aesthetic::X, "a"), (Aesthetic::Y, "b")]);
        layer.aesthetics.insert(
            Aesthetic::Color,
            AestheticValue::Literal(ParameterValue::String("red".into())),
            MappingSource::Explicit,
        );
        let df = df! { "a" => &[1i64], "b" => &[2i64] }.unwrap();

        let encoding = build_encoding(&layer, &df, None);
        assert_eq!(encoding["color"]["value"], "red");
    }

    #[test]
    fn test_binned_x_gets_end_channel() {
        let mut layer = Layer::new(Geom::histogram());
        layer.stat = Some(Stat::Bin { bins: 5 });
        layer.aesthetics.insert(
            Aesthetic::X,
            AestheticValue::column_with_original(naming::STAT_BIN, "v"),
            MappingSource::Stat,
        );
        layer.aesthetics.insert(
            Aesthetic::Y,
            AestheticValue::column_with_original(naming::STAT_COUNT, "count"),
            MappingSource::Stat,
        );
        let df = df! {
            naming::STAT_BIN => &[0.0f64],
            naming::STAT_BIN_END => &[1.0f64],
            naming::STAT_COUNT => &[3i64],
        }
        .unwrap();

        let encoding = build_encoding(&layer, &df, None);
        assert_eq!(encoding["x"]["bin"]["binned"], true);
        assert_eq!(encoding["x"]["title"], "v");
        assert_eq!(encoding["x2"]["field"], naming::STAT_BIN_END);
        assert_eq!(encoding["y"]["title"], "count");
    }
}

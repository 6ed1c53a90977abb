//! Typed top-level Vega-Lite document
//!
//! Layers and encodings stay as `serde_json::Value`; only the outer shape
//! that every chart shares is typed.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// A complete Vega-Lite v6 chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VegaLiteChart {
    #[serde(rename = "$schema")]
    pub schema: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<ChartTitle>,
    pub width: String,
    pub height: String,
    pub data: ChartData,
    /// Named datasets, used when the data is too large to inline
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datasets: Option<BTreeMap<String, Vec<Value>>>,
    /// One entry per DRAW clause; absent when faceted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layer: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facet: Option<Value>,
    /// Inner spec of a faceted chart
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spec: Option<FacetSpec>,
}

impl VegaLiteChart {
    /// The layer array, wherever faceting put it
    pub fn layers(&self) -> &[Value] {
        match (&self.layer, &self.spec) {
            (Some(layers), _) => layers.as_slice(),
            (None, Some(spec)) => spec.layer.as_slice(),
            (None, None) => &[],
        }
    }

    pub fn is_faceted(&self) -> bool {
        self.facet.is_some()
    }
}

/// Chart title, a bare string unless there is a subtitle
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ChartTitle {
    Text(String),
    WithSubtitle { text: String, subtitle: String },
}

impl ChartTitle {
    pub fn from_parts(title: Option<&str>, subtitle: Option<&str>) -> Option<Self> {
        match (title, subtitle) {
            (None, None) => None,
            (Some(text), None) => Some(ChartTitle::Text(text.to_string())),
            (text, Some(subtitle)) => Some(ChartTitle::WithSubtitle {
                text: text.unwrap_or_default().to_string(),
                subtitle: subtitle.to_string(),
            }),
        }
    }
}

/// Top-level data: inline rows or a reference into `datasets`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ChartData {
    Values { values: Vec<Value> },
    Named { name: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FacetSpec {
    pub layer: Vec<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_title_shapes() {
        assert_eq!(ChartTitle::from_parts(None, None), None);
        assert_eq!(
            serde_json::to_value(ChartTitle::from_parts(Some("A"), None)).unwrap(),
            json!("A")
        );
        assert_eq!(
            serde_json::to_value(ChartTitle::from_parts(None, Some("B"))).unwrap(),
            json!({"text": "", "subtitle": "B"})
        );
    }

    #[test]
    fn test_optional_fields_are_omitted() {
        let chart = VegaLiteChart {
            schema: "s".to_string(),
            title: None,
            width: "container".to_string(),
            height: "container".to_string(),
            data: ChartData::Named {
                name: "d".to_string(),
            },
            datasets: None,
            layer: Some(vec![json!({"mark": "point"})]),
            facet: None,
            spec: None,
        };
        let value = serde_json::to_value(&chart).unwrap();
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), 5);
        assert_eq!(value["data"], json!({"name": "d"}));
        assert_eq!(chart.layers().len(), 1);
        assert!(!chart.is_faceted());
    }
}

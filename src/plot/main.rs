//! Plot types for ggsql specification
//!
//! ```text
//! Plot
//! ├─ source: Option<String>           (VISUALISE FROM table reference)
//! ├─ global_mappings: Vec<MappingItem> (top-level VISUALISE list)
//! ├─ layers: Vec<Layer>               (1+, one per DRAW clause)
//! ├─ facet: Option<Facet>             (FACET clause)
//! ├─ project: Option<Projection>      (PROJECT clause)
//! └─ labels: Option<Labels>           (merged LABEL clauses)
//! ```

use super::aesthetic::Aesthetic;
use super::facet::Facet;
use super::layer::Layer;
use super::projection::Projection;
use super::types::MappingItem;
use serde::Serialize;

/// Complete ggsql visualization specification
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct Plot {
    /// Table reference from VISUALISE FROM, as written
    pub source: Option<String>,
    /// Global aesthetic mappings (from VISUALISE clause)
    pub global_mappings: Vec<MappingItem>,
    /// Visual layers (one per DRAW clause)
    pub layers: Vec<Layer>,
    /// Faceting specification (from FACET clause)
    pub facet: Option<Facet>,
    /// Coordinate system (from PROJECT clause)
    pub project: Option<Projection>,
    /// Text labels (merged from all LABEL clauses)
    pub labels: Option<Labels>,
}

impl Plot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// True when the top-level list contains `*`
    pub fn has_global_wildcard(&self) -> bool {
        self.global_mappings.iter().any(|m| m.is_wildcard())
    }
}

/// Target of a LABEL entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelKey {
    Title,
    Subtitle,
    Aesthetic(Aesthetic),
}

impl LabelKey {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "title" => Some(LabelKey::Title),
            "subtitle" => Some(LabelKey::Subtitle),
            other => Aesthetic::from_name(other).map(LabelKey::Aesthetic),
        }
    }
}

impl std::fmt::Display for LabelKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LabelKey::Title => write!(f, "title"),
            LabelKey::Subtitle => write!(f, "subtitle"),
            LabelKey::Aesthetic(aes) => write!(f, "{}", aes),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Label {
    pub key: LabelKey,
    pub text: String,
}

/// Text labels (from LABEL clauses), keys unique, in clause order
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct Labels {
    pub labels: Vec<Label>,
}

impl Labels {
    /// Add a label; returns false if the key is already present
    pub fn insert(&mut self, key: LabelKey, text: impl Into<String>) -> bool {
        if self.get(key).is_some() {
            return false;
        }
        self.labels.push(Label {
            key,
            text: text.into(),
        });
        true
    }

    pub fn get(&self, key: LabelKey) -> Option<&str> {
        self.labels
            .iter()
            .find(|l| l.key == key)
            .map(|l| l.text.as_str())
    }

    pub fn title(&self) -> Option<&str> {
        self.get(LabelKey::Title)
    }

    pub fn subtitle(&self) -> Option<&str> {
        self.get(LabelKey::Subtitle)
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

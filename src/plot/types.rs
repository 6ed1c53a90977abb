//! Value types shared by the parser, validator, executor and writers

use super::aesthetic::Aesthetic;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// Parsed Mapping Types
// =============================================================================

/// One entry of a mapping list, as written in the query
///
/// Used for both the top-level list after `VISUALISE` and a layer's
/// `MAPPING` list. Resolution into [`Mappings`] happens in the validator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MappingItem {
    /// `*` - map every column whose name is a supported aesthetic
    Wildcard,
    /// `col` or `col AS aes`
    ///
    /// `aesthetic` is `None` for a bare name that is not an aesthetic.
    Column {
        name: String,
        aesthetic: Option<Aesthetic>,
        /// Byte offset of the column reference in the visual text
        offset: usize,
    },
    /// `'red' AS color`, `3 AS size`
    Literal {
        value: ParameterValue,
        aesthetic: Aesthetic,
    },
}

impl MappingItem {
    /// Bare `name`, implicitly mapped to the aesthetic of the same name
    pub fn implicit(name: impl Into<String>) -> Self {
        let name = name.into();
        let aesthetic = Aesthetic::from_name(&name);
        Self::Column {
            name,
            aesthetic,
            offset: 0,
        }
    }

    /// `name AS aesthetic`
    pub fn column(name: impl Into<String>, aesthetic: Aesthetic) -> Self {
        Self::Column {
            name: name.into(),
            aesthetic: Some(aesthetic),
            offset: 0,
        }
    }

    /// The aesthetic this item targets, if any
    pub fn aesthetic(&self) -> Option<Aesthetic> {
        match self {
            MappingItem::Wildcard => None,
            MappingItem::Column { aesthetic, .. } => *aesthetic,
            MappingItem::Literal { aesthetic, .. } => Some(*aesthetic),
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, MappingItem::Wildcard)
    }
}

// =============================================================================
// Resolved Mapping Types
// =============================================================================

/// Where a resolved mapping came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MappingSource {
    /// The layer's own MAPPING clause
    Explicit,
    /// Expanded from `*` against the result schema
    Wildcard,
    /// Inherited from the top-level VISUALISE list
    Inherited,
    /// Rewritten to a stat-computed column by the executor
    Stat,
}

/// A resolved aesthetic mapping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mapping {
    pub value: AestheticValue,
    pub source: MappingSource,
}

/// Resolved aesthetic mappings of a layer
///
/// Keyed by aesthetic, iterated in canonical aesthetic order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Mappings {
    pub aesthetics: BTreeMap<Aesthetic, Mapping>,
}

impl Mappings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an aesthetic mapping, replacing any existing one
    pub fn insert(&mut self, aesthetic: Aesthetic, value: AestheticValue, source: MappingSource) {
        self.aesthetics.insert(aesthetic, Mapping { value, source });
    }

    pub fn get(&self, aesthetic: Aesthetic) -> Option<&AestheticValue> {
        self.aesthetics.get(&aesthetic).map(|m| &m.value)
    }

    pub fn source(&self, aesthetic: Aesthetic) -> Option<MappingSource> {
        self.aesthetics.get(&aesthetic).map(|m| m.source)
    }

    pub fn contains(&self, aesthetic: Aesthetic) -> bool {
        self.aesthetics.contains_key(&aesthetic)
    }

    pub fn remove(&mut self, aesthetic: Aesthetic) -> Option<Mapping> {
        self.aesthetics.remove(&aesthetic)
    }

    pub fn is_empty(&self) -> bool {
        self.aesthetics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.aesthetics.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Aesthetic, &AestheticValue)> {
        self.aesthetics.iter().map(|(aes, m)| (*aes, &m.value))
    }

    /// Column name mapped to `aesthetic`, if it is a column mapping
    pub fn column(&self, aesthetic: Aesthetic) -> Option<&str> {
        self.get(aesthetic).and_then(|v| v.column_name())
    }

    /// Distinct column names referenced, in aesthetic order
    pub fn columns(&self) -> Vec<&str> {
        let mut cols: Vec<&str> = Vec::new();
        for (_, value) in self.iter() {
            if let Some(name) = value.column_name() {
                if !cols.contains(&name) {
                    cols.push(name);
                }
            }
        }
        cols
    }
}

// =============================================================================
// Value Types (used in mappings/settings)
// =============================================================================

/// Value for aesthetic mappings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AestheticValue {
    /// Column reference
    Column {
        name: String,
        /// Name to show in axis and legend titles when `name` is a
        /// stat-computed column
        original_name: Option<String>,
    },
    /// Literal value (quoted string, number, or boolean)
    Literal(ParameterValue),
}

impl AestheticValue {
    pub fn standard_column(name: impl Into<String>) -> Self {
        Self::Column {
            name: name.into(),
            original_name: None,
        }
    }

    /// Column mapping whose title differs from the column name
    pub fn column_with_original(name: impl Into<String>, original_name: impl Into<String>) -> Self {
        Self::Column {
            name: name.into(),
            original_name: Some(original_name.into()),
        }
    }

    pub fn column_name(&self) -> Option<&str> {
        match self {
            Self::Column { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Name used for axis and legend titles
    pub fn label_name(&self) -> Option<&str> {
        match self {
            Self::Column {
                name,
                original_name,
            } => Some(original_name.as_deref().unwrap_or(name)),
            _ => None,
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Self::Literal(_))
    }
}

impl std::fmt::Display for AestheticValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AestheticValue::Column { name, .. } => write!(f, "{}", name),
            AestheticValue::Literal(lit) => write!(f, "{}", lit),
        }
    }
}

/// Value for layer parameters (also used for literals)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParameterValue {
    String(String),
    Number(f64),
    Boolean(bool),
}

impl std::fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParameterValue::String(s) => write!(f, "'{}'", s),
            ParameterValue::Number(n) => write!(f, "{}", n),
            ParameterValue::Boolean(b) => write!(f, "{}", b),
        }
    }
}

impl ParameterValue {
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            ParameterValue::String(s) => serde_json::Value::String(s.clone()),
            ParameterValue::Number(n) => serde_json::json!(n),
            ParameterValue::Boolean(b) => serde_json::Value::Bool(*b),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParameterValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            ParameterValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

use serde::Serialize;

/// Faceting specification (from FACET clause)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Facet {
    /// FACET [WRAP] column
    Wrap { column: String },
    /// FACET GRID row [BY column], or FACET row BY column
    Grid { row: String, column: Option<String> },
}

impl Facet {
    /// All columns used for faceting, in clause order
    pub fn columns(&self) -> Vec<&str> {
        match self {
            Facet::Wrap { column } => vec![column.as_str()],
            Facet::Grid { row, column } => {
                let mut cols = vec![row.as_str()];
                if let Some(column) = column {
                    cols.push(column.as_str());
                }
                cols
            }
        }
    }
}

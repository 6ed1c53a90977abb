//! Statistical transforms applied to a layer's data before rendering

use serde::Serialize;

/// Per-layer SQL transform producing derived columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stat {
    /// Row count per distinct x (and grouping columns)
    Count,
    /// Equal-width bins over x with a row count per bin
    Bin { bins: usize },
}

impl Stat {
    pub const DEFAULT_BINS: usize = 30;

    pub fn name(&self) -> &'static str {
        match self {
            Stat::Count => "count",
            Stat::Bin { .. } => "bin",
        }
    }
}

impl std::fmt::Display for Stat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stat::Count => write!(f, "count"),
            Stat::Bin { bins } => write!(f, "bin({})", bins),
        }
    }
}

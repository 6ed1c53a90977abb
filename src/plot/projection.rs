//! Projection types for ggsql visualization specifications
//!
//! A PROJECT clause picks the coordinate system. Only `cartesian` (the
//! default) and `flip`, which swaps the horizontal and vertical axes, exist.

use serde::Serialize;

/// Coordinate system named in a PROJECT clause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CoordKind {
    Cartesian,
    Flip,
}

impl CoordKind {
    pub const ALL: [CoordKind; 2] = [CoordKind::Cartesian, CoordKind::Flip];

    pub fn name(self) -> &'static str {
        match self {
            CoordKind::Cartesian => "cartesian",
            CoordKind::Flip => "flip",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        Self::ALL.iter().copied().find(|c| c.name() == lower)
    }

    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|c| c.name()).collect()
    }
}

impl std::fmt::Display for CoordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Projection (from PROJECT clause)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Projection {
    pub coord: CoordKind,
}

impl Projection {
    /// True when x and y trade places on screen
    pub fn is_flipped(&self) -> bool {
        self.coord == CoordKind::Flip
    }
}

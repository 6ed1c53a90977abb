//! Aesthetic names
//!
//! Aesthetics are the visual channels a column or literal can be mapped to.
//! The set is closed: anything not listed here is rejected by the parser
//! after `AS` and by the validator for bare column names.
//!
//! # Positional vs Legend Aesthetics
//!
//! - **Positional**: `x`, `y` and their variants (`xend`, `yend`, `ymin`, `ymax`)
//! - **Legend**: `color`, `fill`, `stroke`, `size`, `shape`, `opacity`,
//!   `linewidth` and the text channel `label`

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aesthetic {
    X,
    Y,
    Xend,
    Yend,
    Ymin,
    Ymax,
    Color,
    Fill,
    Stroke,
    Size,
    Shape,
    Opacity,
    Linewidth,
    Label,
}

impl Aesthetic {
    /// All aesthetics in canonical order
    pub const ALL: [Aesthetic; 14] = [
        Aesthetic::X,
        Aesthetic::Y,
        Aesthetic::Xend,
        Aesthetic::Yend,
        Aesthetic::Ymin,
        Aesthetic::Ymax,
        Aesthetic::Color,
        Aesthetic::Fill,
        Aesthetic::Stroke,
        Aesthetic::Size,
        Aesthetic::Shape,
        Aesthetic::Opacity,
        Aesthetic::Linewidth,
        Aesthetic::Label,
    ];

    /// Canonical lowercase name
    pub fn name(self) -> &'static str {
        match self {
            Aesthetic::X => "x",
            Aesthetic::Y => "y",
            Aesthetic::Xend => "xend",
            Aesthetic::Yend => "yend",
            Aesthetic::Ymin => "ymin",
            Aesthetic::Ymax => "ymax",
            Aesthetic::Color => "color",
            Aesthetic::Fill => "fill",
            Aesthetic::Stroke => "stroke",
            Aesthetic::Size => "size",
            Aesthetic::Shape => "shape",
            Aesthetic::Opacity => "opacity",
            Aesthetic::Linewidth => "linewidth",
            Aesthetic::Label => "label",
        }
    }

    /// Look up an aesthetic by name, case-insensitively. `colour` is accepted
    /// as an alias for `color`.
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        if lower == "colour" {
            return Some(Aesthetic::Color);
        }
        Self::ALL.iter().copied().find(|aes| aes.name() == lower)
    }

    /// True for `x`, `y` and their variants
    pub fn is_positional(self) -> bool {
        matches!(
            self,
            Aesthetic::X
                | Aesthetic::Y
                | Aesthetic::Xend
                | Aesthetic::Yend
                | Aesthetic::Ymin
                | Aesthetic::Ymax
        )
    }

    /// The primary positional aesthetic this one belongs to (`xend` -> `x`).
    /// Non-positional aesthetics are their own family.
    pub fn family(self) -> Aesthetic {
        match self {
            Aesthetic::Xend => Aesthetic::X,
            Aesthetic::Yend | Aesthetic::Ymin | Aesthetic::Ymax => Aesthetic::Y,
            other => other,
        }
    }
}

impl fmt::Display for Aesthetic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Aesthetic {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Aesthetic::from_name(s).ok_or_else(|| format!("Unknown aesthetic '{}'", s))
    }
}

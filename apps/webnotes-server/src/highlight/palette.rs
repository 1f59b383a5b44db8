//! Highlight palette

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The fixed set of highlight colors
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    #[default]
    Yellow,
    Green,
    Blue,
    Pink,
    Orange,
}

impl Color {
    pub const ALL: [Color; 5] = [
        Color::Yellow,
        Color::Green,
        Color::Blue,
        Color::Pink,
        Color::Orange,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Color::Yellow => "yellow",
            Color::Green => "green",
            Color::Blue => "blue",
            Color::Pink => "pink",
            Color::Orange => "orange",
        }
    }

    /// Background used for markers in the page
    pub fn marker_hex(&self) -> &'static str {
        match self {
            Color::Yellow => "#ffeb3b",
            Color::Green => "#4caf50",
            Color::Blue => "#2196f3",
            Color::Pink => "#e91e63",
            Color::Orange => "#ff9800",
        }
    }

    /// Lighter tint used when listing annotations
    pub fn tint_hex(&self) -> &'static str {
        match self {
            Color::Yellow => "#fff9c4",
            Color::Green => "#c8e6c9",
            Color::Blue => "#bbdefb",
            Color::Pink => "#f8bbd9",
            Color::Orange => "#ffe0b2",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown highlight color: {0}")]
pub struct UnknownColor(pub String);

impl FromStr for Color {
    type Err = UnknownColor;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Color::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| UnknownColor(value.to_string()))
    }
}

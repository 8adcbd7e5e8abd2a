//! Season and crop classification.
//!
//! Both enums serialize to the Khmer labels the original data was recorded
//! with, so previously stored aggregates read back unchanged. The symbolic
//! names are accepted as aliases.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Growing season.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Season {
    #[serde(rename = "រដូវវស្សា", alias = "WET")]
    Wet,
    #[serde(rename = "រដូវប្រាំង", alias = "DRY")]
    Dry,
}

impl Season {
    pub const ALL: [Season; 2] = [Season::Wet, Season::Dry];

    /// The stored label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Wet => "រដូវវស្សា",
            Self::Dry => "រដូវប្រាំង",
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            Self::Wet => "WET",
            Self::Dry => "DRY",
        }
    }
}

/// Crop category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CropType {
    #[serde(rename = "សាកវប្បកម្ម", alias = "HORTICULTURE")]
    Horticulture,
    #[serde(rename = "ឧស្សាហកម្ម", alias = "INDUSTRIAL")]
    Industrial,
    #[serde(rename = "ស្រូវ", alias = "RICE")]
    Rice,
}

impl CropType {
    pub const ALL: [CropType; 3] = [CropType::Horticulture, CropType::Industrial, CropType::Rice];

    /// The stored label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Horticulture => "សាកវប្បកម្ម",
            Self::Industrial => "ឧស្សាហកម្ម",
            Self::Rice => "ស្រូវ",
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            Self::Horticulture => "HORTICULTURE",
            Self::Industrial => "INDUSTRIAL",
            Self::Rice => "RICE",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for CropType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Accepts either the stored label or the symbolic name (case-insensitive).
impl FromStr for Season {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|v| v.label() == s || v.symbol().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown season: {s}"))
    }
}

/// Accepts either the stored label or the symbolic name (case-insensitive).
impl FromStr for CropType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|v| v.label() == s || v.symbol().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown crop type: {s}"))
    }
}

//! Vector-graphic fragments pulled from a page.
//!
//! Every fragment found on a page becomes an artifact; only the wanted ones
//! are written to disk.

use serde::{Deserialize, Serialize};

/// One classified vector-graphic fragment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    /// Serialized markup as found in the live DOM
    pub raw_markup: String,

    /// Whether the classifier judged this a diagram worth keeping
    pub is_wanted: bool,
}

impl Artifact {
    /// Create a new artifact
    pub fn new(raw_markup: String, is_wanted: bool) -> Self {
        Self {
            raw_markup,
            is_wanted,
        }
    }

    /// Size of the serialized markup in characters
    pub fn size(&self) -> usize {
        self.raw_markup.chars().count()
    }
}

/// How fragments on a page are turned into artifacts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMode {
    /// Classify every fragment independently by size and structure
    Structural,

    /// Keep only the largest fragment, and only past a size threshold
    Largest,
}

impl Default for ExtractionMode {
    fn default() -> Self {
        Self::Structural
    }
}

impl std::fmt::Display for ExtractionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractionMode::Structural => write!(f, "structural"),
            ExtractionMode::Largest => write!(f, "largest"),
        }
    }
}

impl std::str::FromStr for ExtractionMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "structural" | "heuristic" => Ok(ExtractionMode::Structural),
            "largest" | "size" => Ok(ExtractionMode::Largest),
            _ => anyhow::bail!("Unknown extraction mode: {}", s),
        }
    }
}

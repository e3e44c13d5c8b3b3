use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// The four fixed STEM labels scored by the assessment.
///
/// Declaration order is significant: it is the tie-break order when ranking
/// scores (Science > Technology > Engineering > Mathematics).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StemCategory {
    Science,
    Technology,
    Engineering,
    Mathematics,
}

impl StemCategory {
    pub const ALL: [StemCategory; 4] = [
        StemCategory::Science,
        StemCategory::Technology,
        StemCategory::Engineering,
        StemCategory::Mathematics,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StemCategory::Science => "Science",
            StemCategory::Technology => "Technology",
            StemCategory::Engineering => "Engineering",
            StemCategory::Mathematics => "Mathematics",
        }
    }
}

impl fmt::Display for StemCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StemCategory {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "science" | "s" => Ok(StemCategory::Science),
            "technology" | "t" => Ok(StemCategory::Technology),
            "engineering" | "e" => Ok(StemCategory::Engineering),
            "mathematics" | "math" | "maths" | "m" => Ok(StemCategory::Mathematics),
            _ => Err(ValidationError::UnknownCategory(s.to_string())),
        }
    }
}

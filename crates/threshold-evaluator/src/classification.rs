//! Device classification

use serde::{Deserialize, Serialize};
use std::fmt;

/// Current heat classification of a device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Classification {
    #[default]
    Safe,
    Warning,
    Critical,
    /// No reading within the silence timeout. A liveness signal, not a
    /// temperature one, so it has no severity.
    Unknown,
}

impl Classification {
    /// Severity rank for temperature states, `None` for `Unknown`
    pub fn severity(self) -> Option<u8> {
        match self {
            Self::Safe => Some(0),
            Self::Warning => Some(1),
            Self::Critical => Some(2),
            Self::Unknown => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Safe => "SAFE",
            Self::Warning => "WARNING",
            Self::Critical => "CRITICAL",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

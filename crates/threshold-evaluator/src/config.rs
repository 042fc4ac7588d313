//! Threshold configuration

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Classification limits (°C) and silence timeout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Enter WARNING at or above this temperature
    pub warn_threshold: f64,

    /// Enter CRITICAL at or above this temperature
    pub crit_threshold: f64,

    /// Downgrade only once the temperature is this far below a threshold
    pub hysteresis_margin: f64,

    /// Time since the last accepted reading before a device is UNKNOWN (seconds)
    pub silence_timeout_secs: u64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            warn_threshold: 80.0,
            crit_threshold: 100.0,
            hysteresis_margin: 5.0,
            silence_timeout_secs: 30,
        }
    }
}

impl Thresholds {
    pub fn silence_timeout(&self) -> Duration {
        Duration::seconds(self.silence_timeout_secs as i64)
    }

    /// Temperature below which WARNING may be left
    pub fn warn_release(&self) -> f64 {
        self.warn_threshold - self.hysteresis_margin
    }

    /// Temperature below which CRITICAL may be left
    pub fn crit_release(&self) -> f64 {
        self.crit_threshold - self.hysteresis_margin
    }
}

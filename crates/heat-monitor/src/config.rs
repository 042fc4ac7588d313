//! Monitor configuration

use chrono::Duration;
use reading_ingestor::ValidationConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration as StdDuration;
use thiserror::Error;
use threshold_evaluator::Thresholds;

/// Configuration errors, fatal at startup
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Invalid threshold: {0}")]
    InvalidThreshold(String),

    #[error("Invalid window: {0}")]
    InvalidWindow(String),

    #[error("Invalid temperature range: [{min}, {max}]")]
    InvalidRange { min: f64, max: f64 },
}

/// Pipeline configuration. Every field has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Sliding window duration (seconds)
    pub window_secs: u64,

    /// WARNING threshold (°C)
    pub warn_threshold: f64,

    /// CRITICAL threshold (°C)
    pub crit_threshold: f64,

    /// Hysteresis margin (°C)
    pub hysteresis_margin: f64,

    /// Silence timeout before UNKNOWN (seconds)
    pub silence_timeout_secs: u64,

    /// Plausible physical range (°C)
    pub min_temperature: f64,
    pub max_temperature: f64,

    /// How far a sensor timestamp may run ahead of receipt time (seconds)
    pub max_clock_skew_secs: u64,

    /// Number of independently locked device shards
    pub shards: usize,

    /// Period of the background silence check (milliseconds)
    pub silence_check_interval_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            window_secs: 60,
            warn_threshold: 80.0,
            crit_threshold: 100.0,
            hysteresis_margin: 5.0,
            silence_timeout_secs: 30,
            min_temperature: -50.0,
            max_temperature: 1000.0,
            max_clock_skew_secs: 5,
            shards: 16,
            silence_check_interval_ms: 1000,
        }
    }
}

impl MonitorConfig {
    /// Check the configuration before the monitor starts
    pub fn validate(&self) -> Result<(), ConfigError> {
        let values = [
            ("warn_threshold", self.warn_threshold),
            ("crit_threshold", self.crit_threshold),
            ("hysteresis_margin", self.hysteresis_margin),
        ];
        if let Some((name, value)) = values.iter().find(|(_, v)| !v.is_finite()) {
            return Err(ConfigError::InvalidThreshold(format!("{name} is not finite ({value})")));
        }
        if self.crit_threshold <= self.warn_threshold {
            return Err(ConfigError::InvalidThreshold(format!(
                "crit_threshold {} must be above warn_threshold {}",
                self.crit_threshold, self.warn_threshold
            )));
        }
        if self.hysteresis_margin < 0.0 {
            return Err(ConfigError::InvalidThreshold(format!(
                "hysteresis_margin {} must not be negative",
                self.hysteresis_margin
            )));
        }
        if self.window_secs == 0 || self.window_secs > i64::MAX as u64 / 1000 {
            return Err(ConfigError::InvalidWindow(format!(
                "window_secs {} out of bounds",
                self.window_secs
            )));
        }
        if self.silence_timeout_secs > i64::MAX as u64 / 1000 {
            return Err(ConfigError::InvalidWindow(format!(
                "silence_timeout_secs {} out of bounds",
                self.silence_timeout_secs
            )));
        }
        if !(self.min_temperature < self.max_temperature) {
            return Err(ConfigError::InvalidRange {
                min: self.min_temperature,
                max: self.max_temperature,
            });
        }
        Ok(())
    }

    pub fn window(&self) -> Duration {
        Duration::seconds(self.window_secs as i64)
    }

    pub fn silence_check_interval(&self) -> StdDuration {
        StdDuration::from_millis(self.silence_check_interval_ms.max(1))
    }

    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            warn_threshold: self.warn_threshold,
            crit_threshold: self.crit_threshold,
            hysteresis_margin: self.hysteresis_margin,
            silence_timeout_secs: self.silence_timeout_secs,
        }
    }

    pub fn validation(&self) -> ValidationConfig {
        ValidationConfig {
            temperature_range: (self.min_temperature, self.max_temperature),
            max_clock_skew_secs: self.max_clock_skew_secs,
        }
    }
}

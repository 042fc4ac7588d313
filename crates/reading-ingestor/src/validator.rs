//! Range and identity checks for raw samples

use crate::error::IngestError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Validation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Plausible physical temperature range (°C), inclusive
    pub temperature_range: (f64, f64),
    /// How far a sensor timestamp may run ahead of receipt time (seconds)
    pub max_clock_skew_secs: u64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            temperature_range: (-50.0, 1000.0),
            max_clock_skew_secs: 5,
        }
    }
}

/// Stateless validator for raw samples
#[derive(Debug, Clone)]
pub struct Validator {
    config: ValidationConfig,
}

impl Validator {
    /// Create a new validator with given config
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Validate a temperature. NaN and infinities are out of range.
    pub fn validate_temperature(&self, value: f64) -> Result<(), IngestError> {
        let (min, max) = self.config.temperature_range;
        if !value.is_finite() || value < min || value > max {
            Err(IngestError::OutOfRange { value, min, max })
        } else {
            Ok(())
        }
    }

    /// Reject a sensor timestamp too far ahead of the time it was received
    pub fn validate_timestamp(
        &self,
        observed_at: DateTime<Utc>,
        received_at: DateTime<Utc>,
    ) -> Result<(), IngestError> {
        let max_skew_secs = self.config.max_clock_skew_secs;
        let limit = i64::try_from(max_skew_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|skew| received_at.checked_add_signed(skew));
        match limit {
            Some(limit) if observed_at > limit => Err(IngestError::FutureTimestamp {
                observed_at,
                received_at,
                max_skew_secs,
            }),
            _ => Ok(()),
        }
    }

    /// Validate a device identifier
    pub fn validate_device_id(&self, device_id: &str) -> Result<(), IngestError> {
        if device_id.trim().is_empty() {
            Err(IngestError::InvalidDevice(device_id.to_string()))
        } else {
            Ok(())
        }
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(ValidationConfig::default())
    }
}

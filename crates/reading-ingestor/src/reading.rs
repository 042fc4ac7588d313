//! Reading types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sample as received from a transport, before validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawReading {
    pub device_id: String,
    /// Degrees Celsius
    pub temperature: f64,
    /// Sensor-side timestamp; stamped with receipt time when absent
    #[serde(default)]
    pub observed_at: Option<DateTime<Utc>>,
}

impl RawReading {
    /// Create a raw reading carrying its own timestamp
    pub fn new(device_id: impl Into<String>, temperature: f64, observed_at: DateTime<Utc>) -> Self {
        Self {
            device_id: device_id.into(),
            temperature,
            observed_at: Some(observed_at),
        }
    }
}

/// Accepted reading. Only the [`Ingestor`](crate::Ingestor) creates these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    device_id: String,
    temperature: f64,
    observed_at: DateTime<Utc>,
    /// Local receipt time; liveness is measured from here, not the sensor clock
    accepted_at: DateTime<Utc>,
}

impl Reading {
    pub(crate) fn new(
        device_id: String,
        temperature: f64,
        observed_at: DateTime<Utc>,
        accepted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            device_id,
            temperature,
            observed_at,
            accepted_at,
        }
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn observed_at(&self) -> DateTime<Utc> {
        self.observed_at
    }

    pub fn accepted_at(&self) -> DateTime<Utc> {
        self.accepted_at
    }
}

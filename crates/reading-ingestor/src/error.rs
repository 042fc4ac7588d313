//! Ingestion Error Types

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors returned for a rejected sample
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IngestError {
    /// Temperature is not finite or outside the plausible physical range
    #[error("temperature {value} is out of range [{min}, {max}]")]
    OutOfRange { value: f64, min: f64, max: f64 },

    /// Sample is older than the last accepted reading for the device
    #[error("reading for {device_id} at {observed_at} is older than last accepted {last_accepted}")]
    OutOfOrder {
        device_id: String,
        observed_at: DateTime<Utc>,
        last_accepted: DateTime<Utc>,
    },

    /// Sample claims to be from further in the future than clock skew allows
    #[error("reading at {observed_at} is ahead of receipt time {received_at} by more than {max_skew_secs}s")]
    FutureTimestamp {
        observed_at: DateTime<Utc>,
        received_at: DateTime<Utc>,
        max_skew_secs: u64,
    },

    /// Device identifier is missing or blank
    #[error("invalid device id: {0:?}")]
    InvalidDevice(String),
}

impl IngestError {
    /// Short machine-readable reason, used as a metric label and in API bodies
    pub fn kind(&self) -> &'static str {
        match self {
            Self::OutOfRange { .. } => "out_of_range",
            Self::OutOfOrder { .. } => "out_of_order",
            Self::FutureTimestamp { .. } => "future_timestamp",
            Self::InvalidDevice(_) => "invalid_device",
        }
    }
}

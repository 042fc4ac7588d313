//! Reading Ingestor

use crate::error::IngestError;
use crate::reading::{RawReading, Reading};
use crate::validator::{ValidationConfig, Validator};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Destination for accepted readings
pub trait ReadingSink {
    fn record(&mut self, reading: Reading);
}

impl ReadingSink for Vec<Reading> {
    fn record(&mut self, reading: Reading) {
        self.push(reading);
    }
}

/// Validates raw samples and forwards accepted readings to a sink.
///
/// Keeps the last accepted timestamp per device so that stale samples are
/// dropped instead of reordered.
pub struct Ingestor {
    validator: Validator,
    last_accepted: HashMap<String, DateTime<Utc>>,
}

impl Ingestor {
    /// Create a new ingestor
    pub fn new(config: ValidationConfig) -> Self {
        info!("Creating ingestor with config: {:?}", config);
        Self {
            validator: Validator::new(config),
            last_accepted: HashMap::new(),
        }
    }

    /// Ingest a sample, stamping it with the current time if needed
    pub fn ingest<S: ReadingSink + ?Sized>(
        &mut self,
        raw: RawReading,
        sink: &mut S,
    ) -> Result<Reading, IngestError> {
        self.ingest_at(raw, Utc::now(), sink)
    }

    /// Ingest a sample received at `received_at`.
    ///
    /// On success the reading is forwarded to `sink` and returned. On failure
    /// neither the watermark nor the sink is touched.
    pub fn ingest_at<S: ReadingSink + ?Sized>(
        &mut self,
        raw: RawReading,
        received_at: DateTime<Utc>,
        sink: &mut S,
    ) -> Result<Reading, IngestError> {
        let reading = self.accept(raw, received_at).inspect_err(|e| {
            warn!(reason = e.kind(), "Reading rejected: {}", e);
        })?;
        debug!(
            device_id = reading.device_id(),
            temperature = reading.temperature(),
            "Reading accepted"
        );
        sink.record(reading.clone());
        Ok(reading)
    }

    fn accept(&mut self, raw: RawReading, received_at: DateTime<Utc>) -> Result<Reading, IngestError> {
        self.validator.validate_device_id(&raw.device_id)?;
        self.validator.validate_temperature(raw.temperature)?;

        let observed_at = raw.observed_at.unwrap_or(received_at);
        self.validator.validate_timestamp(observed_at, received_at)?;
        if let Some(&last) = self.last_accepted.get(&raw.device_id) {
            if observed_at < last {
                return Err(IngestError::OutOfOrder {
                    device_id: raw.device_id,
                    observed_at,
                    last_accepted: last,
                });
            }
        }

        self.last_accepted.insert(raw.device_id.clone(), observed_at);
        Ok(Reading::new(raw.device_id, raw.temperature, observed_at, received_at))
    }

    /// Timestamp of the last accepted reading for a device
    pub fn last_accepted(&self, device_id: &str) -> Option<DateTime<Utc>> {
        self.last_accepted.get(device_id).copied()
    }

    /// Forget a device's watermark
    pub fn remove(&mut self, device_id: &str) -> bool {
        self.last_accepted.remove(device_id).is_some()
    }

    /// Number of devices with an accepted reading
    pub fn device_count(&self) -> usize {
        self.last_accepted.len()
    }
}

impl Default for Ingestor {
    fn default() -> Self {
        Self::new(ValidationConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap() + Duration::seconds(secs)
    }

    #[test]
    fn test_accepts_and_forwards() {
        let mut ingestor = Ingestor::default();
        let mut sink: Vec<Reading> = Vec::new();

        let reading = ingestor
            .ingest(RawReading::new("pot-1", 70.0, t(0)), &mut sink)
            .unwrap();

        assert_eq!(reading.device_id(), "pot-1");
        assert_eq!(reading.temperature(), 70.0);
        assert_eq!(reading.observed_at(), t(0));
        assert_eq!(sink, vec![reading]);
        assert_eq!(ingestor.last_accepted("pot-1"), Some(t(0)));
    }

    #[test]
    fn test_stamps_missing_timestamp() {
        let mut ingestor = Ingestor::default();
        let mut sink: Vec<Reading> = Vec::new();
        let raw = RawReading {
            device_id: "pan-2".to_string(),
            temperature: 40.0,
            observed_at: None,
        };

        let reading = ingestor.ingest_at(raw, t(5), &mut sink).unwrap();
        assert_eq!(reading.observed_at(), t(5));
        assert_eq!(reading.accepted_at(), t(5));
    }

    #[test]
    fn test_keeps_sensor_and_receipt_times_apart() {
        let mut ingestor = Ingestor::default();
        let mut sink: Vec<Reading> = Vec::new();

        // Sensor clock 40s behind
        let reading = ingestor
            .ingest_at(RawReading::new("pot-1", 70.0, t(0)), t(40), &mut sink)
            .unwrap();
        assert_eq!(reading.observed_at(), t(0));
        assert_eq!(reading.accepted_at(), t(40));
    }

    #[test]
    fn test_future_reading_does_not_poison_watermark() {
        let mut ingestor = Ingestor::default();
        let mut sink: Vec<Reading> = Vec::new();

        let err = ingestor
            .ingest_at(RawReading::new("pot-1", 120.0, t(86_400)), t(0), &mut sink)
            .unwrap_err();
        assert_eq!(err.kind(), "future_timestamp");
        assert!(sink.is_empty());
        assert_eq!(ingestor.last_accepted("pot-1"), None);

        // A correctly stamped reading still gets through
        assert!(ingestor
            .ingest_at(RawReading::new("pot-1", 70.0, t(1)), t(1), &mut sink)
            .is_ok());
    }

    #[test]
    fn test_ancient_timestamp_accepted() {
        let mut ingestor = Ingestor::default();
        let mut sink: Vec<Reading> = Vec::new();
        let raw: RawReading = serde_json::from_str(
            r#"{"device_id":"pot-1","temperature":70.0,"observed_at":"-262143-01-01T00:00:00Z"}"#,
        )
        .unwrap();

        let reading = ingestor.ingest_at(raw, t(0), &mut sink).unwrap();
        assert!(reading.observed_at() < t(0));
        assert_eq!(reading.accepted_at(), t(0));
    }

    #[test]
    fn test_out_of_range_is_not_forwarded() {
        let mut ingestor = Ingestor::default();
        let mut sink: Vec<Reading> = Vec::new();

        let err = ingestor
            .ingest(RawReading::new("pot-1", 1500.0, t(0)), &mut sink)
            .unwrap_err();

        assert_eq!(err.kind(), "out_of_range");
        assert!(sink.is_empty());
        assert_eq!(ingestor.last_accepted("pot-1"), None);
    }

    #[test]
    fn test_out_of_order_rejected() {
        let mut ingestor = Ingestor::default();
        let mut sink: Vec<Reading> = Vec::new();

        ingestor
            .ingest(RawReading::new("pot-1", 70.0, t(10)), &mut sink)
            .unwrap();
        let err = ingestor
            .ingest(RawReading::new("pot-1", 71.0, t(9)), &mut sink)
            .unwrap_err();

        assert_eq!(
            err,
            IngestError::OutOfOrder {
                device_id: "pot-1".to_string(),
                observed_at: t(9),
                last_accepted: t(10),
            }
        );
        assert_eq!(sink.len(), 1);
        assert_eq!(ingestor.last_accepted("pot-1"), Some(t(10)));
    }

    #[test]
    fn test_equal_timestamp_accepted() {
        let mut ingestor = Ingestor::default();
        let mut sink: Vec<Reading> = Vec::new();

        ingestor
            .ingest(RawReading::new("pot-1", 70.0, t(3)), &mut sink)
            .unwrap();
        assert!(ingestor
            .ingest(RawReading::new("pot-1", 72.0, t(3)), &mut sink)
            .is_ok());
    }

    #[test]
    fn test_devices_are_independent() {
        let mut ingestor = Ingestor::default();
        let mut sink: Vec<Reading> = Vec::new();

        ingestor
            .ingest(RawReading::new("pot-1", 70.0, t(10)), &mut sink)
            .unwrap();
        // Older than pot-1's watermark, but pan-2 has none yet
        assert!(ingestor
            .ingest(RawReading::new("pan-2", 30.0, t(1)), &mut sink)
            .is_ok());
        assert_eq!(ingestor.device_count(), 2);
    }

    #[test]
    fn test_remove_resets_watermark() {
        let mut ingestor = Ingestor::default();
        let mut sink: Vec<Reading> = Vec::new();

        ingestor
            .ingest(RawReading::new("pot-1", 70.0, t(10)), &mut sink)
            .unwrap();
        assert!(ingestor.remove("pot-1"));
        assert!(!ingestor.remove("pot-1"));
        assert!(ingestor
            .ingest(RawReading::new("pot-1", 70.0, t(0)), &mut sink)
            .is_ok());
    }

    proptest! {
        #[test]
        fn prop_watermark_never_decreases(offsets in prop::collection::vec(0i64..120, 1..50)) {
            let mut ingestor = Ingestor::default();
            let mut sink: Vec<Reading> = Vec::new();
            let mut watermark = None;

            for offset in offsets {
                let result = ingestor.ingest(RawReading::new("pot-1", 50.0, t(offset)), &mut sink);
                match watermark {
                    Some(last) if t(offset) < last => {
                        prop_assert!(result.is_err());
                    }
                    _ => {
                        prop_assert!(result.is_ok());
                        watermark = Some(t(offset));
                    }
                }
                prop_assert_eq!(ingestor.last_accepted("pot-1"), watermark);
            }

            let times: Vec<_> = sink.iter().map(Reading::observed_at).collect();
            prop_assert!(times.windows(2).all(|w| w[0] <= w[1]));
        }
    }
}

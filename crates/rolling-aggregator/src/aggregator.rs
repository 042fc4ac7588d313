//! Rolling Aggregator Implementation

use crate::stats::WindowStats;
use crate::window::{DeviceWindow, DEFAULT_WINDOW_SECS};
use chrono::Duration;
use reading_ingestor::{Reading, ReadingSink};
use std::collections::HashMap;
use tracing::{debug, info};

/// Owns one [`DeviceWindow`] per device
pub struct Aggregator {
    windows: HashMap<String, DeviceWindow>,
    window: Duration,
}

impl Aggregator {
    /// Create an aggregator whose windows span `window`
    pub fn new(window: Duration) -> Self {
        info!("Creating aggregator with {}s window", window.num_seconds());
        Self {
            windows: HashMap::new(),
            window,
        }
    }

    /// Append a reading to its device window and evict stale entries
    pub fn record(&mut self, reading: Reading) {
        let duration = self.window;
        let window = self
            .windows
            .entry(reading.device_id().to_string())
            .or_insert_with(|| {
                debug!("Opening window for {}", reading.device_id());
                DeviceWindow::new(duration)
            });
        window.push(reading);
    }

    /// Statistics for a device; the empty sentinel if it has no window
    pub fn stats(&self, device_id: &str) -> WindowStats {
        self.windows
            .get(device_id)
            .map(DeviceWindow::stats)
            .unwrap_or_default()
    }

    pub fn window(&self, device_id: &str) -> Option<&DeviceWindow> {
        self.windows.get(device_id)
    }

    /// Drop a device's window
    pub fn remove(&mut self, device_id: &str) -> bool {
        self.windows.remove(device_id).is_some()
    }

    /// Device ids with an open window
    pub fn devices(&self) -> impl Iterator<Item = &str> {
        self.windows.keys().map(String::as_str)
    }

    pub fn device_count(&self) -> usize {
        self.windows.len()
    }

    pub fn window_duration(&self) -> Duration {
        self.window
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_WINDOW_SECS as i64))
    }
}

impl ReadingSink for Aggregator {
    fn record(&mut self, reading: Reading) {
        Aggregator::record(self, reading);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use proptest::prelude::*;
    use reading_ingestor::{Ingestor, RawReading};

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap() + Duration::seconds(secs)
    }

    #[test]
    fn test_ingestor_forwards_into_aggregator() {
        let mut ingestor = Ingestor::default();
        let mut aggregator = Aggregator::default();

        ingestor
            .ingest(RawReading::new("pot-1", 70.0, t(0)), &mut aggregator)
            .unwrap();
        ingestor
            .ingest(RawReading::new("pot-1", 85.0, t(1)), &mut aggregator)
            .unwrap();

        let stats = aggregator.stats("pot-1");
        assert_eq!(stats.count, 2);
        assert_eq!(stats.current, Some(85.0));
        assert_eq!(stats.last_observed_at, Some(t(1)));
    }

    #[test]
    fn test_unknown_device_returns_sentinel() {
        let aggregator = Aggregator::default();
        assert_eq!(aggregator.stats("nope"), WindowStats::empty());
    }

    #[test]
    fn test_average_is_window_only() {
        let mut ingestor = Ingestor::default();
        let mut aggregator = Aggregator::new(Duration::seconds(10));

        for (secs, temp) in [(0, 200.0), (20, 50.0), (25, 60.0)] {
            ingestor
                .ingest(RawReading::new("pot-1", temp, t(secs)), &mut aggregator)
                .unwrap();
        }

        let stats = aggregator.stats("pot-1");
        assert_eq!(stats.count, 2);
        assert_eq!(stats.max, Some(60.0));
        assert_eq!(stats.avg, Some(55.0));
    }

    #[test]
    fn test_stats_are_idempotent() {
        let mut ingestor = Ingestor::default();
        let mut aggregator = Aggregator::default();
        ingestor
            .ingest(RawReading::new("pot-1", 70.0, t(0)), &mut aggregator)
            .unwrap();

        assert_eq!(aggregator.stats("pot-1"), aggregator.stats("pot-1"));
    }

    #[test]
    fn test_devices_are_isolated_and_removable() {
        let mut ingestor = Ingestor::default();
        let mut aggregator = Aggregator::default();
        ingestor
            .ingest(RawReading::new("pot-1", 70.0, t(0)), &mut aggregator)
            .unwrap();
        ingestor
            .ingest(RawReading::new("pan-2", 30.0, t(0)), &mut aggregator)
            .unwrap();

        assert_eq!(aggregator.device_count(), 2);
        assert!(aggregator.remove("pot-1"));
        assert!(aggregator.stats("pot-1").is_empty());
        assert_eq!(aggregator.stats("pan-2").count, 1);
    }

    proptest! {
        #[test]
        fn prop_window_never_holds_stale_entries(
            window_secs in 1i64..120,
            gaps in prop::collection::vec(0i64..30, 1..80),
        ) {
            let mut ingestor = Ingestor::default();
            let mut aggregator = Aggregator::new(Duration::seconds(window_secs));
            let mut now = 0;

            for gap in gaps {
                now += gap;
                ingestor
                    .ingest(RawReading::new("pot-1", 50.0, t(now)), &mut aggregator)
                    .unwrap();

                let window = aggregator.window("pot-1").unwrap();
                let cutoff = t(now) - Duration::seconds(window_secs);
                prop_assert!(window.iter().all(|r| r.observed_at() >= cutoff));
                prop_assert_eq!(window.latest().map(Reading::observed_at), Some(t(now)));
            }
        }
    }
}

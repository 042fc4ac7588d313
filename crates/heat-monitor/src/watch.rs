//! Background silence watch

use crate::monitor::Monitor;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Periodically run [`Monitor::check_silence`] against the wall clock.
///
/// Abort the returned handle to stop the watch.
pub fn spawn_silence_watch(monitor: Arc<Monitor>, period: Duration) -> JoinHandle<()> {
    info!("Starting silence watch every {} ms", period.as_millis());
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            let events = monitor.check_silence(Utc::now());
            if !events.is_empty() {
                debug!("Silence check dispatched {} alert(s)", events.len());
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MonitorConfig;
    use reading_ingestor::RawReading;
    use threshold_evaluator::Classification;

    #[tokio::test]
    async fn test_watch_marks_silent_devices() {
        let monitor = Arc::new(Monitor::new(MonitorConfig::default()).unwrap());
        // Last reading received before the 30s silence timeout
        let stale = Utc::now() - chrono::Duration::seconds(45);
        monitor
            .ingest_at(RawReading::new("pot-1", 60.0, stale), stale)
            .unwrap();

        let handle = spawn_silence_watch(Arc::clone(&monitor), Duration::from_millis(10));
        for _ in 0..100 {
            if monitor.classification("pot-1") == Some(Classification::Unknown) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        handle.abort();

        assert_eq!(monitor.classification("pot-1"), Some(Classification::Unknown));
    }
}

//! Monitor Implementation

use crate::config::{ConfigError, MonitorConfig};
use crate::shard::Shard;
use alerting::{AlertEvent, DeliveryError, Subscriber, Subscribers, SubscriptionId};
use chrono::{DateTime, Utc};
use reading_ingestor::{IngestError, RawReading, Reading};
use rolling_aggregator::WindowStats;
use serde::Serialize;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use threshold_evaluator::Classification;
use tracing::{info, warn};

/// What happened to an accepted reading
#[derive(Debug, Clone, Serialize)]
pub struct IngestOutcome {
    pub reading: Reading,
    pub stats: WindowStats,
    pub classification: Classification,
    /// Present only when the classification changed
    pub alert: Option<AlertEvent>,
}

/// Point-in-time view of one device
#[derive(Debug, Clone, Serialize)]
pub struct DeviceSnapshot {
    pub device_id: String,
    pub classification: Classification,
    pub stats: WindowStats,
}

/// Thread-safe monitoring core
pub struct Monitor {
    shards: Vec<Mutex<Shard>>,
    subscribers: Arc<Subscribers>,
    config: MonitorConfig,
    device_count: AtomicUsize,
}

impl Monitor {
    /// Create a monitor; fails if the configuration is invalid
    pub fn new(config: MonitorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let subscribers = Arc::new(Subscribers::new());
        let shard_count = config.shards.max(1);
        let shards = (0..shard_count)
            .map(|_| Mutex::new(Shard::new(&config, Arc::clone(&subscribers))))
            .collect();

        info!(
            shards = shard_count,
            window_secs = config.window_secs,
            warn = config.warn_threshold,
            crit = config.crit_threshold,
            margin = config.hysteresis_margin,
            silence_secs = config.silence_timeout_secs,
            "Monitor created"
        );

        Ok(Self {
            shards,
            subscribers,
            config,
            device_count: AtomicUsize::new(0),
        })
    }

    fn shard(&self, device_id: &str) -> MutexGuard<'_, Shard> {
        let mut hasher = DefaultHasher::new();
        device_id.hash(&mut hasher);
        let index = (hasher.finish() % self.shards.len() as u64) as usize;
        // Stages never panic while holding the lock; subscriber panics are caught
        self.shards[index]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_all(&self) -> impl Iterator<Item = MutexGuard<'_, Shard>> {
        self.shards
            .iter()
            .map(|shard| shard.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Ingest a reading received now
    pub fn ingest(&self, raw: RawReading) -> Result<IngestOutcome, IngestError> {
        self.ingest_at(raw, Utc::now())
    }

    /// Ingest a reading received at `received_at`
    pub fn ingest_at(
        &self,
        raw: RawReading,
        received_at: DateTime<Utc>,
    ) -> Result<IngestOutcome, IngestError> {
        // The device count moves under the shard lock so it stays ordered with unregister
        let mut shard = self.shard(&raw.device_id);
        match shard.process(raw, received_at) {
            Ok(processed) => {
                metrics::counter!("thermasafe_readings_accepted_total").increment(1);
                if processed.new_device {
                    let count = self.device_count.fetch_add(1, Ordering::Relaxed) + 1;
                    metrics::gauge!("thermasafe_devices").set(count as f64);
                    info!("Device registered: {}", processed.reading.device_id());
                }
                Ok(IngestOutcome {
                    reading: processed.reading,
                    stats: processed.stats,
                    classification: processed.classification,
                    alert: processed.alert,
                })
            }
            Err(e) => {
                metrics::counter!("thermasafe_readings_rejected_total", "reason" => e.kind())
                    .increment(1);
                Err(e)
            }
        }
    }

    /// Window statistics; the empty sentinel for an unknown device
    pub fn stats(&self, device_id: &str) -> WindowStats {
        self.shard(device_id).stats(device_id)
    }

    /// Current classification, `None` for an unknown device
    pub fn classification(&self, device_id: &str) -> Option<Classification> {
        self.shard(device_id).classification(device_id)
    }

    pub fn snapshot(&self, device_id: &str) -> Option<DeviceSnapshot> {
        let shard = self.shard(device_id);
        shard.classification(device_id).map(|classification| DeviceSnapshot {
            device_id: device_id.to_string(),
            classification,
            stats: shard.stats(device_id),
        })
    }

    /// Every monitored device, sorted by id
    pub fn snapshots(&self) -> Vec<DeviceSnapshot> {
        let mut all: Vec<DeviceSnapshot> = self
            .lock_all()
            .flat_map(|shard| {
                let snapshots: Vec<DeviceSnapshot> = shard
                    .devices()
                    .filter_map(|id| {
                        shard.classification(id).map(|classification| DeviceSnapshot {
                            device_id: id.to_string(),
                            classification,
                            stats: shard.stats(id),
                        })
                    })
                    .collect();
                snapshots
            })
            .collect();
        all.sort_by(|a, b| a.device_id.cmp(&b.device_id));
        all
    }

    /// Evaluate every device at `now`, flagging silent ones as UNKNOWN
    pub fn check_silence(&self, now: DateTime<Utc>) -> Vec<AlertEvent> {
        let events: Vec<AlertEvent> = self
            .lock_all()
            .flat_map(|mut shard| shard.check_silence(now))
            .collect();
        for event in events.iter().filter(|e| e.to == Classification::Unknown) {
            warn!("Device {} went silent", event.device_id);
        }
        events
    }

    /// Stop monitoring a device and discard its state
    pub fn unregister(&self, device_id: &str) -> bool {
        let mut shard = self.shard(device_id);
        let removed = shard.remove(device_id);
        if removed {
            let count = self
                .device_count
                .fetch_sub(1, Ordering::Relaxed)
                .saturating_sub(1);
            metrics::gauge!("thermasafe_devices").set(count as f64);
            info!("Device unregistered: {}", device_id);
        }
        removed
    }

    /// Register a subscriber for alert events
    pub fn subscribe(&self, subscriber: Arc<dyn Subscriber>) -> SubscriptionId {
        self.subscribers.subscribe(subscriber)
    }

    /// Register a callback for alert events
    pub fn subscribe_fn<F>(&self, name: impl Into<String>, callback: F) -> SubscriptionId
    where
        F: Fn(&AlertEvent) -> Result<(), DeliveryError> + Send + Sync + 'static,
    {
        self.subscribers.subscribe_fn(name, callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    pub fn device_count(&self) -> usize {
        self.device_count.load(Ordering::Relaxed)
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }
}

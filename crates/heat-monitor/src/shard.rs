//! One lock's worth of device pipelines

use crate::config::MonitorConfig;
use alerting::{AlertEvent, Dispatcher, Subscribers};
use chrono::{DateTime, Utc};
use reading_ingestor::{IngestError, Ingestor, RawReading, Reading};
use rolling_aggregator::{Aggregator, WindowStats};
use std::sync::Arc;
use threshold_evaluator::{Classification, Evaluator};

/// Result of running one reading through the pipeline
pub(crate) struct Processed {
    pub reading: Reading,
    pub stats: WindowStats,
    pub classification: Classification,
    pub alert: Option<AlertEvent>,
    pub new_device: bool,
}

/// Stage state for every device hashed to this shard
pub(crate) struct Shard {
    ingestor: Ingestor,
    aggregator: Aggregator,
    evaluator: Evaluator,
    dispatcher: Dispatcher,
}

impl Shard {
    pub fn new(config: &MonitorConfig, subscribers: Arc<Subscribers>) -> Self {
        Self {
            ingestor: Ingestor::new(config.validation()),
            aggregator: Aggregator::new(config.window()),
            evaluator: Evaluator::new(config.thresholds()),
            dispatcher: Dispatcher::new(subscribers),
        }
    }

    /// Ingest -> record -> evaluate -> notify, evaluated at receipt time
    pub fn process(&mut self, raw: RawReading, received_at: DateTime<Utc>) -> Result<Processed, IngestError> {
        let new_device = self.ingestor.last_accepted(&raw.device_id).is_none();
        let reading = self.ingestor.ingest_at(raw, received_at, &mut self.aggregator)?;

        let device_id = reading.device_id();
        let at = reading.accepted_at();
        let stats = self.aggregator.stats(device_id);
        let classification = self.evaluator.evaluate(device_id, &stats, at);
        let alert = self.dispatcher.notify(device_id, classification, at);

        Ok(Processed {
            reading,
            stats,
            classification,
            alert,
            new_device,
        })
    }

    /// Re-evaluate every device at `now`, which only changes silent ones
    pub fn check_silence(&mut self, now: DateTime<Utc>) -> Vec<AlertEvent> {
        let devices: Vec<String> = self.aggregator.devices().map(str::to_string).collect();
        devices
            .iter()
            .filter_map(|device_id| {
                let stats = self.aggregator.stats(device_id);
                let classification = self.evaluator.evaluate(device_id, &stats, now);
                self.dispatcher.notify(device_id, classification, now)
            })
            .collect()
    }

    pub fn stats(&self, device_id: &str) -> WindowStats {
        self.aggregator.stats(device_id)
    }

    pub fn classification(&self, device_id: &str) -> Option<Classification> {
        self.evaluator.classification(device_id)
    }

    pub fn devices(&self) -> impl Iterator<Item = &str> {
        self.aggregator.devices()
    }

    /// Discard all state for a device; true if it was monitored
    pub fn remove(&mut self, device_id: &str) -> bool {
        let known = self.aggregator.remove(device_id);
        self.ingestor.remove(device_id);
        self.evaluator.remove(device_id);
        self.dispatcher.remove(device_id);
        known
    }
}

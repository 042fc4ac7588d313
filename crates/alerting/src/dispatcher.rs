//! Alert Dispatcher Implementation

use crate::event::AlertEvent;
use crate::subscriber::Subscribers;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use threshold_evaluator::Classification;
use tracing::{debug, info};

/// Emits at most one event per classification change.
///
/// The last-known classification of a device starts at `Safe` and is only
/// updated after every subscriber has been attempted.
pub struct Dispatcher {
    subscribers: Arc<Subscribers>,
    last_known: HashMap<String, Classification>,
}

impl Dispatcher {
    /// Create a dispatcher delivering to a shared subscriber set
    pub fn new(subscribers: Arc<Subscribers>) -> Self {
        Self {
            subscribers,
            last_known: HashMap::new(),
        }
    }

    /// Report the classification of a device; returns the event if it changed
    pub fn notify(
        &mut self,
        device_id: &str,
        classification: Classification,
        at: DateTime<Utc>,
    ) -> Option<AlertEvent> {
        let previous = self.last_known(device_id);
        if previous == classification {
            debug!("{} unchanged at {}", device_id, classification);
            self.last_known
                .entry(device_id.to_string())
                .or_insert(classification);
            return None;
        }

        let event = AlertEvent::new(device_id, previous, classification, at);
        let report = self.subscribers.deliver(&event);
        self.last_known.insert(device_id.to_string(), classification);

        info!(
            device_id,
            from = %previous,
            to = %classification,
            delivered = report.delivered,
            failed = report.failed.len(),
            "Alert dispatched"
        );
        metrics::counter!("thermasafe_alerts_dispatched_total", "to" => classification.as_str())
            .increment(1);

        Some(event)
    }

    /// Last dispatched classification, `Safe` for an unseen device
    pub fn last_known(&self, device_id: &str) -> Classification {
        self.last_known.get(device_id).copied().unwrap_or_default()
    }

    /// Forget a device
    pub fn remove(&mut self, device_id: &str) -> bool {
        self.last_known.remove(device_id).is_some()
    }

    pub fn subscribers(&self) -> &Arc<Subscribers> {
        &self.subscribers
    }
}

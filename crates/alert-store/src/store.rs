//! In-memory alert store

use crate::StoreError;
use alerting::{AlertEvent, DeliveryError, Subscriber};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

/// Default number of alerts kept
pub const DEFAULT_HISTORY_CAPACITY: usize = 10_000;

/// Stored alert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    #[serde(flatten)]
    pub event: AlertEvent,
    pub acknowledged: bool,
}

/// Query filter for [`AlertStore::recent`]
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlertFilter {
    pub device_id: Option<String>,
    pub acknowledged: Option<bool>,
}

impl AlertFilter {
    fn matches(&self, record: &AlertRecord) -> bool {
        self.device_id
            .as_deref()
            .map_or(true, |id| record.event.device_id == id)
            && self
                .acknowledged
                .map_or(true, |ack| record.acknowledged == ack)
    }
}

/// Bounded alert history, oldest dropped first
pub struct AlertStore {
    records: Mutex<VecDeque<AlertRecord>>,
    capacity: usize,
}

impl AlertStore {
    /// Create a store keeping at most `capacity` alerts
    pub fn new(capacity: usize) -> Self {
        info!("Creating alert store (capacity {})", capacity);
        Self {
            records: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity: capacity.max(1),
        }
    }

    /// Insert an alert
    pub fn insert(&self, event: AlertEvent) -> Result<(), StoreError> {
        let mut records = self
            .records
            .lock()
            .map_err(|e| StoreError::Lock(e.to_string()))?;

        // Enforce retention
        while records.len() >= self.capacity {
            records.pop_front();
        }

        debug!("Stored alert {}", event.id);
        records.push_back(AlertRecord {
            event,
            acknowledged: false,
        });
        Ok(())
    }

    /// Most recent alerts first
    pub fn recent(&self, filter: &AlertFilter, limit: usize) -> Result<Vec<AlertRecord>, StoreError> {
        let records = self
            .records
            .lock()
            .map_err(|e| StoreError::Lock(e.to_string()))?;

        Ok(records
            .iter()
            .rev()
            .filter(|r| filter.matches(r))
            .take(limit)
            .cloned()
            .collect())
    }

    /// Mark an alert as acknowledged
    pub fn acknowledge(&self, id: Uuid) -> Result<AlertRecord, StoreError> {
        let mut records = self
            .records
            .lock()
            .map_err(|e| StoreError::Lock(e.to_string()))?;

        let record = records
            .iter_mut()
            .find(|r| r.event.id == id)
            .ok_or(StoreError::NotFound)?;
        record.acknowledged = true;
        info!("Alert acknowledged: {}", id);
        Ok(record.clone())
    }

    /// Number of unacknowledged alerts
    pub fn pending_count(&self) -> usize {
        self.records
            .lock()
            .map(|r| r.iter().filter(|r| !r.acknowledged).count())
            .unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clear all alerts
    pub fn clear(&self) {
        if let Ok(mut records) = self.records.lock() {
            records.clear();
        }
    }
}

impl Default for AlertStore {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl Subscriber for AlertStore {
    fn name(&self) -> &str {
        "alert-store"
    }

    fn deliver(&self, event: &AlertEvent) -> Result<(), DeliveryError> {
        self.insert(event.clone())
            .map_err(|e| DeliveryError::Rejected(e.to_string()))
    }
}

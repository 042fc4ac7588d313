//! Alert event

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use threshold_evaluator::Classification;
use uuid::Uuid;

/// A classification transition for one device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    /// Unique per transition; a replayed event keeps its id
    pub id: Uuid,
    pub device_id: String,
    pub from: Classification,
    pub to: Classification,
    pub at: DateTime<Utc>,
}

impl AlertEvent {
    pub fn new(
        device_id: impl Into<String>,
        from: Classification,
        to: Classification,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            device_id: device_id.into(),
            from,
            to,
            at,
        }
    }

    /// Whether the transition raised the severity
    pub fn is_escalation(&self) -> bool {
        match (self.from.severity(), self.to.severity()) {
            (Some(from), Some(to)) => to > from,
            _ => false,
        }
    }
}

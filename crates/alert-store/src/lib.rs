//! Alert History
//!
//! Keeps the most recent alert events in memory so the dashboard can list and
//! acknowledge them. Nothing is persisted across restarts.

mod store;

pub use store::{AlertFilter, AlertRecord, AlertStore, DEFAULT_HISTORY_CAPACITY};

use thiserror::Error;

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Lock error: {0}")]
    Lock(String),
    #[error("Alert not found")]
    NotFound,
}

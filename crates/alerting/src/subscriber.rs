//! Subscriber registry and isolated delivery

use crate::event::AlertEvent;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors a subscriber may report for one event
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DeliveryError {
    /// Subscriber refused or failed to handle the event
    #[error("Delivery rejected: {0}")]
    Rejected(String),

    /// Bounded channel had no free slot
    #[error("Subscriber channel is full")]
    ChannelFull,

    /// Receiving side has gone away
    #[error("Subscriber channel is closed")]
    ChannelClosed,

    /// Handler exceeded its time budget
    #[error("Delivery timed out after {0} ms")]
    Timeout(u64),

    /// Subscriber panicked while handling the event
    #[error("Subscriber panicked: {0}")]
    Panicked(String),
}

/// Consumer of alert events.
///
/// `deliver` runs on the device pipeline, so implementations must not block;
/// slow consumers belong behind a [`ChannelSubscriber`](crate::ChannelSubscriber).
pub trait Subscriber: Send + Sync {
    fn name(&self) -> &str;

    fn deliver(&self, event: &AlertEvent) -> Result<(), DeliveryError>;
}

/// Adapts a closure into a [`Subscriber`]
pub struct FnSubscriber<F> {
    name: String,
    callback: F,
}

impl<F> FnSubscriber<F>
where
    F: Fn(&AlertEvent) -> Result<(), DeliveryError> + Send + Sync,
{
    pub fn new(name: impl Into<String>, callback: F) -> Self {
        Self {
            name: name.into(),
            callback,
        }
    }
}

impl<F> Subscriber for FnSubscriber<F>
where
    F: Fn(&AlertEvent) -> Result<(), DeliveryError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn deliver(&self, event: &AlertEvent) -> Result<(), DeliveryError> {
        (self.callback)(event)
    }
}

/// Handle returned by [`Subscribers::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Outcome of delivering one event to every subscriber
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub failed: Vec<(String, DeliveryError)>,
}

impl DeliveryReport {
    pub fn attempted(&self) -> usize {
        self.delivered + self.failed.len()
    }
}

/// Ordered set of subscribers shared by every dispatcher
#[derive(Default)]
pub struct Subscribers {
    entries: RwLock<Vec<(SubscriptionId, Arc<dyn Subscriber>)>>,
    next_id: AtomicU64,
}

impl Subscribers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber; delivery follows registration order
    pub fn subscribe(&self, subscriber: Arc<dyn Subscriber>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        info!("Subscriber registered: {}", subscriber.name());
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, subscriber));
        id
    }

    /// Register a closure as a subscriber
    pub fn subscribe_fn<F>(&self, name: impl Into<String>, callback: F) -> SubscriptionId
    where
        F: Fn(&AlertEvent) -> Result<(), DeliveryError> + Send + Sync + 'static,
    {
        self.subscribe(Arc::new(FnSubscriber::new(name, callback)))
    }

    /// Remove a subscriber
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver to every subscriber in order. A failing or panicking
    /// subscriber is logged and skipped; the rest still receive the event.
    pub fn deliver(&self, event: &AlertEvent) -> DeliveryReport {
        // Snapshot so a subscriber may (un)subscribe while being called
        let snapshot: Vec<Arc<dyn Subscriber>> = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, subscriber)| Arc::clone(subscriber))
            .collect();

        let mut report = DeliveryReport::default();
        for subscriber in snapshot {
            let result = panic::catch_unwind(AssertUnwindSafe(|| subscriber.deliver(event)))
                .unwrap_or_else(|payload| Err(DeliveryError::Panicked(panic_message(&*payload))));

            match result {
                Ok(()) => {
                    debug!("Delivered {} to {}", event.id, subscriber.name());
                    report.delivered += 1;
                }
                Err(e) => {
                    warn!(
                        subscriber = subscriber.name(),
                        device_id = %event.device_id,
                        "Alert delivery failed: {}",
                        e
                    );
                    metrics::counter!("thermasafe_subscriber_failures_total").increment(1);
                    report.failed.push((subscriber.name().to_string(), e));
                }
            }
        }
        report
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

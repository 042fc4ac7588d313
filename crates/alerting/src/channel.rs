//! Channel-backed subscribers for slow or blocking consumers

use crate::event::AlertEvent;
use crate::subscriber::{DeliveryError, Subscriber};
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Hands events to a bounded channel without ever waiting.
///
/// A full channel is reported as a delivery failure for that event only.
pub struct ChannelSubscriber {
    name: String,
    tx: mpsc::Sender<AlertEvent>,
}

impl ChannelSubscriber {
    /// Create a subscriber and the receiver it feeds
    pub fn new(name: impl Into<String>, capacity: usize) -> (Self, mpsc::Receiver<AlertEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (
            Self {
                name: name.into(),
                tx,
            },
            rx,
        )
    }
}

impl Subscriber for ChannelSubscriber {
    fn name(&self) -> &str {
        &self.name
    }

    fn deliver(&self, event: &AlertEvent) -> Result<(), DeliveryError> {
        self.tx.try_send(event.clone()).map_err(|e| match e {
            TrySendError::Full(_) => DeliveryError::ChannelFull,
            TrySendError::Closed(_) => DeliveryError::ChannelClosed,
        })
    }
}

/// Run an async handler on its own task, each call bounded by `timeout`.
///
/// Must be called from within a tokio runtime. The task ends once the
/// returned subscriber (and every clone of its sender) is dropped.
pub fn spawn_handler<F, Fut>(
    name: impl Into<String>,
    capacity: usize,
    timeout: Duration,
    handler: F,
) -> (ChannelSubscriber, JoinHandle<()>)
where
    F: Fn(AlertEvent) -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), DeliveryError>> + Send + 'static,
{
    let (subscriber, mut rx) = ChannelSubscriber::new(name, capacity);
    let name = subscriber.name.clone();

    let handle = tokio::spawn(async move {
        info!("Alert handler '{}' started", name);
        while let Some(event) = rx.recv().await {
            let event_id = event.id;
            match tokio::time::timeout(timeout, handler(event)).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(handler = %name, %event_id, "Alert handler failed: {}", e),
                Err(_) => {
                    let e = DeliveryError::Timeout(timeout.as_millis() as u64);
                    warn!(handler = %name, %event_id, "Alert handler failed: {}", e);
                    metrics::counter!("thermasafe_subscriber_failures_total").increment(1);
                }
            }
        }
        info!("Alert handler '{}' stopped", name);
    });

    (subscriber, handle)
}

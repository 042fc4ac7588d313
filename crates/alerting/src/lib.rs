//! Alerting System
//!
//! Turns classification changes into [`AlertEvent`]s, suppresses duplicates,
//! and delivers each event to every subscriber with per-subscriber failure
//! isolation.

mod channel;
mod dispatcher;
mod event;
mod subscriber;

pub use channel::{spawn_handler, ChannelSubscriber};
pub use dispatcher::Dispatcher;
pub use event::AlertEvent;
pub use subscriber::{
    DeliveryError, DeliveryReport, FnSubscriber, Subscriber, Subscribers, SubscriptionId,
};

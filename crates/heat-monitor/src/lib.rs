//! Heat Monitor
//!
//! Wires the ingestion pipeline together:
//! - Reading Ingestor (validation, ordering)
//! - Rolling Aggregator (per-device window statistics)
//! - Threshold Evaluator (hysteresis, silence)
//! - Alert Dispatcher (transition events)
//!
//! Devices are spread over independently locked shards, so one device's
//! pipeline always runs in sequence while other devices proceed in parallel.

mod config;
mod monitor;
mod shard;
mod watch;

pub use config::{ConfigError, MonitorConfig};
pub use monitor::{DeviceSnapshot, IngestOutcome, Monitor};
pub use watch::spawn_silence_watch;

pub use alerting::{AlertEvent, ChannelSubscriber, DeliveryError, Subscriber, SubscriptionId};
pub use reading_ingestor::{IngestError, RawReading, Reading};
pub use rolling_aggregator::WindowStats;
pub use threshold_evaluator::Classification;

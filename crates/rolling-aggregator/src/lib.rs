//! Rolling Aggregator
//!
//! Keeps a fixed-duration sliding window of readings per device and computes
//! live statistics (current, min, max, average) over what is retained.

mod aggregator;
mod stats;
mod window;

pub use aggregator::Aggregator;
pub use stats::WindowStats;
pub use window::{DeviceWindow, DEFAULT_WINDOW_SECS};

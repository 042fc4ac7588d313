//! Threshold Evaluator
//!
//! Classifies each device as SAFE, WARNING or CRITICAL from its latest
//! temperature, with a hysteresis band on the way down. A device that stops
//! reporting for longer than the silence timeout becomes UNKNOWN.

pub mod classification;
pub mod config;
pub mod evaluator;

pub use classification::Classification;
pub use config::Thresholds;
pub use evaluator::Evaluator;

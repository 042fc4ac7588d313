//! Reading Ingestion
//!
//! Validates raw temperature samples, stamps them with a receipt time when the
//! sensor did not, and rejects samples that arrive out of order for a device.

mod error;
mod ingestor;
mod reading;
mod validator;

pub use error::IngestError;
pub use ingestor::{Ingestor, ReadingSink};
pub use reading::{RawReading, Reading};
pub use validator::{ValidationConfig, Validator};

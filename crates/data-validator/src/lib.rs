//! Sensor Read Validation and Batching
//!
//! Screens raw VOC reads from the sensor collaborator and groups the usable
//! ones into per-round sample batches for feature extraction.

mod collector;
mod error;
mod validator;

pub use collector::{CollectorProgress, ReadStatus, RoundCollector, SensorReading};
pub use error::ValidationError;
pub use validator::{SignalValidator, ValidationConfig, ValidationResult};

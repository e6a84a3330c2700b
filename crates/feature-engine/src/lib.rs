//! Feature Engineering Engine
//!
//! Converts batches of raw VOC sensor samples into flat statistical feature
//! vectors for the verification ensemble.

mod features;
mod ordered;
mod sample;
mod statistics;

pub use features::{extract_features, FeatureExtractor, FeatureVector, STATISTIC_NAMES};
pub use sample::{Sample, SampleBatch};
pub use statistics::{safe_float, ChannelStatistics};

use thiserror::Error;

/// Errors during feature extraction
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeatureError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

//! Feature Vector Assembly

use crate::ordered::OrderedMap;
use crate::sample::SampleBatch;
use crate::statistics::{safe_float, ChannelStatistics};
use crate::FeatureError;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Statistic suffixes, in the order they are emitted per channel
pub const STATISTIC_NAMES: [&str; 10] = [
    "min", "mean", "max", "std", "median", "iqr", "skew", "kurtosis", "cv", "energy",
];

/// Flat `"{channel}_{statistic}"` feature mapping for one round
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureVector {
    values: OrderedMap<f64>,
}

impl FeatureVector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a feature; non-finite values are stored as 0.0
    pub fn insert(&mut self, key: impl Into<String>, value: f64) {
        self.values.insert(key.into(), safe_float(Some(value)));
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.values.get(key).copied()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k, *v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for FeatureVector {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        let mut features = FeatureVector::new();
        for (key, value) in iter {
            features.insert(key, value);
        }
        features
    }
}

/// Feature extractor for VOC sample batches
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureExtractor;

impl FeatureExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract per-channel statistics from one round of samples.
    ///
    /// The channel set comes from the first sample; later samples that lack a
    /// channel contribute 0.0 for it.
    pub fn extract(&self, batch: &SampleBatch) -> Result<FeatureVector, FeatureError> {
        let samples = batch.samples();
        let first = samples
            .first()
            .ok_or_else(|| FeatureError::InvalidInput("sample batch is empty".to_string()))?;

        let mut features = FeatureVector::new();
        let mut zero_channels = 0usize;

        for channel in first.channels() {
            let values: Vec<f64> = samples
                .iter()
                .map(|sample| safe_float(sample.get(channel)))
                .collect();

            let stats = ChannelStatistics::compute(&values);
            if stats == ChannelStatistics::default() {
                zero_channels += 1;
            }

            for (name, value) in STATISTIC_NAMES.iter().zip(stats.to_array()) {
                features.insert(format!("{channel}_{name}"), value);
            }
        }

        debug!(
            "Extracted {} features from {} samples ({} silent channels)",
            features.len(),
            samples.len(),
            zero_channels
        );

        Ok(features)
    }
}

/// Convenience wrapper around [`FeatureExtractor::extract`]
pub fn extract_features(batch: &SampleBatch) -> Result<FeatureVector, FeatureError> {
    FeatureExtractor::new().extract(batch)
}

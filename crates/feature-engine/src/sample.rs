//! Raw sensor samples and per-round batches

use crate::ordered::OrderedMap;
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

/// A single channel reading; `None` when the sensor reported nothing usable
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(transparent)]
struct Reading(Option<f64>);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawReading {
    Number(f64),
    Other(IgnoredAny),
}

impl<'de> Deserialize<'de> for Reading {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // null, strings and other non-numeric payloads all become a missing reading
        Ok(match RawReading::deserialize(deserializer)? {
            RawReading::Number(v) => Reading(Some(v)),
            RawReading::Other(_) => Reading(None),
        })
    }
}

/// One sensor poll: channel name to reading, in channel order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sample {
    readings: OrderedMap<Reading>,
}

impl Sample {
    /// Create an empty sample
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a reading for a channel
    pub fn insert(&mut self, channel: impl Into<String>, value: f64) {
        self.readings.insert(channel.into(), Reading(Some(value)));
    }

    /// Record a channel that produced no reading this poll
    pub fn insert_missing(&mut self, channel: impl Into<String>) {
        self.readings.insert(channel.into(), Reading(None));
    }

    /// Builder-style insert
    pub fn with(mut self, channel: impl Into<String>, value: f64) -> Self {
        self.insert(channel, value);
        self
    }

    /// Reading for a channel; `None` if absent or missing
    pub fn get(&self, channel: &str) -> Option<f64> {
        self.readings.get(channel).and_then(|r| r.0)
    }

    /// Whether the channel key is present (even with a missing reading)
    pub fn contains(&self, channel: &str) -> bool {
        self.readings.get(channel).is_some()
    }

    /// Channel names in poll order
    pub fn channels(&self) -> impl Iterator<Item = &str> {
        self.readings.keys()
    }

    /// Channel/reading pairs in poll order
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<f64>)> {
        self.readings.iter().map(|(k, r)| (k, r.0))
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for Sample {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        let mut sample = Sample::new();
        for (channel, value) in iter {
            sample.insert(channel, value);
        }
        sample
    }
}

/// Ordered samples collected during one round
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SampleBatch {
    samples: Vec<Sample>,
}

impl SampleBatch {
    pub fn new(samples: Vec<Sample>) -> Self {
        Self { samples }
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl From<Vec<Sample>> for SampleBatch {
    fn from(samples: Vec<Sample>) -> Self {
        Self::new(samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_keeps_channel_order() {
        let sample: Sample =
            serde_json::from_str(r#"{"mq6_1": 1.5, "mems_nh3_1": 2.0, "mq135_1": 0.0}"#).unwrap();
        let channels: Vec<_> = sample.channels().collect();
        assert_eq!(channels, vec!["mq6_1", "mems_nh3_1", "mq135_1"]);
    }

    #[test]
    fn test_non_numeric_readings_become_missing() {
        let sample: Sample =
            serde_json::from_str(r#"{"mq6_1": null, "mq135_1": "n/a", "mq137_1": 4.25}"#).unwrap();
        assert_eq!(sample.len(), 3);
        assert!(sample.contains("mq6_1"));
        assert_eq!(sample.get("mq6_1"), None);
        assert_eq!(sample.get("mq135_1"), None);
        assert_eq!(sample.get("mq137_1"), Some(4.25));
    }

    #[test]
    fn test_batch_roundtrip_shape() {
        let batch = SampleBatch::new(vec![Sample::new().with("mq6_1", 1.0)]);
        let json = serde_json::to_string(&batch).unwrap();
        assert_eq!(json, r#"[{"mq6_1":1.0}]"#);
    }
}

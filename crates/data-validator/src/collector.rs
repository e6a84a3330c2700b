//! Round Collector
//!
//! Groups usable sensor reads into fixed-size per-round batches.

use crate::error::ValidationError;
use crate::validator::SignalValidator;
use feature_engine::{Sample, SampleBatch};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

/// Status reported by the sensor reader for one poll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadStatus {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "ERROR")]
    Error,
}

/// One poll from the sensor collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorReading {
    pub status: ReadStatus,
    /// VOC channel readings
    #[serde(default)]
    pub voc: Sample,
    /// Ambient readings (temperature, humidity)
    #[serde(default)]
    pub environment: HashMap<String, f64>,
}

impl SensorReading {
    pub fn ok(voc: Sample) -> Self {
        Self {
            status: ReadStatus::Ok,
            voc,
            environment: HashMap::new(),
        }
    }

    pub fn error() -> Self {
        Self {
            status: ReadStatus::Error,
            voc: Sample::new(),
            environment: HashMap::new(),
        }
    }
}

/// Outcome of feeding one reading to the collector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectorProgress {
    /// Reading was not usable and was dropped
    Discarded,
    /// Reading was added to the current round (both 1-based)
    Sampled { round: usize, sample: usize },
    /// Reading filled a round; more rounds remain
    RoundComplete { round: usize },
    /// Reading filled the last round
    Complete,
}

/// Collects `rounds` batches of `samples_per_round` usable reads
pub struct RoundCollector {
    samples_per_round: usize,
    rounds: usize,
    current: Vec<Sample>,
    batches: Vec<SampleBatch>,
    discarded: usize,
    validator: Option<SignalValidator>,
}

impl RoundCollector {
    /// Create a new collector
    pub fn new(samples_per_round: usize, rounds: usize) -> Result<Self, ValidationError> {
        if samples_per_round == 0 || rounds == 0 {
            return Err(ValidationError::InvalidConfig(format!(
                "samples_per_round={samples_per_round}, rounds={rounds} must be positive"
            )));
        }
        info!(
            "Creating round collector: {} rounds x {} samples",
            rounds, samples_per_round
        );
        Ok(Self {
            samples_per_round,
            rounds,
            current: Vec::with_capacity(samples_per_round),
            batches: Vec::with_capacity(rounds),
            discarded: 0,
            validator: None,
        })
    }

    /// Also drop OK reads whose signal fails validation
    pub fn with_validator(mut self, validator: SignalValidator) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Feed one reading
    pub fn push(&mut self, reading: SensorReading) -> Result<CollectorProgress, ValidationError> {
        if self.is_complete() {
            return Err(ValidationError::CollectionComplete(self.rounds));
        }

        if reading.status != ReadStatus::Ok {
            self.discarded += 1;
            debug!("Discarding ERROR read ({} discarded so far)", self.discarded);
            return Ok(CollectorProgress::Discarded);
        }

        if let Some(validator) = &self.validator {
            if let Err(e) = validator.check(&reading.voc) {
                self.discarded += 1;
                debug!("Discarding read with unusable signal: {}", e);
                return Ok(CollectorProgress::Discarded);
            }
        }

        self.current.push(reading.voc);
        let round = self.batches.len() + 1;

        if self.current.len() < self.samples_per_round {
            return Ok(CollectorProgress::Sampled {
                round,
                sample: self.current.len(),
            });
        }

        let samples = std::mem::replace(&mut self.current, Vec::with_capacity(self.samples_per_round));
        self.batches.push(SampleBatch::new(samples));
        debug!("Round {}/{} collected", round, self.rounds);

        if self.is_complete() {
            Ok(CollectorProgress::Complete)
        } else {
            Ok(CollectorProgress::RoundComplete { round })
        }
    }

    /// Whether every round has been filled
    pub fn is_complete(&self) -> bool {
        self.batches.len() >= self.rounds
    }

    /// Completed batches so far
    pub fn batches(&self) -> &[SampleBatch] {
        &self.batches
    }

    /// Consume the collector, returning completed batches
    pub fn into_batches(self) -> Vec<SampleBatch> {
        self.batches
    }

    /// Number of reads dropped
    pub fn discarded(&self) -> usize {
        self.discarded
    }

    /// Fraction of all samples collected (0.0 to 1.0)
    pub fn progress(&self) -> f64 {
        let total = self.rounds * self.samples_per_round;
        let done = self.batches.len() * self.samples_per_round + self.current.len();
        done as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(v: f64) -> SensorReading {
        SensorReading::ok(Sample::new().with("mq6_1", v))
    }

    #[test]
    fn test_rejects_zero_sizes() {
        assert!(RoundCollector::new(0, 3).is_err());
        assert!(RoundCollector::new(10, 0).is_err());
    }

    #[test]
    fn test_error_reads_discarded() {
        let mut collector = RoundCollector::new(2, 2).unwrap();

        assert_eq!(collector.push(SensorReading::error()).unwrap(), CollectorProgress::Discarded);
        assert_eq!(
            collector.push(ok(1.0)).unwrap(),
            CollectorProgress::Sampled { round: 1, sample: 1 }
        );
        assert_eq!(
            collector.push(ok(2.0)).unwrap(),
            CollectorProgress::RoundComplete { round: 1 }
        );
        assert_eq!(collector.push(SensorReading::error()).unwrap(), CollectorProgress::Discarded);
        assert!((collector.progress() - 0.5).abs() < 1e-12);
        collector.push(ok(3.0)).unwrap();
        assert_eq!(collector.push(ok(4.0)).unwrap(), CollectorProgress::Complete);

        assert_eq!(collector.discarded(), 2);
        assert!(collector.is_complete());
        assert_eq!(
            collector.push(ok(5.0)).unwrap_err(),
            ValidationError::CollectionComplete(2)
        );

        let batches = collector.into_batches();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[1].samples()[0].get("mq6_1"), Some(3.0));
    }

    #[test]
    fn test_validator_filters_flat_reads() {
        let mut collector = RoundCollector::new(1, 1)
            .unwrap()
            .with_validator(SignalValidator::default());

        let flat = SensorReading::ok((0..6).map(|i| (format!("ch{i}"), 0.0)).collect());
        assert_eq!(collector.push(flat).unwrap(), CollectorProgress::Discarded);

        let hand = SensorReading::ok(
            [("mq6_1", 14.2), ("mq135_1", 3.1), ("mq137_1", 8.8), ("mems_nh3_1", 1.9)]
                .into_iter()
                .collect(),
        );
        assert_eq!(collector.push(hand).unwrap(), CollectorProgress::Complete);
    }

    #[test]
    fn test_reading_json_contract() {
        let reading: SensorReading = serde_json::from_str(
            r#"{"status": "ERROR", "voc": {}, "environment": {"temperature": 24.0}}"#,
        )
        .unwrap();
        assert_eq!(reading.status, ReadStatus::Error);
        assert_eq!(reading.environment.get("temperature"), Some(&24.0));
    }
}

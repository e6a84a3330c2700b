//! Signal Validator for Raw VOC Samples

use crate::error::ValidationError;
use feature_engine::Sample;
use serde::{Deserialize, Serialize};

/// Validation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Magnitude above which a channel counts as active
    pub active_threshold: f64,
    /// Minimum number of active channels per sample
    pub min_active_sensors: usize,
    /// Minimum population variance across channel readings
    pub min_variance: f64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            active_threshold: 0.5,
            min_active_sensors: 4,
            min_variance: 0.01,
        }
    }
}

/// Result of validation
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// Whether the sample carries a usable signal
    pub valid: bool,
    /// List of validation errors
    pub errors: Vec<ValidationError>,
    /// Number of channels with a finite reading
    pub channels_checked: usize,
}

impl ValidationResult {
    /// Create a valid result
    pub fn valid(channels_checked: usize) -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            channels_checked,
        }
    }

    /// Create an invalid result with errors
    pub fn invalid(errors: Vec<ValidationError>, channels_checked: usize) -> Self {
        Self {
            valid: false,
            errors,
            channels_checked,
        }
    }
}

/// Decides whether a raw sample reflects a hand over powered sensors
pub struct SignalValidator {
    config: ValidationConfig,
}

impl SignalValidator {
    /// Create a new validator with given config
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Validate a sample, collecting every failed check
    pub fn validate(&self, sample: &Sample) -> ValidationResult {
        let values: Vec<f64> = sample
            .iter()
            .filter_map(|(_, v)| v.filter(|v| v.is_finite()))
            .collect();

        if values.is_empty() {
            return ValidationResult::invalid(vec![ValidationError::EmptySample], 0);
        }

        let mut errors = Vec::new();

        let active = values
            .iter()
            .filter(|v| v.abs() > self.config.active_threshold)
            .count();
        if active < self.config.min_active_sensors {
            errors.push(ValidationError::TooFewActiveSensors {
                active,
                required: self.config.min_active_sensors,
            });
        }

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        if variance < self.config.min_variance {
            errors.push(ValidationError::FlatSignal {
                variance,
                min: self.config.min_variance,
            });
        }

        if errors.is_empty() {
            ValidationResult::valid(values.len())
        } else {
            ValidationResult::invalid(errors, values.len())
        }
    }

    /// Validate a sample, failing on the first problem
    pub fn check(&self, sample: &Sample) -> Result<(), ValidationError> {
        match self.validate(sample).errors.into_iter().next() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl Default for SignalValidator {
    fn default() -> Self {
        Self::new(ValidationConfig::default())
    }
}

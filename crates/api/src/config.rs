//! Service configuration
//!
//! Layered from serde defaults, an optional `voc-verify.toml` in the working
//! directory, and `VOC_*` environment variables (e.g. `VOC_SENSOR_MODE=12`).

use ::config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use verification::VerificationConfig;

/// Sensor modes with trained artifact sets
pub const SENSOR_MODES: [u32; 2] = [6, 12];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub sensor_mode: u32,
    pub models_root: PathBuf,
    pub threshold_percent: f64,
    pub flush_duration_secs: u64,
    pub samples_per_round: usize,
    /// Rounds per attempt; derived from the sensor mode when unset
    pub rounds: Option<usize>,
    pub bind_addr: String,
    pub json_logs: bool,
    pub users_file: Option<PathBuf>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            sensor_mode: 6,
            models_root: PathBuf::from("models"),
            threshold_percent: 70.0,
            flush_duration_secs: 30,
            samples_per_round: 10,
            rounds: None,
            bind_addr: "0.0.0.0:8080".to_string(),
            json_logs: false,
            users_file: None,
        }
    }
}

impl ServiceConfig {
    /// Load from `voc-verify.toml` (if present) and the environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("voc-verify")
    }

    /// Load from the named file (extension optional) and the environment
    pub fn load_from(file: &str) -> Result<Self, ConfigError> {
        let config: ServiceConfig = Config::builder()
            .add_source(File::with_name(file).required(false))
            .add_source(Environment::with_prefix("VOC").try_parsing(true))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !SENSOR_MODES.contains(&self.sensor_mode) {
            return Err(ConfigError::Invalid(format!(
                "sensor_mode must be one of {:?}, got {}",
                SENSOR_MODES, self.sensor_mode
            )));
        }
        if !(0.0..=100.0).contains(&self.threshold_percent) {
            return Err(ConfigError::Invalid(format!(
                "threshold_percent {} outside 0..=100",
                self.threshold_percent
            )));
        }
        if self.samples_per_round == 0 || self.rounds() == 0 {
            return Err(ConfigError::Invalid(
                "samples_per_round and rounds must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Rounds per attempt: six for the 12-sensor rig, ten otherwise
    pub fn rounds(&self) -> usize {
        self.rounds
            .unwrap_or(if self.sensor_mode == 12 { 6 } else { 10 })
    }

    /// Artifact directory for the configured sensor mode
    pub fn model_dir(&self) -> PathBuf {
        inference_engine::ModelBundle::mode_dir(&self.models_root, self.sensor_mode)
    }

    pub fn verification(&self) -> VerificationConfig {
        VerificationConfig {
            threshold_percent: self.threshold_percent,
            flush_duration: Duration::from_secs(self.flush_duration_secs),
        }
    }
}

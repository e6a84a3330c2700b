//! Validation Error Types

use thiserror::Error;

/// Errors during sensor read validation and batching
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Too few channels carried a meaningful signal
    #[error("Only {active} active sensors, need at least {required}")]
    TooFewActiveSensors { active: usize, required: usize },

    /// Readings are flat across channels
    #[error("Signal variance {variance:.4} below minimum {min:.4}")]
    FlatSignal { variance: f64, min: f64 },

    /// Sample contained no usable readings
    #[error("Sample contains no readings")]
    EmptySample,

    /// Invalid collector configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// All rounds were already collected
    #[error("All {0} rounds already collected")]
    CollectionComplete(usize),
}

//! Identity Verification Engine
//!
//! Runs the classifier ensemble over one or more rounds of extracted
//! features, fuses the per-model and per-round probability distributions,
//! and produces an auditable verification decision.

mod collaborators;
mod engine;
mod fusion;
mod result;

pub use collaborators::{ChamberPurge, NoPurge, UserDirectory};
pub use engine::{VerificationConfig, VerificationEngine};
pub use fusion::{mean_distribution, to_percent};
pub use result::{ModelVote, RoundDetail, VerificationResult, VerificationStatus, NO_MATCH, UNKNOWN_USER};

use feature_engine::FeatureError;
use inference_engine::InferenceError;
use thiserror::Error;

/// Errors surfaced by verification
#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("No rounds supplied for verification")]
    EmptyRounds,
    /// An artifact is absent or cannot be loaded; the message names the
    /// path and, for unreadable files, the reason
    #[error("Model artifact missing or unreadable: {0}")]
    ModelArtifactMissing(String),
    #[error("Inference error: {0}")]
    Inference(InferenceError),
}

impl From<FeatureError> for VerificationError {
    fn from(err: FeatureError) -> Self {
        match err {
            FeatureError::InvalidInput(msg) => VerificationError::InvalidInput(msg),
        }
    }
}

impl From<InferenceError> for VerificationError {
    fn from(err: InferenceError) -> Self {
        match err {
            InferenceError::ArtifactMissing { path } => VerificationError::ModelArtifactMissing(path),
            InferenceError::ArtifactInvalid { path, reason } => {
                VerificationError::ModelArtifactMissing(format!("{path}: {reason}"))
            }
            other => VerificationError::Inference(other),
        }
    }
}

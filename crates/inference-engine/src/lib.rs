//! Ensemble Inference Engine
//!
//! Loads the trained classifier ensemble for one sensor mode and evaluates
//! each member against aligned feature vectors. Tree ensembles, boosted trees
//! and MLPs are evaluated natively from JSON artifacts; ONNX exports run
//! through tract.

mod boosting;
mod bundle;
mod classifier;
mod mlp;
mod onnx;
mod scaler;
mod schema;
mod tree;

pub use boosting::{BoostedTree, GradientBoosted, Objective};
pub use bundle::{EnsembleMember, ModelBundle, ENSEMBLE_MEMBERS};
pub use classifier::{argmax, Classifier};
pub use mlp::{Activation, DenseLayer, Mlp};
pub use onnx::OnnxClassifier;
pub use scaler::{Pipeline, StandardScaler};
pub use schema::{FeatureOrder, LabelEncoder};
pub use tree::{DecisionTree, TreeEnsemble, TreeNode};

use thiserror::Error;

/// Errors during artifact loading and inference
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Model artifact missing: {path}")]
    ArtifactMissing { path: String },
    #[error("Model artifact {path} is invalid: {reason}")]
    ArtifactInvalid { path: String, reason: String },
    #[error("Inference failed: {0}")]
    InferenceFailed(String),
    #[error("Invalid input shape: expected {expected}, got {actual}")]
    InvalidInputShape { expected: usize, actual: usize },
}

impl InferenceError {
    pub(crate) fn invalid(path: impl Into<String>, reason: impl Into<String>) -> Self {
        InferenceError::ArtifactInvalid {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

//! ONNX-exported classifiers executed with tract
//!
//! Exports must emit probabilities as a dense float tensor. skl2onnx wraps
//! them in a ZipMap by default, which tract cannot run; convert with
//! `options={"zipmap": False}`. When the graph has several outputs the second
//! one is taken, matching the `[label, probabilities]` layout of scikit-learn
//! converters.

use crate::classifier::{check_width, Classifier};
use crate::InferenceError;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tract_onnx::prelude::*;

type OnnxPlan = TypedRunnableModel<TypedModel>;

pub struct OnnxClassifier {
    plan: OnnxPlan,
    path: PathBuf,
    n_features: usize,
    n_classes: usize,
}

impl OnnxClassifier {
    /// Load and optimize a graph for a `[1, n_features]` float input
    pub fn load(path: &Path, n_features: usize, n_classes: usize) -> Result<Self, InferenceError> {
        info!("Loading ONNX classifier from {}", path.display());

        let invalid = |e: TractError| InferenceError::invalid(path.display().to_string(), e.to_string());

        let plan = tract_onnx::onnx()
            .model_for_path(path)
            .and_then(|model| model.with_input_fact(0, f32::fact([1, n_features]).into()))
            .and_then(|model| model.into_optimized())
            .and_then(|model| model.into_runnable())
            .map_err(invalid)?;

        Ok(Self {
            plan,
            path: path.to_path_buf(),
            n_features,
            n_classes,
        })
    }
}

impl Classifier for OnnxClassifier {
    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn n_features(&self) -> Option<usize> {
        Some(self.n_features)
    }

    fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>, InferenceError> {
        check_width(self.n_features, features)?;

        let failed = |e: TractError| InferenceError::InferenceFailed(e.to_string());

        let data: Vec<f32> = features.iter().map(|&v| v as f32).collect();
        let input: Tensor = tract_ndarray::Array2::from_shape_vec((1, self.n_features), data)
            .map_err(|e| InferenceError::InferenceFailed(e.to_string()))?
            .into();

        let outputs = self.plan.run(tvec!(input.into())).map_err(failed)?;
        let probs = outputs
            .get(if outputs.len() > 1 { 1 } else { 0 })
            .ok_or_else(|| InferenceError::InferenceFailed("graph produced no outputs".to_string()))?;

        let proba: Vec<f64> = probs
            .to_array_view::<f32>()
            .map_err(failed)?
            .iter()
            .map(|&p| p as f64)
            .collect();

        debug!("ONNX {} produced {} probabilities", self.path.display(), proba.len());

        if proba.len() != self.n_classes {
            return Err(InferenceError::InferenceFailed(format!(
                "expected {} class probabilities, got {}",
                self.n_classes,
                proba.len()
            )));
        }
        Ok(proba)
    }
}

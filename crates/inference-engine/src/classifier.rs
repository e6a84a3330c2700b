//! Classifier capability shared by every ensemble member

use crate::InferenceError;

/// A trained model mapping an aligned feature vector to a probability
/// distribution over the label encoder's classes.
pub trait Classifier: Send + Sync {
    /// Size of the class index space
    fn n_classes(&self) -> usize;

    /// Expected input width, when the artifact records it
    fn n_features(&self) -> Option<usize>;

    /// Class-probability distribution for one aligned feature vector
    fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>, InferenceError>;
}

impl<C: Classifier + ?Sized> Classifier for Box<C> {
    fn n_classes(&self) -> usize {
        (**self).n_classes()
    }

    fn n_features(&self) -> Option<usize> {
        (**self).n_features()
    }

    fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>, InferenceError> {
        (**self).predict_proba(features)
    }
}

/// Index of the largest value; the first one wins ties and NaN never wins
pub fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

pub(crate) fn check_width(expected: usize, features: &[f64]) -> Result<(), InferenceError> {
    if features.len() != expected {
        return Err(InferenceError::InvalidInputShape {
            expected,
            actual: features.len(),
        });
    }
    Ok(())
}

pub(crate) fn softmax(logits: &[f64]) -> Vec<f64> {
    let max = logits.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = logits.iter().map(|&z| (z - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

pub(crate) fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// Scale non-negative weights to sum to one; an all-zero row stays zero
pub(crate) fn normalize(weights: &[f64]) -> Vec<f64> {
    let sum: f64 = weights.iter().sum();
    let norm = if sum == 0.0 { 1.0 } else { sum };
    weights.iter().map(|w| w / norm).collect()
}

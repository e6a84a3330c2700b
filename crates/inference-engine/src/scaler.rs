//! Input standardization and the normalize-then-predict pipeline

use crate::classifier::Classifier;
use crate::InferenceError;
use feature_engine::safe_float;
use serde::{Deserialize, Serialize};

/// Per-feature centering and scaling frozen at training time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    pub fn validate(&self) -> Result<(), String> {
        if self.mean.len() != self.scale.len() {
            return Err(format!(
                "mean has {} entries but scale has {}",
                self.mean.len(),
                self.scale.len()
            ));
        }
        Ok(())
    }

    pub fn width(&self) -> usize {
        self.mean.len()
    }

    /// `(x - mean) / scale`, treating a zero scale as 1
    pub fn transform(&self, features: &[f64]) -> Result<Vec<f64>, InferenceError> {
        if features.len() != self.width() {
            return Err(InferenceError::InvalidInputShape {
                expected: self.width(),
                actual: features.len(),
            });
        }

        Ok(features
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (m, s))| {
                let s = if *s == 0.0 { 1.0 } else { *s };
                safe_float(Some((x - m) / s))
            })
            .collect())
    }
}

/// A classifier preceded by a standardization step
pub struct Pipeline {
    scaler: StandardScaler,
    model: Box<dyn Classifier>,
}

impl Pipeline {
    pub fn new(scaler: StandardScaler, model: Box<dyn Classifier>) -> Self {
        Self { scaler, model }
    }
}

impl Classifier for Pipeline {
    fn n_classes(&self) -> usize {
        self.model.n_classes()
    }

    fn n_features(&self) -> Option<usize> {
        Some(self.scaler.width())
    }

    fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>, InferenceError> {
        let scaled = self.scaler.transform(features)?;
        self.model.predict_proba(&scaled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reports class 0 when its first input is negative
    struct SignProbe;

    impl Classifier for SignProbe {
        fn n_classes(&self) -> usize {
            2
        }

        fn n_features(&self) -> Option<usize> {
            None
        }

        fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>, InferenceError> {
            Ok(if features[0] < 0.0 { vec![1.0, 0.0] } else { vec![0.0, 1.0] })
        }
    }

    #[test]
    fn test_transform() {
        let scaler = StandardScaler {
            mean: vec![10.0, 0.0],
            scale: vec![2.0, 0.0],
        };
        assert_eq!(scaler.transform(&[14.0, 3.0]).unwrap(), vec![2.0, 3.0]);
        assert!(scaler.transform(&[1.0]).is_err());
    }

    #[test]
    fn test_pipeline_scales_before_predicting() {
        let scaler = StandardScaler {
            mean: vec![5.0],
            scale: vec![1.0],
        };
        let pipeline = Pipeline::new(scaler, Box::new(SignProbe));

        // raw 3.0 is positive, but below the training mean
        assert_eq!(pipeline.predict_proba(&[3.0]).unwrap(), vec![1.0, 0.0]);
        assert_eq!(pipeline.n_features(), Some(1));
    }
}

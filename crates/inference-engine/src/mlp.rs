//! Feed-forward neural network classifier

use crate::classifier::{check_width, sigmoid, softmax, Classifier};
use crate::InferenceError;
use serde::{Deserialize, Serialize};

/// Hidden-layer activation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    #[default]
    Relu,
    Tanh,
    Logistic,
    Identity,
}

impl Activation {
    fn apply(self, z: f64) -> f64 {
        match self {
            Activation::Relu => z.max(0.0),
            Activation::Tanh => z.tanh(),
            Activation::Logistic => sigmoid(z),
            Activation::Identity => z,
        }
    }
}

/// Dense layer; `weights[i][j]` connects input `i` to output `j`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenseLayer {
    pub weights: Vec<Vec<f64>>,
    pub biases: Vec<f64>,
}

impl DenseLayer {
    fn inputs(&self) -> usize {
        self.weights.len()
    }

    fn outputs(&self) -> usize {
        self.biases.len()
    }

    fn forward(&self, input: &[f64]) -> Vec<f64> {
        let mut out = self.biases.clone();
        for (x, row) in input.iter().zip(&self.weights) {
            for (o, w) in out.iter_mut().zip(row) {
                *o += x * w;
            }
        }
        out
    }
}

/// Multi-layer perceptron with softmax (or single-unit logistic) output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mlp {
    pub n_classes: usize,
    #[serde(default)]
    pub activation: Activation,
    pub layers: Vec<DenseLayer>,
}

impl Mlp {
    pub fn validate(&self) -> Result<(), String> {
        let last = self.layers.last().ok_or("network has no layers")?;

        for (i, layer) in self.layers.iter().enumerate() {
            if layer.inputs() == 0 || layer.outputs() == 0 {
                return Err(format!("layer {i} is empty"));
            }
            if let Some(row) = layer.weights.iter().find(|r| r.len() != layer.outputs()) {
                return Err(format!(
                    "layer {i} has a weight row of width {}, expected {}",
                    row.len(),
                    layer.outputs()
                ));
            }
            if let Some(next) = self.layers.get(i + 1) {
                if next.inputs() != layer.outputs() {
                    return Err(format!(
                        "layer {} expects {} inputs but layer {i} emits {}",
                        i + 1,
                        next.inputs(),
                        layer.outputs()
                    ));
                }
            }
        }

        let binary_logistic = last.outputs() == 1 && self.n_classes == 2;
        if last.outputs() != self.n_classes && !binary_logistic {
            return Err(format!(
                "output layer has {} units for {} classes",
                last.outputs(),
                self.n_classes
            ));
        }
        Ok(())
    }

    fn input_width(&self) -> usize {
        self.layers.first().map(DenseLayer::inputs).unwrap_or(0)
    }
}

impl Classifier for Mlp {
    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn n_features(&self) -> Option<usize> {
        Some(self.input_width())
    }

    fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>, InferenceError> {
        check_width(self.input_width(), features)?;

        let (output, hidden) = self
            .layers
            .split_last()
            .ok_or_else(|| InferenceError::InferenceFailed("network has no layers".to_string()))?;

        let mut activations = features.to_vec();
        for layer in hidden {
            activations = layer
                .forward(&activations)
                .into_iter()
                .map(|z| self.activation.apply(z))
                .collect();
        }

        let logits = output.forward(&activations);
        if logits.len() == 1 {
            let p = sigmoid(logits[0]);
            Ok(vec![1.0 - p, p])
        } else {
            Ok(softmax(&logits))
        }
    }
}

//! Gradient-boosted tree classifier (XGBoost-style dump)

use crate::classifier::{check_width, sigmoid, softmax, Classifier};
use crate::InferenceError;
use serde::{Deserialize, Serialize};

/// Output transform applied to the summed margins
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    /// One margin per class, softmax across classes
    #[default]
    Softprob,
    /// Two classes, one margin, logistic link
    Logistic,
}

/// A node of a regression tree
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BoostedNode {
    /// Go to `left` when `x[feature] < threshold`, else `right`
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf { leaf: f64 },
}

/// One boosting round's tree for one class
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoostedTree {
    /// Class whose margin this tree contributes to
    #[serde(default)]
    pub class: usize,
    pub nodes: Vec<BoostedNode>,
}

impl BoostedTree {
    fn score(&self, features: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                BoostedNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if features[*feature] < *threshold {
                        *left
                    } else {
                        *right
                    };
                }
                BoostedNode::Leaf { leaf } => return *leaf,
            }
        }
    }
}

/// Additive boosted-tree model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoosted {
    pub n_classes: usize,
    pub n_features: usize,
    #[serde(default)]
    pub objective: Objective,
    /// Raw margin added to every class before the output transform
    #[serde(default)]
    pub base_margin: f64,
    pub trees: Vec<BoostedTree>,
}

impl GradientBoosted {
    pub fn validate(&self) -> Result<(), String> {
        let margins = match self.objective {
            Objective::Softprob => self.n_classes,
            Objective::Logistic if self.n_classes == 2 => 1,
            Objective::Logistic => {
                return Err(format!("logistic objective needs 2 classes, got {}", self.n_classes))
            }
        };
        if self.trees.is_empty() {
            return Err("model has no trees".to_string());
        }

        for (t, tree) in self.trees.iter().enumerate() {
            if tree.class >= margins {
                return Err(format!("tree {t} targets class {} of {margins}", tree.class));
            }
            if tree.nodes.is_empty() {
                return Err(format!("tree {t} has no nodes"));
            }
            for (i, node) in tree.nodes.iter().enumerate() {
                if let BoostedNode::Split {
                    feature,
                    left,
                    right,
                    ..
                } = node
                {
                    if *feature >= self.n_features {
                        return Err(format!("tree {t} node {i} splits on feature {feature}"));
                    }
                    for child in [*left, *right] {
                        if child <= i || child >= tree.nodes.len() {
                            return Err(format!("tree {t} node {i} has invalid child {child}"));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

impl Classifier for GradientBoosted {
    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn n_features(&self) -> Option<usize> {
        Some(self.n_features)
    }

    fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>, InferenceError> {
        check_width(self.n_features, features)?;

        match self.objective {
            Objective::Softprob => {
                let mut margins = vec![self.base_margin; self.n_classes];
                for tree in &self.trees {
                    margins[tree.class] += tree.score(features);
                }
                Ok(softmax(&margins))
            }
            Objective::Logistic => {
                let margin = self.base_margin
                    + self.trees.iter().map(|t| t.score(features)).sum::<f64>();
                let p = sigmoid(margin);
                Ok(vec![1.0 - p, p])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stump(class: usize, threshold: f64, left: f64, right: f64) -> BoostedTree {
        BoostedTree {
            class,
            nodes: vec![
                BoostedNode::Split {
                    feature: 0,
                    threshold,
                    left: 1,
                    right: 2,
                },
                BoostedNode::Leaf { leaf: left },
                BoostedNode::Leaf { leaf: right },
            ],
        }
    }

    #[test]
    fn test_softprob_margins() {
        let model = GradientBoosted {
            n_classes: 2,
            n_features: 1,
            objective: Objective::Softprob,
            base_margin: 0.5,
            trees: vec![stump(0, 1.0, 2.0, -2.0), stump(1, 1.0, -2.0, 2.0)],
        };

        let low = model.predict_proba(&[0.0]).unwrap();
        let expected = 1.0 / (1.0 + (-4.0f64).exp());
        assert!((low[0] - expected).abs() < 1e-12);

        // threshold is exclusive
        let at = model.predict_proba(&[1.0]).unwrap();
        assert!(at[1] > at[0]);
    }

    #[test]
    fn test_logistic_binary() {
        let model = GradientBoosted {
            n_classes: 2,
            n_features: 1,
            objective: Objective::Logistic,
            base_margin: 0.0,
            trees: vec![stump(0, 0.0, 0.0, 0.0)],
        };
        assert!(model.validate().is_ok());
        assert_eq!(model.predict_proba(&[3.0]).unwrap(), vec![0.5, 0.5]);
    }

    #[test]
    fn test_validate_class_range() {
        let model = GradientBoosted {
            n_classes: 2,
            n_features: 1,
            objective: Objective::Softprob,
            base_margin: 0.0,
            trees: vec![stump(2, 0.0, 1.0, 1.0)],
        };
        assert!(model.validate().is_err());
    }
}

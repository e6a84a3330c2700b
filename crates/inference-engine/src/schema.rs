//! Training-time schemas: feature column order and identity labels

use feature_engine::{safe_float, FeatureVector};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Column order the classifiers were trained with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureOrder {
    features: Vec<String>,
}

impl FeatureOrder {
    pub fn new(features: Vec<String>) -> Self {
        Self { features }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.features.is_empty() {
            return Err("feature order is empty".to_string());
        }
        let mut seen = HashSet::with_capacity(self.features.len());
        if let Some(dup) = self.features.iter().find(|f| !seen.insert(f.as_str())) {
            return Err(format!("feature {dup} listed twice"));
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.features
    }

    /// Dense vector in training column order; absent keys become 0.0
    pub fn align(&self, features: &FeatureVector) -> Vec<f64> {
        self.features
            .iter()
            .map(|name| safe_float(features.get(name)))
            .collect()
    }

    /// How many schema columns the vector does not provide
    pub fn missing(&self, features: &FeatureVector) -> usize {
        self.features
            .iter()
            .filter(|name| features.get(name).is_none())
            .count()
    }
}

/// Mapping between class index and identity id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    pub fn new(classes: Vec<String>) -> Self {
        Self { classes }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.classes.is_empty() {
            return Err("label encoder has no classes".to_string());
        }
        let mut seen = HashSet::with_capacity(self.classes.len());
        if let Some(dup) = self.classes.iter().find(|c| !seen.insert(c.as_str())) {
            return Err(format!("class {dup} listed twice"));
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Identity id for a class index
    pub fn inverse_transform(&self, index: usize) -> Option<&str> {
        self.classes.get(index).map(String::as_str)
    }
}

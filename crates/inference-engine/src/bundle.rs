//! Model bundle: the complete, immutable artifact set for one sensor mode

use crate::boosting::GradientBoosted;
use crate::classifier::Classifier;
use crate::mlp::Mlp;
use crate::onnx::OnnxClassifier;
use crate::scaler::{Pipeline, StandardScaler};
use crate::schema::{FeatureOrder, LabelEncoder};
use crate::tree::TreeEnsemble;
use crate::InferenceError;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Ensemble members in evaluation order: (display name, artifact stem)
pub const ENSEMBLE_MEMBERS: [(&str, &str); 5] = [
    ("RF", "rf_model"),
    ("ET", "et_model"),
    ("DT", "dt_model"),
    ("XGB", "xgb_model"),
    ("ANN", "ann_model"),
];

/// Member that receives standardized input
const SCALED_MEMBER: &str = "ann_model";

const SCALER_FILE: &str = "ann_scaler.json";
const LABEL_ENCODER_FILE: &str = "label_encoder.json";
const FEATURE_ORDER_FILE: &str = "feature_order.json";

/// JSON classifier artifact, tagged by model family
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum ModelArtifact {
    #[serde(alias = "random_forest", alias = "extra_trees", alias = "decision_tree")]
    TreeEnsemble(TreeEnsemble),
    #[serde(alias = "xgboost")]
    GradientBoosting(GradientBoosted),
    Mlp(Mlp),
}

impl ModelArtifact {
    fn into_classifier(self) -> Result<Box<dyn Classifier>, String> {
        Ok(match self {
            ModelArtifact::TreeEnsemble(model) => {
                model.validate()?;
                Box::new(model)
            }
            ModelArtifact::GradientBoosting(model) => {
                model.validate()?;
                Box::new(model)
            }
            ModelArtifact::Mlp(model) => {
                model.validate()?;
                Box::new(model)
            }
        })
    }
}

/// A named ensemble member
pub struct EnsembleMember {
    name: String,
    classifier: Box<dyn Classifier>,
}

impl EnsembleMember {
    pub fn new(name: impl Into<String>, classifier: Box<dyn Classifier>) -> Self {
        Self {
            name: name.into(),
            classifier,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }
}

/// Loaded classifiers plus the schemas they share. Never mutated after
/// construction; replace the whole bundle to pick up retrained models.
pub struct ModelBundle {
    feature_order: FeatureOrder,
    label_encoder: LabelEncoder,
    members: Vec<EnsembleMember>,
    source: Option<PathBuf>,
    loaded_at: DateTime<Utc>,
}

impl ModelBundle {
    /// Artifact directory for a sensor mode, e.g. `models/6_sensors`
    pub fn mode_dir(models_root: impl AsRef<Path>, sensor_mode: u32) -> PathBuf {
        models_root.as_ref().join(format!("{sensor_mode}_sensors"))
    }

    /// Assemble a bundle from already-built parts, checking that every member
    /// agrees with the shared schemas.
    pub fn from_parts(
        feature_order: FeatureOrder,
        label_encoder: LabelEncoder,
        members: Vec<EnsembleMember>,
    ) -> Result<Self, InferenceError> {
        feature_order
            .validate()
            .map_err(|e| InferenceError::invalid(FEATURE_ORDER_FILE, e))?;
        label_encoder
            .validate()
            .map_err(|e| InferenceError::invalid(LABEL_ENCODER_FILE, e))?;

        if members.is_empty() {
            return Err(InferenceError::invalid("ensemble", "no members"));
        }

        for member in &members {
            let classifier = member.classifier();
            if classifier.n_classes() != label_encoder.len() {
                return Err(InferenceError::invalid(
                    member.name(),
                    format!(
                        "predicts {} classes but the label encoder has {}",
                        classifier.n_classes(),
                        label_encoder.len()
                    ),
                ));
            }
            if let Some(width) = classifier.n_features() {
                if width != feature_order.len() {
                    return Err(InferenceError::invalid(
                        member.name(),
                        format!(
                            "expects {width} features but the feature order has {}",
                            feature_order.len()
                        ),
                    ));
                }
            }
        }

        Ok(Self {
            feature_order,
            label_encoder,
            members,
            source: None,
            loaded_at: Utc::now(),
        })
    }

    /// Load every artifact from `dir`.
    ///
    /// Classifiers are read from `<stem>.json`, falling back to `<stem>.onnx`.
    /// The ANN member is wrapped with the persisted scaler.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, InferenceError> {
        let dir = dir.as_ref();
        info!("Loading model bundle from {}", dir.display());

        let feature_order: FeatureOrder = read_json(&dir.join(FEATURE_ORDER_FILE))?;
        let label_encoder: LabelEncoder = read_json(&dir.join(LABEL_ENCODER_FILE))?;

        let scaler_path = dir.join(SCALER_FILE);
        let scaler: StandardScaler = read_json(&scaler_path)?;
        scaler
            .validate()
            .map_err(|e| InferenceError::invalid(scaler_path.display().to_string(), e))?;

        let mut members = Vec::with_capacity(ENSEMBLE_MEMBERS.len());
        for (name, stem) in ENSEMBLE_MEMBERS {
            let classifier = load_classifier(dir, stem, feature_order.len(), label_encoder.len())?;
            let classifier = if stem == SCALED_MEMBER {
                Box::new(Pipeline::new(scaler.clone(), classifier)) as Box<dyn Classifier>
            } else {
                classifier
            };
            debug!("Loaded ensemble member {} ({})", name, stem);
            members.push(EnsembleMember::new(name, classifier));
        }

        let mut bundle = Self::from_parts(feature_order, label_encoder, members)?;
        bundle.source = Some(dir.to_path_buf());

        info!(
            "Model bundle ready: {} members, {} features, {} identities",
            bundle.members.len(),
            bundle.feature_order.len(),
            bundle.label_encoder.len()
        );
        Ok(bundle)
    }

    pub fn feature_order(&self) -> &FeatureOrder {
        &self.feature_order
    }

    pub fn label_encoder(&self) -> &LabelEncoder {
        &self.label_encoder
    }

    pub fn members(&self) -> &[EnsembleMember] {
        &self.members
    }

    /// Directory the bundle was loaded from, if any
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }
}

fn load_classifier(
    dir: &Path,
    stem: &str,
    n_features: usize,
    n_classes: usize,
) -> Result<Box<dyn Classifier>, InferenceError> {
    let json_path = dir.join(format!("{stem}.json"));
    if json_path.is_file() {
        let artifact: ModelArtifact = read_json(&json_path)?;
        return artifact
            .into_classifier()
            .map_err(|e| InferenceError::invalid(json_path.display().to_string(), e));
    }

    let onnx_path = dir.join(format!("{stem}.onnx"));
    if onnx_path.is_file() {
        return Ok(Box::new(OnnxClassifier::load(&onnx_path, n_features, n_classes)?));
    }

    Err(InferenceError::ArtifactMissing {
        path: json_path.display().to_string(),
    })
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, InferenceError> {
    let display = path.display().to_string();
    let bytes = fs::read(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => InferenceError::ArtifactMissing { path: display.clone() },
        _ => InferenceError::ArtifactMissing {
            path: format!("{display} ({e})"),
        },
    })?;
    serde_json::from_slice(&bytes).map_err(|e| InferenceError::invalid(display, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn stump_forest(kind: &str) -> serde_json::Value {
        json!({
            "kind": kind,
            "n_classes": 2,
            "n_features": 2,
            "trees": [{"nodes": [
                {"feature": 0, "threshold": 5.0, "left": 1, "right": 2},
                {"value": [9.0, 1.0]},
                {"value": [1.0, 9.0]}
            ]}]
        })
    }

    fn write_bundle(dir: &Path) {
        let write = |name: &str, value: serde_json::Value| {
            fs::write(dir.join(name), serde_json::to_vec(&value).unwrap()).unwrap();
        };
        write("feature_order.json", json!(["mq6_1_mean", "mq6_1_std"]));
        write("label_encoder.json", json!({"classes": ["1001", "1002"]}));
        write("ann_scaler.json", json!({"mean": [5.0, 0.0], "scale": [1.0, 1.0]}));
        write("rf_model.json", stump_forest("random_forest"));
        write("et_model.json", stump_forest("extra_trees"));
        write("dt_model.json", stump_forest("decision_tree"));
        write(
            "xgb_model.json",
            json!({
                "kind": "xgboost",
                "n_classes": 2,
                "n_features": 2,
                "trees": [
                    {"class": 0, "nodes": [
                        {"feature": 0, "threshold": 5.0, "left": 1, "right": 2},
                        {"leaf": 1.0}, {"leaf": -1.0}]},
                    {"class": 1, "nodes": [{"leaf": 0.0}]}
                ]
            }),
        );
        write(
            "ann_model.json",
            json!({
                "kind": "mlp",
                "n_classes": 2,
                "layers": [{"weights": [[-1.0, 1.0], [0.0, 0.0]], "biases": [0.0, 0.0]}]
            }),
        );
    }

    #[test]
    fn test_load_full_bundle() {
        let dir = tempfile::tempdir().unwrap();
        write_bundle(dir.path());

        let bundle = ModelBundle::load(dir.path()).unwrap();
        let names: Vec<_> = bundle.members().iter().map(|m| m.name()).collect();
        assert_eq!(names, vec!["RF", "ET", "DT", "XGB", "ANN"]);
        assert_eq!(bundle.source(), Some(dir.path()));

        // below the split: trees favour class 0, and the scaled ANN input is negative
        for member in bundle.members() {
            let p = member.classifier().predict_proba(&[2.0, 0.0]).unwrap();
            assert!(p[0] > p[1], "{} favoured class 1", member.name());
        }
    }

    #[test]
    fn test_missing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        write_bundle(dir.path());
        fs::remove_file(dir.path().join("xgb_model.json")).unwrap();

        match ModelBundle::load(dir.path()) {
            Err(InferenceError::ArtifactMissing { path }) => assert!(path.ends_with("xgb_model.json")),
            other => panic!("expected missing artifact, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = ModelBundle::load(dir.path().join("12_sensors")).err().unwrap();
        assert!(matches!(err, InferenceError::ArtifactMissing { .. }));
    }

    #[test]
    fn test_class_count_mismatch_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write_bundle(dir.path());
        fs::write(
            dir.path().join("label_encoder.json"),
            br#"{"classes": ["1001", "1002", "1003"]}"#,
        )
        .unwrap();

        let err = ModelBundle::load(dir.path()).err().unwrap();
        assert!(matches!(err, InferenceError::ArtifactInvalid { .. }));
    }

    #[test]
    fn test_scaler_width_mismatch_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write_bundle(dir.path());
        fs::write(dir.path().join("ann_scaler.json"), br#"{"mean": [0.0], "scale": [1.0]}"#).unwrap();

        let err = ModelBundle::load(dir.path()).err().unwrap();
        assert!(matches!(err, InferenceError::ArtifactInvalid { .. }));
    }

    #[test]
    fn test_corrupt_json_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write_bundle(dir.path());
        fs::write(dir.path().join("dt_model.json"), b"{\"kind\": \"svm\"}").unwrap();

        let err = ModelBundle::load(dir.path()).err().unwrap();
        assert!(matches!(err, InferenceError::ArtifactInvalid { .. }));
    }

    #[test]
    fn test_mode_dir() {
        assert_eq!(
            ModelBundle::mode_dir("models", 12),
            PathBuf::from("models/12_sensors")
        );
    }
}

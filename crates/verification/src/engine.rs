//! Verification Engine Implementation

use crate::collaborators::{ChamberPurge, NoPurge, UserDirectory};
use crate::fusion::{mean_distribution, to_percent};
use crate::result::{
    ModelVote, RoundDetail, VerificationResult, VerificationStatus, NO_MATCH, UNKNOWN_USER,
};
use crate::VerificationError;
use feature_engine::{extract_features, safe_float, FeatureVector, SampleBatch};
use inference_engine::{argmax, InferenceError, LabelEncoder, ModelBundle};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Decision configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationConfig {
    /// Minimum confidence percentage for a match (inclusive)
    pub threshold_percent: f64,
    /// Purge cycle requested after each attempt
    pub flush_duration: Duration,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            threshold_percent: 70.0,
            flush_duration: Duration::from_secs(30),
        }
    }
}

/// Fuses ensemble predictions over verification rounds.
///
/// The loaded [`ModelBundle`] sits behind a lock that is only held long
/// enough to clone or replace its `Arc`, so every `verify` call works on one
/// complete bundle even while a reload swaps in another.
pub struct VerificationEngine {
    bundle: RwLock<Arc<ModelBundle>>,
    source: Option<PathBuf>,
    users: Arc<dyn UserDirectory>,
    purge: Arc<dyn ChamberPurge>,
    config: VerificationConfig,
}

impl VerificationEngine {
    /// Create an engine around an already-loaded bundle
    pub fn new(bundle: ModelBundle, config: VerificationConfig) -> Self {
        info!(
            "Creating verification engine: {} members, threshold {}%",
            bundle.members().len(),
            config.threshold_percent
        );
        Self {
            source: bundle.source().map(Path::to_path_buf),
            bundle: RwLock::new(Arc::new(bundle)),
            users: Arc::new(HashMap::<String, String>::new()),
            purge: Arc::new(NoPurge),
            config,
        }
    }

    /// Load the bundle from an artifact directory
    pub fn load(dir: impl AsRef<Path>, config: VerificationConfig) -> Result<Self, VerificationError> {
        let bundle = ModelBundle::load(dir)?;
        Ok(Self::new(bundle, config))
    }

    /// Use `users` to resolve display names
    pub fn with_user_directory(mut self, users: Arc<dyn UserDirectory>) -> Self {
        self.users = users;
        self
    }

    /// Inform `purge` after every attempt
    pub fn with_purge(mut self, purge: Arc<dyn ChamberPurge>) -> Self {
        self.purge = purge;
        self
    }

    pub fn config(&self) -> &VerificationConfig {
        &self.config
    }

    /// The bundle currently in service
    pub fn bundle(&self) -> Arc<ModelBundle> {
        self.bundle
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the bundle in service; in-flight calls keep the old one
    pub fn swap_bundle(&self, bundle: ModelBundle) {
        let fresh = Arc::new(bundle);
        *self.bundle.write().unwrap_or_else(PoisonError::into_inner) = fresh;
    }

    /// Reload artifacts from the directory the engine was loaded from.
    ///
    /// On failure the previous bundle stays in service.
    pub fn reload(&self) -> Result<Arc<ModelBundle>, VerificationError> {
        let dir = self.source.as_ref().ok_or_else(|| {
            VerificationError::ModelArtifactMissing("engine has no artifact directory".to_string())
        })?;

        match ModelBundle::load(dir) {
            Ok(bundle) => {
                self.swap_bundle(bundle);
                metrics::counter!("model_reloads_total", "outcome" => "ok").increment(1);
                info!("Reloaded model bundle from {}", dir.display());
                Ok(self.bundle())
            }
            Err(e) => {
                metrics::counter!("model_reloads_total", "outcome" => "failed").increment(1);
                warn!("Reload from {} failed, keeping current bundle: {}", dir.display(), e);
                Err(e.into())
            }
        }
    }

    /// Extract features from each round's samples, then verify
    pub fn verify_batches(&self, batches: &[SampleBatch]) -> Result<VerificationResult, VerificationError> {
        if batches.is_empty() {
            return Err(VerificationError::EmptyRounds);
        }
        let rounds = batches
            .iter()
            .map(extract_features)
            .collect::<Result<Vec<_>, _>>()?;
        self.verify(&rounds)
    }

    /// Verify one attempt made of one feature vector per round
    pub fn verify(&self, rounds: &[FeatureVector]) -> Result<VerificationResult, VerificationError> {
        if rounds.is_empty() {
            return Err(VerificationError::EmptyRounds);
        }

        let start = Instant::now();
        let bundle = self.bundle();
        let outcome = self.evaluate(&bundle, rounds);

        metrics::histogram!("verification_duration_seconds").record(start.elapsed().as_secs_f64());
        let status = match &outcome {
            Ok(result) => result.status.as_str(),
            Err(_) => "error",
        };
        metrics::counter!("verification_attempts_total", "status" => status).increment(1);

        match &outcome {
            Ok(result) => info!(
                "Verification {}: confidence {}% over {} rounds",
                result.status.as_str(),
                result.confidence,
                rounds.len()
            ),
            Err(e) => warn!("Verification failed: {}", e),
        }

        self.purge.request_purge(self.config.flush_duration);
        outcome
    }

    fn evaluate(
        &self,
        bundle: &ModelBundle,
        rounds: &[FeatureVector],
    ) -> Result<VerificationResult, VerificationError> {
        let order = bundle.feature_order();
        let encoder = bundle.label_encoder();

        let mut round_distributions = Vec::with_capacity(rounds.len());
        let mut round_details = Vec::with_capacity(rounds.len());

        for (idx, features) in rounds.iter().enumerate() {
            let missing = order.missing(features);
            if missing > 0 {
                debug!("Round {}: {} of {} features absent, using 0.0", idx + 1, missing, order.len());
            }
            let aligned = order.align(features);

            let mut distributions = Vec::with_capacity(bundle.members().len());
            let mut votes = Vec::with_capacity(bundle.members().len());

            for member in bundle.members() {
                let proba: Vec<f64> = member
                    .classifier()
                    .predict_proba(&aligned)?
                    .into_iter()
                    .map(|p| safe_float(Some(p)))
                    .collect();

                if proba.len() != encoder.len() {
                    return Err(InferenceError::InferenceFailed(format!(
                        "{} returned {} probabilities for {} classes",
                        member.name(),
                        proba.len(),
                        encoder.len()
                    ))
                    .into());
                }

                votes.push(self.vote(member.name(), &proba, encoder));
                distributions.push(proba);
            }

            round_distributions.push(mean_distribution(&distributions));
            round_details.push(RoundDetail {
                round: idx + 1,
                votes,
            });
        }

        let fused = mean_distribution(&round_distributions);
        let (top, confidence) = match argmax(&fused) {
            Some(i) => (i, to_percent(fused[i])),
            None => {
                return Err(VerificationError::Inference(InferenceError::InferenceFailed(
                    "fused distribution is empty".to_string(),
                )))
            }
        };

        let (status, user_id, user_name) = if confidence >= self.config.threshold_percent {
            let user_id = encoder.inverse_transform(top).map(str::to_string);
            let user_name = user_id.as_deref().map(|id| self.resolve_name(id));
            (VerificationStatus::Verified, user_id, user_name)
        } else {
            (VerificationStatus::NotVerified, None, None)
        };

        Ok(VerificationResult {
            status,
            user_id,
            user_name,
            confidence,
            round_details,
        })
    }

    fn vote(&self, model: &str, proba: &[f64], encoder: &LabelEncoder) -> ModelVote {
        let top = argmax(proba);
        let confidence = top.map(|i| to_percent(proba[i])).unwrap_or(0.0);

        let user_id = top
            .filter(|_| confidence >= self.config.threshold_percent)
            .and_then(|i| encoder.inverse_transform(i))
            .map(str::to_string);
        let user_name = match &user_id {
            Some(id) => self.resolve_name(id),
            None => NO_MATCH.to_string(),
        };

        ModelVote {
            model: model.to_string(),
            user_id,
            user_name,
            confidence,
        }
    }

    fn resolve_name(&self, user_id: &str) -> String {
        self.users
            .display_name(user_id)
            .unwrap_or_else(|| UNKNOWN_USER.to_string())
    }
}

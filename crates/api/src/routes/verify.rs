//! Verification Route

use axum::{extract::State, Json};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::{ApiError, ApiResult, AppState};
use feature_engine::{FeatureVector, SampleBatch};
use verification::VerificationResult;

/// One attempt, either as raw sample batches or pre-extracted features
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum VerifyRequest {
    Rounds { rounds: Vec<SampleBatch> },
    Features { features: Vec<FeatureVector> },
}

impl VerifyRequest {
    fn round_count(&self) -> usize {
        match self {
            VerifyRequest::Rounds { rounds } => rounds.len(),
            VerifyRequest::Features { features } => features.len(),
        }
    }
}

pub async fn verify(
    State(state): State<Arc<AppState>>,
    Json(request): Json<VerifyRequest>,
) -> ApiResult<Json<VerificationResult>> {
    let rounds = request.round_count();
    if rounds != state.config.rounds() {
        info!("Attempt has {} rounds, configured for {}", rounds, state.config.rounds());
    }
    if let VerifyRequest::Rounds { rounds } = &request {
        flag_weak_samples(&state, rounds);
    }

    let engine = state.engine.clone();
    let result = tokio::task::spawn_blocking(move || match &request {
        VerifyRequest::Rounds { rounds } => engine.verify_batches(rounds),
        VerifyRequest::Features { features } => engine.verify(features),
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))??;

    state.repository.record_verification(&result, rounds)?;
    Ok(Json(result))
}

/// Count samples that would have been rejected at capture time
fn flag_weak_samples(state: &AppState, rounds: &[SampleBatch]) {
    for (idx, batch) in rounds.iter().enumerate() {
        if batch.len() != state.config.samples_per_round {
            info!(
                "Round {} has {} samples, configured for {}",
                idx + 1,
                batch.len(),
                state.config.samples_per_round
            );
        }

        let weak = batch
            .samples()
            .iter()
            .filter(|s| state.validator.check(s).is_err())
            .count();
        if weak > 0 {
            warn!("Round {}: {} of {} samples fail signal checks", idx + 1, weak, batch.len());
            metrics::counter!("weak_samples_total").increment(weak as u64);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{create_router, test_support};
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn post(state: Arc<AppState>, body: Value) -> (StatusCode, Value) {
        let response = create_router(state)
            .oneshot(
                Request::post("/api/v1/verify")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_verify_features() {
        let state = test_support::state();
        let body = json!({"features": [
            {"mq6_1_mean": 2.0, "mq6_1_std": 0.5},
            {"mq6_1_mean": 1.0}
        ]});

        let (status, json) = post(state.clone(), body).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "VERIFIED");
        assert_eq!(json["user_id"], "1001");
        assert_eq!(json["user_name"], "Asha");
        assert_eq!(json["confidence"], 90.0);
        assert_eq!(json["round_details"].as_array().unwrap().len(), 2);

        let log = state.repository.recent_verifications(5).unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].rounds, 2);
    }

    #[tokio::test]
    async fn test_verify_raw_rounds() {
        let body = json!({"rounds": [
            [{"mq6_1": -1.0, "mq135_1": 3.0}, {"mq6_1": -3.0, "mq135_1": "ERR"}]
        ]});

        let (status, json) = post(test_support::state(), body).await;
        assert_eq!(status, StatusCode::OK);
        // mean of mq6_1 is negative: 0.6 for "1002" is below the threshold
        assert_eq!(json["status"], "NOT VERIFIED");
        assert!(json["user_id"].is_null());
        assert_eq!(json["confidence"], 60.0);
        assert_eq!(json["round_details"][0]["votes"][0]["user_name"], "no match");
    }

    #[tokio::test]
    async fn test_empty_rounds_is_bad_request() {
        let (status, json) = post(test_support::state(), json!({"features": []})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["status"], 400);
    }

    #[tokio::test]
    async fn test_empty_batch_is_bad_request() {
        let state = test_support::state();
        let (status, _) = post(state.clone(), json!({"rounds": [[]]})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(state.repository.verification_count(), 0);
    }
}

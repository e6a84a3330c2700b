//! Health Route

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub sensor_mode: u32,
    pub rounds: usize,
    pub samples_per_round: usize,
    pub models: ModelStatus,
    pub registered_users: usize,
    pub purge_in_progress: bool,
}

#[derive(Debug, Serialize)]
pub struct ModelStatus {
    pub members: Vec<String>,
    pub classes: usize,
    pub features: usize,
    pub loaded_at: String,
}

pub async fn get_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let bundle = state.engine.bundle();

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        sensor_mode: state.config.sensor_mode,
        rounds: state.config.rounds(),
        samples_per_round: state.config.samples_per_round,
        models: ModelStatus {
            members: bundle.members().iter().map(|m| m.name().to_string()).collect(),
            classes: bundle.label_encoder().len(),
            features: bundle.feature_order().len(),
            loaded_at: bundle.loaded_at().to_rfc3339(),
        },
        registered_users: state.repository.user_count(),
        purge_in_progress: state.purge.as_ref().is_some_and(|p| p.in_progress()),
    })
}

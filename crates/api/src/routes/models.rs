//! Model Routes

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub status: String,
    pub classes: usize,
    pub features: usize,
    pub loaded_at: String,
}

/// Reload artifacts from disk; the previous bundle keeps serving on failure
pub async fn reload(State(state): State<Arc<AppState>>) -> ApiResult<Json<ReloadResponse>> {
    let engine = state.engine.clone();
    let bundle = tokio::task::spawn_blocking(move || engine.reload())
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;

    info!("Models reloaded: {} classes", bundle.label_encoder().len());
    Ok(Json(ReloadResponse {
        status: "reloaded".to_string(),
        classes: bundle.label_encoder().len(),
        features: bundle.feature_order().len(),
        loaded_at: bundle.loaded_at().to_rfc3339(),
    }))
}

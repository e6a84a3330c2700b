//! Verification Log Routes

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{ApiResult, AppState};
use storage::VerificationRecord;

#[derive(Debug, Deserialize)]
pub struct LogQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    50
}

#[derive(Debug, Serialize)]
pub struct LogResponse {
    pub data: Vec<VerificationRecord>,
    pub count: usize,
}

/// Most recent attempts first
pub async fn recent(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LogQuery>,
) -> ApiResult<Json<LogResponse>> {
    let data = state.repository.recent_verifications(params.limit.min(500))?;
    Ok(Json(LogResponse {
        count: data.len(),
        data,
    }))
}

//! Prometheus exposition

use axum::{extract::State, http::StatusCode};
use std::sync::Arc;

use crate::AppState;

pub async fn render(State(state): State<Arc<AppState>>) -> (StatusCode, String) {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            "metrics recorder not installed".to_string(),
        ),
    }
}

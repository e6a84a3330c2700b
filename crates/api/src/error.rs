//! HTTP error mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use storage::StorageError;
use thiserror::Error;
use verification::VerificationError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("Models unavailable: {0}")]
    ModelsUnavailable(String),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<VerificationError> for ApiError {
    fn from(err: VerificationError) -> Self {
        match err {
            VerificationError::InvalidInput(_) | VerificationError::EmptyRounds => {
                ApiError::BadRequest(err.to_string())
            }
            VerificationError::ModelArtifactMissing(_) => ApiError::ModelsUnavailable(err.to_string()),
            VerificationError::Inference(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::ModelsUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Storage(_) | ApiError::Internal(_) => {
                tracing::error!("{}", self);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({
            "error": self.to_string(),
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inference_engine::InferenceError;

    #[test]
    fn test_status_codes() {
        let cases = [
            (VerificationError::EmptyRounds, StatusCode::BAD_REQUEST),
            (
                VerificationError::InvalidInput("sample batch is empty".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                VerificationError::ModelArtifactMissing("models/6_sensors/rf_model.json".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                VerificationError::Inference(InferenceError::InferenceFailed("nan".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), expected);
        }
    }
}

//! User Routes

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{ApiError, ApiResult, AppState};
use storage::UserRecord;

#[derive(Debug, Deserialize)]
pub struct RegisterUser {
    pub user_id: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct UsersResponse {
    pub data: Vec<UserRecord>,
    pub count: usize,
}

pub async fn list_users(State(state): State<Arc<AppState>>) -> ApiResult<Json<UsersResponse>> {
    let data = state.repository.list_users()?;
    Ok(Json(UsersResponse {
        count: data.len(),
        data,
    }))
}

pub async fn register_user(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterUser>,
) -> ApiResult<(StatusCode, Json<UserRecord>)> {
    if body.user_id.trim().is_empty() {
        return Err(ApiError::BadRequest("user_id must not be empty".to_string()));
    }
    let record = state.repository.insert_user(&body.user_id, &body.name)?;
    Ok((StatusCode::CREATED, Json(record)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    #[tokio::test]
    async fn test_register_then_list() {
        let state = test_support::state();
        let (status, Json(record)) = register_user(
            State(state.clone()),
            Json(RegisterUser {
                user_id: "1002".to_string(),
                name: "Ravi".to_string(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(record.name, "Ravi");

        let Json(users) = list_users(State(state)).await.unwrap();
        assert_eq!(users.count, 2);
    }

    #[tokio::test]
    async fn test_blank_user_id_rejected() {
        let result = register_user(
            State(test_support::state()),
            Json(RegisterUser {
                user_id: " ".to_string(),
                name: "x".to_string(),
            }),
        )
        .await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }
}

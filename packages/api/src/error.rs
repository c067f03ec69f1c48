//! Error type shared by every handler.
//!
//! Client errors carry their message in the `{"error": ...}` body. Internal
//! failures are logged and answered with a generic message.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Email already in use")]
    EmailTaken,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Authentication required")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::BadRequest(_) | ApiError::EmailTaken => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            ApiError::InvalidCredentials | ApiError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, self.to_string())
            }
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, self.to_string()),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::Store(StoreError::InvalidInput(message)) => {
                (StatusCode::BAD_REQUEST, message.clone())
            }
            ApiError::Store(StoreError::Conflict) => {
                (StatusCode::BAD_REQUEST, "Already exists".to_string())
            }
            ApiError::Store(StoreError::NotFound) => {
                (StatusCode::NOT_FOUND, "Not found".to_string())
            }
            ApiError::Store(StoreError::NotConnected) => (
                StatusCode::FORBIDDEN,
                "You can only message your matches".to_string(),
            ),
            ApiError::Store(StoreError::Backend(_))
            | ApiError::Session(_)
            | ApiError::Internal(_) => {
                tracing::error!(error = %self, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Server error".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn render(error: ApiError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_client_errors_keep_their_message() {
        let (status, body) = render(ApiError::EmailTaken).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Email already in use");

        let (status, body) = render(StoreError::NotConnected.into()).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "You can only message your matches");
    }

    #[tokio::test]
    async fn test_internal_errors_are_generic() {
        let (status, body) =
            render(StoreError::Backend("connection refused".to_string()).into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Server error");
    }
}

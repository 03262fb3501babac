use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::discovery::board::BoardError;
use crate::discovery::saved::SaveError;

/// User-visible message when a bookmark write fails.
pub const SAVE_FAILED_MESSAGE: &str = "Failed to save job. Please try again.";

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Save failed: {0}")]
    Save(#[from] SaveError),
}

impl From<BoardError> for AppError {
    fn from(err: BoardError) -> Self {
        match err {
            BoardError::JobNotFound(_) => AppError::NotFound(err.to_string()),
            BoardError::Superseded => AppError::Conflict(err.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Authentication required".to_string(),
            ),
            AppError::Save(e) => {
                tracing::error!("Saved job store error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "SAVE_FAILED",
                    SAVE_FAILED_MESSAGE.to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_error_maps_to_bad_gateway() {
        let response = AppError::Save(SaveError::Database(sqlx::Error::PoolTimedOut)).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_board_errors_map_to_http_statuses() {
        let missing: AppError = BoardError::JobNotFound("x".into()).into();
        assert_eq!(missing.into_response().status(), StatusCode::NOT_FOUND);

        let stale: AppError = BoardError::Superseded.into();
        assert_eq!(stale.into_response().status(), StatusCode::CONFLICT);
    }
}

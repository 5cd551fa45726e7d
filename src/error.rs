//! Error types for lingua-link
//!
//! Every handler converts failures into a JSON `{success, message}` body at
//! its own boundary; no error crosses a request boundary unhandled.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed input (400)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Missing/invalid/expired session (401)
    #[error("Unauthorized: {0}")]
    Auth(String),

    /// Authenticated but not authorized for the target resource (403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Resource not found (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Duplicate email, duplicate friend request (409)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Transcription or model-evaluation provider failure (500)
    #[error("Upstream failure: {0}")]
    Upstream(String),

    /// The model returned text that does not parse as an evaluation (500).
    /// Carries the raw output for diagnosis.
    #[error("Invalid model output: {message}")]
    InvalidModelOutput { message: String, raw_output: String },

    /// Database error (500)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// Generic error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Raw model output rides along only on the parse-failure variant
        if let ApiError::InvalidModelOutput { message, raw_output } = self {
            let body = Json(json!({
                "success": false,
                "message": message,
                "raw_output": raw_output,
            }));
            return (StatusCode::INTERNAL_SERVER_ERROR, body).into_response();
        }

        let (status, message) = match self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Auth(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Upstream(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            ApiError::Database(ref err) => {
                tracing::error!(error = %err, "database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            ApiError::Other(ref err) => {
                tracing::error!(error = %err, "unhandled error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            ApiError::InvalidModelOutput { .. } => unreachable!(),
        };

        let body = Json(json!({
            "success": false,
            "message": message,
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

//! Chat token endpoint
//!
//! Issues a Stream user token so the frontend chat widget can connect as the
//! authenticated user.

use crate::api::session::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::AppState;
use axum::{extract::State, routing::get, Json, Router};
use serde_json::json;

/// GET /api/chat/token
pub async fn stream_token(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<serde_json::Value>> {
    let token = state
        .stream
        .create_user_token(&user.id.to_string())
        .map_err(|e| ApiError::Internal(format!("Failed to generate Stream token: {}", e)))?;

    Ok(Json(json!({ "token": token })))
}

/// Build chat routes
pub fn chat_routes() -> Router<AppState> {
    Router::new().route("/api/chat/token", get(stream_token))
}

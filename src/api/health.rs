//! Health check endpoint

use crate::AppState;
use axum::{routing::get, Json, Router};
use serde_json::json;

/// GET /health — no auth required
pub async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "module": "lingua-link",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Build health routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

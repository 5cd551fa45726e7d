//! lingua-link library interface
//!
//! Language-exchange backend: signup/login with a cookie session, a
//! friend-request social graph, Stream chat and Stripe payment integration,
//! and the AI speech-practice pipeline.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

pub use crate::config::Config;
pub use crate::error::{ApiError, ApiResult};

use axum::http::{header, HeaderValue, Method};
use axum::Router;
use services::{EvaluationClient, StreamClient, StripeClient, TranscriptionClient};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
///
/// Provider clients are constructed once at startup and reused read-only;
/// they hold no mutable state and need no teardown.
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<Config>,
    pub stream: Arc<StreamClient>,
    pub stripe: Arc<StripeClient>,
    pub transcription: Arc<TranscriptionClient>,
    pub evaluation: Arc<EvaluationClient>,
}

impl AppState {
    /// Build state from resolved configuration.
    pub fn from_config(db: SqlitePool, config: Config) -> anyhow::Result<Self> {
        let stream = StreamClient::new(
            config.stream_api_key.clone(),
            config.stream_api_secret.clone(),
            config.stream_base_url.clone(),
        )?;

        let stripe = StripeClient::new(
            config.stripe_secret_key.clone(),
            config.stripe_webhook_secret.clone(),
            config.stripe_monthly_price_id.clone(),
            config.stripe_annual_price_id.clone(),
            config.stripe_base_url.clone(),
            config.frontend_origin.clone(),
        )?;

        let transcription = TranscriptionClient::new(
            config.assemblyai_api_key.clone(),
            config.assemblyai_base_url.clone(),
            config.poll_policy.clone(),
        )?;

        let evaluation = EvaluationClient::new(
            config.model_api_endpoint.clone(),
            config.model_api_key.clone(),
            config.model_id.clone(),
        )?;

        Ok(Self {
            db,
            config: Arc::new(config),
            stream: Arc::new(stream),
            stripe: Arc::new(stripe),
            transcription: Arc::new(transcription),
            evaluation: Arc::new(evaluation),
        })
    }
}

/// Build application router.
pub fn build_router(state: AppState) -> Router {
    // The frontend sends the session cookie cross-site, so CORS must name
    // the origin explicitly and allow credentials.
    let origin: HeaderValue = state
        .config
        .frontend_origin
        .parse()
        .unwrap_or_else(|_| HeaderValue::from_static("http://localhost:5777"));

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .merge(api::auth_routes())
        .merge(api::user_routes())
        .merge(api::chat_routes())
        .merge(api::payment_routes())
        .merge(api::speech_routes())
        .merge(api::health_routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

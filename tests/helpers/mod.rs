//! Shared test helpers: in-memory database, test configuration, request
//! builders. Provider base URLs point at an unroutable local port so
//! best-effort outbound calls fail fast instead of reaching the network.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use lingua_link::config::{Config, PollPolicy};
use lingua_link::{build_router, AppState};
use serde_json::Value;
use std::time::Duration;
use tower::util::ServiceExt;

pub const TEST_JWT_SECRET: &str = "test-session-secret";
pub const TEST_WEBHOOK_SECRET: &str = "whsec_test";

pub fn test_config() -> Config {
    Config {
        port: 0,
        db_path: ":memory:".to_string(),
        frontend_origin: "http://localhost:5777".to_string(),
        jwt_secret: TEST_JWT_SECRET.to_string(),
        stream_api_key: "stream-key".to_string(),
        stream_api_secret: "stream-secret".to_string(),
        stream_base_url: "http://127.0.0.1:1".to_string(),
        stripe_secret_key: "sk_test_123".to_string(),
        stripe_webhook_secret: TEST_WEBHOOK_SECRET.to_string(),
        stripe_monthly_price_id: "price_monthly".to_string(),
        stripe_annual_price_id: "price_annual".to_string(),
        stripe_base_url: "http://127.0.0.1:1".to_string(),
        assemblyai_api_key: "assembly-key".to_string(),
        assemblyai_base_url: "http://127.0.0.1:1".to_string(),
        poll_policy: PollPolicy {
            interval: Duration::from_millis(1),
            max_attempts: 2,
        },
        model_api_endpoint: "http://127.0.0.1:1/v1/chat/completions".to_string(),
        model_api_key: "model-key".to_string(),
        model_id: "test-model".to_string(),
    }
}

pub async fn setup_state() -> AppState {
    let pool = lingua_link::db::init_memory_pool()
        .await
        .expect("in-memory database should initialize");
    AppState::from_config(pool, test_config()).expect("state should build")
}

pub async fn setup_app() -> (Router, AppState) {
    let state = setup_state().await;
    (build_router(state.clone()), state)
}

/// Build a JSON request, optionally authenticated with a session cookie.
pub fn json_request(
    method: &str,
    uri: &str,
    body: Value,
    session_cookie: Option<&str>,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");

    if let Some(token) = session_cookie {
        builder = builder.header(header::COOKIE, format!("jwt={}", token));
    }

    builder.body(Body::from(body.to_string())).unwrap()
}

/// Build a bodyless request, optionally authenticated.
pub fn bare_request(method: &str, uri: &str, session_cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(token) = session_cookie {
        builder = builder.header(header::COOKIE, format!("jwt={}", token));
    }

    builder.body(Body::empty()).unwrap()
}

pub async fn extract_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("should read body");
    serde_json::from_slice(&bytes).expect("should parse JSON")
}

/// Pull the session token out of a Set-Cookie response header.
pub fn session_token_from(response: &Response) -> Option<String> {
    let set_cookie = response.headers().get(header::SET_COOKIE)?.to_str().ok()?;
    let value = set_cookie.strip_prefix("jwt=")?;
    Some(value.split(';').next()?.to_string())
}

/// Sign a user up through the API and return their session token.
pub async fn signup_user(app: &Router, email: &str, full_name: &str) -> String {
    let request = json_request(
        "POST",
        "/api/auth/signup",
        serde_json::json!({
            "email": email,
            "password": "secret123",
            "fullName": full_name,
        }),
        None,
    );

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED, "signup should succeed");
    session_token_from(&response).expect("signup should set the session cookie")
}

/// Complete onboarding for a signed-up user.
pub async fn onboard_user(app: &Router, token: &str, full_name: &str) {
    let request = json_request(
        "POST",
        "/api/auth/onboarding",
        serde_json::json!({
            "fullName": full_name,
            "bio": "Practicing every day",
            "nativeLanguage": "Portuguese",
            "learningLanguage": "English",
            "location": "Lisbon",
        }),
        Some(token),
    );

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK, "onboarding should succeed");
}

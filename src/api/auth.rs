//! Auth endpoints: signup, login, logout, onboarding, profile update
//!
//! Signup and login issue the session cookie. Stream identity sync is
//! best-effort everywhere: a chat-provider failure is logged and the primary
//! operation still succeeds.

use crate::api::session::{self, AuthUser};
use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::models::ProfileFields;
use crate::AppState;
use axum::{
    extract::State,
    http::{header::SET_COOKIE, StatusCode},
    response::{AppendHeaders, IntoResponse},
    routing::post,
    Json, Router,
};
use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tracing::{info, warn};

/// RFC-light email shape check, same as the frontend applies.
fn email_regex() -> &'static Regex {
    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    EMAIL_REGEX.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid regex"))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub full_name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub success: bool,
    pub message: String,
}

impl StatusResponse {
    fn ok(message: &str) -> Self {
        Self {
            success: true,
            message: message.to_string(),
        }
    }
}

/// POST /api/auth/signup
pub async fn sign_up(
    State(state): State<AppState>,
    Json(payload): Json<SignUpRequest>,
) -> ApiResult<impl IntoResponse> {
    if payload.email.is_empty() || payload.password.is_empty() || payload.full_name.is_empty() {
        return Err(ApiError::Validation("All fields are required".to_string()));
    }

    if payload.password.len() < 6 {
        return Err(ApiError::Validation(
            "Password should be at least 6 characters".to_string(),
        ));
    }

    if !email_regex().is_match(&payload.email) {
        return Err(ApiError::Validation("Invalid email".to_string()));
    }

    let password_hash = bcrypt::hash(&payload.password, bcrypt::DEFAULT_COST)
        .map_err(|e| ApiError::Internal(format!("Password hashing failed: {}", e)))?;

    // Cosmetic placeholder avatar; the seed is not security-relevant
    let seed = rand::thread_rng().gen_range(1..=100);
    let profile_pic = format!("https://api.dicebear.com/9.x/avataaars/svg?seed={}", seed);

    let user = db::users::create_user(
        &state.db,
        &payload.email,
        &password_hash,
        &payload.full_name,
        &profile_pic,
    )
    .await?;

    // Mirror identity into the chat provider; failure never fails signup
    if let Err(e) = state
        .stream
        .upsert_user(&user.id.to_string(), &user.full_name, &user.profile_pic)
        .await
    {
        warn!(error = %e, "Stream user creation failed during signup");
    } else {
        info!(user = %user.full_name, "Stream user created");
    }

    let token = session::issue_token(user.id, &state.config.jwt_secret)?;

    Ok((
        StatusCode::CREATED,
        AppendHeaders([(SET_COOKIE, session::session_cookie(&token))]),
        Json(StatusResponse::ok("Account created successfully")),
    ))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    if payload.email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::Validation("All fields are required".to_string()));
    }

    // Same message for unknown email and wrong password
    let invalid = || ApiError::Auth("Invalid email or password".to_string());

    let user = db::users::find_by_email(&state.db, &payload.email)
        .await?
        .ok_or_else(invalid)?;

    let password_ok = bcrypt::verify(&payload.password, &user.password_hash)
        .map_err(|e| ApiError::Internal(format!("Password verification failed: {}", e)))?;

    if !password_ok {
        return Err(invalid());
    }

    let token = session::issue_token(user.id, &state.config.jwt_secret)?;

    Ok((
        StatusCode::OK,
        AppendHeaders([(SET_COOKIE, session::session_cookie(&token))]),
        Json(StatusResponse::ok("Login successful")),
    ))
}

/// POST /api/auth/logout
pub async fn logout() -> impl IntoResponse {
    (
        StatusCode::OK,
        AppendHeaders([(SET_COOKIE, session::clear_session_cookie())]),
        Json(StatusResponse::ok("Logout successful")),
    )
}

/// POST /api/auth/onboarding
pub async fn onboard(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(fields): Json<ProfileFields>,
) -> ApiResult<Json<StatusResponse>> {
    apply_profile_update(&state, user.id, &fields, true).await?;
    Ok(Json(StatusResponse::ok("Details updated successfully")))
}

/// POST /api/auth/update-profile
pub async fn update_profile(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(fields): Json<ProfileFields>,
) -> ApiResult<Json<StatusResponse>> {
    apply_profile_update(&state, user.id, &fields, false).await?;
    Ok(Json(StatusResponse::ok("Profile updated successfully")))
}

/// Shared onboarding/profile-update path: validate the allow-listed fields,
/// persist, re-sync chat identity best-effort.
async fn apply_profile_update(
    state: &AppState,
    user_id: uuid::Uuid,
    fields: &ProfileFields,
    set_onboarded: bool,
) -> ApiResult<()> {
    let missing = fields.missing_fields();
    if !missing.is_empty() {
        return Err(ApiError::Validation(format!(
            "All fields are required (missing: {})",
            missing.join(", ")
        )));
    }

    let updated = db::users::update_profile(&state.db, user_id, fields, set_onboarded)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if let Err(e) = state
        .stream
        .upsert_user(
            &updated.id.to_string(),
            &updated.full_name,
            &updated.profile_pic,
        )
        .await
    {
        warn!(error = %e, "Stream user sync failed after profile update");
    }

    Ok(())
}

/// Build auth routes
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/signup", post(sign_up))
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/onboarding", post(onboard))
        .route("/api/auth/update-profile", post(update_profile))
}

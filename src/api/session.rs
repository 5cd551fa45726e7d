//! Session tokens and the authenticated-user extractor
//!
//! The session is a signed HS256 JWT carried in an http-only `jwt` cookie
//! (SameSite=None + Secure so the cross-site frontend can send it). There is
//! no server-side session list: logout only clears the cookie, and a token
//! stays valid until its natural expiry.

use crate::db;
use crate::error::ApiError;
use crate::models::User;
use crate::AppState;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "jwt";

/// Session lifetime: 7 days.
const SESSION_TTL_SECS: i64 = 7 * 24 * 60 * 60;

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub user_id: Uuid,
    pub exp: i64,
}

/// Sign a session token for a user.
pub fn issue_token(user_id: Uuid, secret: &str) -> Result<String, ApiError> {
    let claims = SessionClaims {
        user_id,
        exp: Utc::now().timestamp() + SESSION_TTL_SECS,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(format!("Failed to sign session token: {}", e)))
}

/// Verify a session token. Expiry is enforced by the default validation.
pub fn verify_token(token: &str, secret: &str) -> Result<SessionClaims, ApiError> {
    decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| ApiError::Auth("Unauthorized - invalid token".to_string()))
}

/// `Set-Cookie` value issuing the session cookie.
pub fn session_cookie(token: &str) -> String {
    format!(
        "{}={}; Max-Age={}; Path=/; HttpOnly; SameSite=None; Secure",
        SESSION_COOKIE, token, SESSION_TTL_SECS
    )
}

/// `Set-Cookie` value clearing the session cookie. Attributes must match the
/// issuing cookie or browsers keep the old one.
pub fn clear_session_cookie() -> String {
    format!(
        "{}=; Max-Age=0; Path=/; HttpOnly; SameSite=None; Secure",
        SESSION_COOKIE
    )
}

/// Extractor that authenticates the request from the session cookie and
/// loads the user row. Handlers taking `AuthUser` never run for
/// unauthenticated requests.
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);

        let token = jar
            .get(SESSION_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .ok_or_else(|| ApiError::Auth("Unauthorized - no token provided".to_string()))?;

        let claims = verify_token(&token, &state.config.jwt_secret)?;

        let user = db::users::find_by_id(&state.db, claims.user_id)
            .await?
            .ok_or_else(|| ApiError::Auth("Unauthorized - user not found".to_string()))?;

        Ok(AuthUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trips() {
        let user_id = Uuid::new_v4();
        let token = issue_token(user_id, "test-secret").unwrap();
        let claims = verify_token(&token, "test-secret").unwrap();
        assert_eq!(claims.user_id, user_id);
    }

    #[test]
    fn token_rejects_wrong_secret() {
        let token = issue_token(Uuid::new_v4(), "test-secret").unwrap();
        assert!(verify_token(&token, "other-secret").is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let claims = SessionClaims {
            user_id: Uuid::new_v4(),
            exp: Utc::now().timestamp() - 3600,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        assert!(verify_token(&token, "test-secret").is_err());
    }

    #[test]
    fn issued_cookie_is_cross_site_capable() {
        let cookie = session_cookie("abc");
        assert!(cookie.starts_with("jwt=abc;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=None"));
        assert!(cookie.contains("Secure"));
    }
}

//! Stream Chat API client
//!
//! Mirrors user identity into the external chat provider and issues the
//! per-user tokens the frontend chat widget needs. Upserts are best-effort
//! at every call site: a Stream outage must never fail signup or onboarding.

use serde::Serialize;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

const USER_AGENT: &str = concat!("lingua-link/", env!("CARGO_PKG_VERSION"));

/// Stream client errors
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Token signing error: {0}")]
    Token(String),
}

/// Claims for a client-side Stream user token.
#[derive(Debug, Serialize)]
struct UserTokenClaims<'a> {
    user_id: &'a str,
}

/// Claims for the server-side token that authenticates REST calls.
#[derive(Debug, Serialize)]
struct ServerTokenClaims {
    server: bool,
}

/// Stream Chat API client
pub struct StreamClient {
    http_client: reqwest::Client,
    api_key: String,
    api_secret: String,
    base_url: String,
}

impl StreamClient {
    pub fn new(api_key: String, api_secret: String, base_url: String) -> Result<Self, StreamError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| StreamError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            api_key,
            api_secret,
            base_url,
        })
    }

    /// Sign a chat token for one user. Stream accepts an HS256 JWT over
    /// `{user_id}` signed with the API secret.
    pub fn create_user_token(&self, user_id: &str) -> Result<String, StreamError> {
        self.sign(&UserTokenClaims { user_id })
    }

    /// Create or update the chat-side identity for a user.
    pub async fn upsert_user(
        &self,
        user_id: &str,
        name: &str,
        image: &str,
    ) -> Result<(), StreamError> {
        let server_token = self.sign(&ServerTokenClaims { server: true })?;

        let body = json!({
            "users": {
                user_id: {
                    "id": user_id,
                    "name": name,
                    "image": image,
                }
            }
        });

        let url = format!("{}/users?api_key={}", self.base_url, self.api_key);

        let response = self
            .http_client
            .post(&url)
            .header("Authorization", server_token)
            .header("stream-auth-type", "jwt")
            .json(&body)
            .send()
            .await
            .map_err(|e| StreamError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(StreamError::Api(status.as_u16(), error_text));
        }

        tracing::debug!(user_id = %user_id, "Stream user upserted");
        Ok(())
    }

    fn sign<T: Serialize>(&self, claims: &T) -> Result<String, StreamError> {
        // Stream tokens carry no expiry; decoding is the provider's concern.
        let header = jsonwebtoken::Header::new(jsonwebtoken::Algorithm::HS256);
        let key = jsonwebtoken::EncodingKey::from_secret(self.api_secret.as_bytes());
        jsonwebtoken::encode(&header, claims, &key).map_err(|e| StreamError::Token(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct DecodedUserToken {
        user_id: String,
    }

    fn test_client() -> StreamClient {
        StreamClient::new(
            "key".to_string(),
            "shhh-secret".to_string(),
            "http://127.0.0.1:1".to_string(),
        )
        .unwrap()
    }

    #[test]
    fn user_token_carries_user_id_claim() {
        let client = test_client();
        let token = client.create_user_token("user-42").unwrap();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims.clear();
        validation.validate_exp = false;

        let decoded = decode::<DecodedUserToken>(
            &token,
            &DecodingKey::from_secret(b"shhh-secret"),
            &validation,
        )
        .unwrap();

        assert_eq!(decoded.claims.user_id, "user-42");
    }

    #[test]
    fn user_token_rejects_wrong_secret() {
        let client = test_client();
        let token = client.create_user_token("user-42").unwrap();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims.clear();
        validation.validate_exp = false;

        let result = decode::<DecodedUserToken>(
            &token,
            &DecodingKey::from_secret(b"other-secret"),
            &validation,
        );
        assert!(result.is_err());
    }
}

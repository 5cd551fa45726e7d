//! Stripe API client
//!
//! Creates checkout sessions over the REST API and verifies webhook
//! signatures. Verification fails closed: a body that does not match its
//! `Stripe-Signature` header never reaches event handling.

use crate::models::SubscriptionPlan;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use std::time::Duration;
use thiserror::Error;

const USER_AGENT: &str = concat!("lingua-link/", env!("CARGO_PKG_VERSION"));

/// Maximum accepted age of a signed webhook payload, matching the tolerance
/// the provider's own SDKs enforce.
const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// Stripe client errors
#[derive(Debug, Error)]
pub enum StripeError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Webhook signature verification failed: {0}")]
    Signature(String),
}

/// Checkout session as returned by the sessions endpoint. Only the redirect
/// URL matters to us.
#[derive(Debug, Deserialize)]
struct CheckoutSession {
    url: String,
}

/// Deserialized webhook event. Fields beyond what the premium-upgrade flow
/// needs are ignored.
#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: WebhookEventData,
}

#[derive(Debug, Deserialize)]
pub struct WebhookEventData {
    pub object: WebhookSession,
}

#[derive(Debug, Deserialize)]
pub struct WebhookSession {
    pub customer_email: Option<String>,
    #[serde(default)]
    pub metadata: WebhookMetadata,
}

#[derive(Debug, Default, Deserialize)]
pub struct WebhookMetadata {
    pub plan: Option<String>,
}

/// Stripe API client
pub struct StripeClient {
    http_client: reqwest::Client,
    secret_key: String,
    webhook_secret: String,
    monthly_price_id: String,
    annual_price_id: String,
    base_url: String,
    frontend_origin: String,
}

impl StripeClient {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        secret_key: String,
        webhook_secret: String,
        monthly_price_id: String,
        annual_price_id: String,
        base_url: String,
        frontend_origin: String,
    ) -> Result<Self, StripeError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| StripeError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            secret_key,
            webhook_secret,
            monthly_price_id,
            annual_price_id,
            base_url,
            frontend_origin,
        })
    }

    /// Create a subscription checkout session and return the redirect URL.
    pub async fn create_checkout_session(
        &self,
        email: &str,
        plan: SubscriptionPlan,
    ) -> Result<String, StripeError> {
        let price_id = match plan {
            SubscriptionPlan::Annual => &self.annual_price_id,
            SubscriptionPlan::Monthly => &self.monthly_price_id,
        };

        let success_url = format!(
            "{}/payment-success?plan={}",
            self.frontend_origin,
            plan.as_str()
        );
        let cancel_url = format!("{}/payment-failed", self.frontend_origin);

        let params = [
            ("payment_method_types[0]", "card"),
            ("mode", "subscription"),
            ("customer_email", email),
            ("line_items[0][price]", price_id),
            ("line_items[0][quantity]", "1"),
            ("success_url", &success_url),
            ("cancel_url", &cancel_url),
            ("metadata[plan]", plan.as_str()),
        ];

        let response = self
            .http_client
            .post(format!("{}/v1/checkout/sessions", self.base_url))
            .bearer_auth(&self.secret_key)
            .form(&params)
            .send()
            .await
            .map_err(|e| StripeError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(StripeError::Api(status.as_u16(), error_text));
        }

        let session: CheckoutSession = response
            .json()
            .await
            .map_err(|e| StripeError::Parse(e.to_string()))?;

        tracing::info!(plan = plan.as_str(), "Checkout session created");
        Ok(session.url)
    }

    /// Verify a `Stripe-Signature` header against the raw payload, then
    /// deserialize the event. The header format is `t=<unix>,v1=<hex hmac>`
    /// where the hmac is SHA-256 over `"{t}.{payload}"` keyed with the
    /// webhook signing secret.
    pub fn verify_and_parse(
        &self,
        payload: &[u8],
        signature_header: &str,
        now_unix: i64,
    ) -> Result<WebhookEvent, StripeError> {
        self.verify_signature(payload, signature_header, now_unix)?;

        serde_json::from_slice(payload).map_err(|e| StripeError::Parse(e.to_string()))
    }

    pub fn verify_signature(
        &self,
        payload: &[u8],
        signature_header: &str,
        now_unix: i64,
    ) -> Result<(), StripeError> {
        let mut timestamp: Option<i64> = None;
        let mut candidates: Vec<&str> = Vec::new();

        for part in signature_header.split(',') {
            match part.trim().split_once('=') {
                Some(("t", value)) => timestamp = value.parse().ok(),
                Some(("v1", value)) => candidates.push(value),
                _ => {}
            }
        }

        let timestamp = timestamp
            .ok_or_else(|| StripeError::Signature("missing timestamp".to_string()))?;

        if candidates.is_empty() {
            return Err(StripeError::Signature("missing v1 signature".to_string()));
        }

        if (now_unix - timestamp).abs() > SIGNATURE_TOLERANCE_SECS {
            return Err(StripeError::Signature(
                "timestamp outside tolerance".to_string(),
            ));
        }

        if candidates
            .iter()
            .any(|candidate| self.signature_matches(timestamp, payload, candidate))
        {
            Ok(())
        } else {
            Err(StripeError::Signature("no matching v1 signature".to_string()))
        }
    }

    /// Constant-time check of one hex candidate against the expected mac.
    fn signature_matches(&self, timestamp: i64, payload: &[u8], candidate: &str) -> bool {
        let Ok(candidate) = hex::decode(candidate) else {
            return false;
        };

        Self::signed_mac(&self.webhook_secret, timestamp, payload)
            .verify_slice(&candidate)
            .is_ok()
    }

    fn signed_mac(secret: &str, timestamp: i64, payload: &[u8]) -> Hmac<Sha256> {
        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        mac
    }

    pub(crate) fn compute_signature(secret: &str, timestamp: i64, payload: &[u8]) -> String {
        hex::encode(Self::signed_mac(secret, timestamp, payload).finalize().into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> StripeClient {
        StripeClient::new(
            "sk_test_123".to_string(),
            "whsec_test".to_string(),
            "price_monthly".to_string(),
            "price_annual".to_string(),
            "http://127.0.0.1:1".to_string(),
            "http://localhost:5777".to_string(),
        )
        .unwrap()
    }

    fn sign(secret: &str, timestamp: i64, payload: &[u8]) -> String {
        format!(
            "t={},v1={}",
            timestamp,
            StripeClient::compute_signature(secret, timestamp, payload)
        )
    }

    #[test]
    fn valid_signature_verifies() {
        let client = test_client();
        let payload = br#"{"type":"checkout.session.completed"}"#;
        let header = sign("whsec_test", 1_700_000_000, payload);

        assert!(client
            .verify_signature(payload, &header, 1_700_000_000)
            .is_ok());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let client = test_client();
        let payload = br#"{"type":"checkout.session.completed"}"#;
        let header = sign("whsec_other", 1_700_000_000, payload);

        assert!(client
            .verify_signature(payload, &header, 1_700_000_000)
            .is_err());
    }

    #[test]
    fn stale_timestamp_is_rejected() {
        let client = test_client();
        let payload = br#"{}"#;
        let header = sign("whsec_test", 1_700_000_000, payload);

        // 10 minutes later, outside the 5-minute tolerance
        assert!(client
            .verify_signature(payload, &header, 1_700_000_600)
            .is_err());
    }

    #[test]
    fn malformed_hex_candidate_is_rejected() {
        let client = test_client();
        let payload = br#"{}"#;

        for candidate in ["not-hex-at-all", "abcd", ""] {
            let header = format!("t=1700000000,v1={}", candidate);
            assert!(
                client.verify_signature(payload, &header, 1_700_000_000).is_err(),
                "candidate {:?} should not verify",
                candidate
            );
        }
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let client = test_client();
        let header = sign("whsec_test", 1_700_000_000, br#"{"amount":100}"#);

        assert!(client
            .verify_signature(br#"{"amount":999}"#, &header, 1_700_000_000)
            .is_err());
    }

    #[test]
    fn event_parses_after_verification() {
        let client = test_client();
        let payload = br#"{
            "type": "checkout.session.completed",
            "data": {"object": {"customer_email": "ana@example.com", "metadata": {"plan": "annual"}}}
        }"#;
        let header = sign("whsec_test", 1_700_000_000, payload);

        let event = client
            .verify_and_parse(payload, &header, 1_700_000_000)
            .unwrap();
        assert_eq!(event.event_type, "checkout.session.completed");
        assert_eq!(
            event.data.object.customer_email.as_deref(),
            Some("ana@example.com")
        );
        assert_eq!(event.data.object.metadata.plan.as_deref(), Some("annual"));
    }
}

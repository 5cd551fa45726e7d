//! Configuration for lingua-link
//!
//! All settings come from the environment (the deployment target injects
//! them the same way the rest of the fleet does). Secrets have no defaults:
//! startup fails with a descriptive error naming the missing variable.

use anyhow::{Context, Result};
use std::time::Duration;

/// Transcription poll policy.
///
/// The transcript job is polled at a fixed interval until it completes or
/// errors. The budget is bounded: once `max_attempts` polls have been spent,
/// the submission fails as an upstream timeout rather than waiting forever.
#[derive(Debug, Clone)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3),
            max_attempts: 100,
        }
    }
}

/// Process-wide configuration, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP listen port
    pub port: u16,
    /// SQLite database file path
    pub db_path: String,
    /// Frontend origin allowed by CORS and used for checkout redirect URLs
    pub frontend_origin: String,

    /// Session token signing secret
    pub jwt_secret: String,

    /// Stream Chat credentials
    pub stream_api_key: String,
    pub stream_api_secret: String,
    pub stream_base_url: String,

    /// Stripe credentials and price identifiers
    pub stripe_secret_key: String,
    pub stripe_webhook_secret: String,
    pub stripe_monthly_price_id: String,
    pub stripe_annual_price_id: String,
    pub stripe_base_url: String,

    /// AssemblyAI transcription provider
    pub assemblyai_api_key: String,
    pub assemblyai_base_url: String,
    pub poll_policy: PollPolicy,

    /// Language-model evaluation endpoint
    pub model_api_endpoint: String,
    pub model_api_key: String,
    pub model_id: String,
}

impl Config {
    /// Resolve configuration from the environment.
    pub fn from_env() -> Result<Self> {
        let poll_policy = PollPolicy {
            interval: Duration::from_millis(
                env_or("LINGUA_POLL_INTERVAL_MS", "3000").parse().context(
                    "LINGUA_POLL_INTERVAL_MS must be an integer number of milliseconds",
                )?,
            ),
            max_attempts: env_or("LINGUA_POLL_MAX_ATTEMPTS", "100")
                .parse()
                .context("LINGUA_POLL_MAX_ATTEMPTS must be an integer")?,
        };

        Ok(Self {
            port: env_or("PORT", "5001")
                .parse()
                .context("PORT must be a valid port number")?,
            db_path: env_or("LINGUA_DB_PATH", "lingua-link.db"),
            frontend_origin: env_or("FRONTEND_ORIGIN", "http://localhost:5777"),

            jwt_secret: required("JWT_SECRET_KEY")?,

            stream_api_key: required("STREAM_API_KEY")?,
            stream_api_secret: required("STREAM_API_SECRET")?,
            stream_base_url: env_or("STREAM_BASE_URL", "https://chat.stream-io-api.com"),

            stripe_secret_key: required("STRIPE_SECRET_KEY")?,
            stripe_webhook_secret: required("STRIPE_WEBHOOK_SECRET")?,
            stripe_monthly_price_id: required("STRIPE_MONTHLY_PRICE_ID")?,
            stripe_annual_price_id: required("STRIPE_ANNUAL_PRICE_ID")?,
            stripe_base_url: env_or("STRIPE_BASE_URL", "https://api.stripe.com"),

            assemblyai_api_key: required("ASSEMBLY_API_KEY")?,
            assemblyai_base_url: env_or("ASSEMBLY_BASE_URL", "https://api.assemblyai.com"),
            poll_policy,

            model_api_endpoint: required("MODEL_API_ENDPOINT")?,
            model_api_key: required("MODEL_API_KEY")?,
            model_id: required("MODEL_ID")?,
        })
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn required(name: &str) -> Result<String> {
    let value =
        std::env::var(name).with_context(|| format!("{} must be set in the environment", name))?;
    if value.trim().is_empty() {
        anyhow::bail!("{} is set but empty", name);
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_poll_policy_is_three_seconds_bounded() {
        let policy = PollPolicy::default();
        assert_eq!(policy.interval, Duration::from_secs(3));
        assert_eq!(policy.max_attempts, 100);
    }
}

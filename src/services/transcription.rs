//! AssemblyAI transcription client
//!
//! Three-step flow: upload the raw audio bytes, request a transcript of the
//! uploaded asset, then poll the job until it completes or errors. The poll
//! budget is bounded by [`PollPolicy`]; exhausting it is a provider timeout,
//! not an infinite wait.

use crate::config::PollPolicy;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

const USER_AGENT: &str = concat!("lingua-link/", env!("CARGO_PKG_VERSION"));

/// Transcription client errors
#[derive(Debug, Error)]
pub enum TranscriptionError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),

    /// The provider reported the job itself failed.
    #[error("AssemblyAI transcription failed{}", .0.as_deref().map(|e| format!(": {}", e)).unwrap_or_default())]
    TranscriptFailed(Option<String>),

    /// The poll budget ran out before the job reached a terminal status.
    #[error("Transcription did not complete within {attempts} polls")]
    TimedOut { attempts: u32 },
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    upload_url: String,
}

#[derive(Debug, Deserialize)]
struct TranscriptJob {
    id: String,
    #[allow(dead_code)]
    status: String,
}

#[derive(Debug, Deserialize)]
struct TranscriptStatus {
    status: String,
    text: Option<String>,
    error: Option<String>,
}

/// AssemblyAI API client
pub struct TranscriptionClient {
    http_client: reqwest::Client,
    api_key: String,
    base_url: String,
    poll_policy: PollPolicy,
}

impl TranscriptionClient {
    pub fn new(
        api_key: String,
        base_url: String,
        poll_policy: PollPolicy,
    ) -> Result<Self, TranscriptionError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| TranscriptionError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            api_key,
            base_url,
            poll_policy,
        })
    }

    /// Run the full upload → request → poll sequence and return the
    /// transcript text.
    pub async fn transcribe(&self, audio: Vec<u8>) -> Result<String, TranscriptionError> {
        let audio_url = self.upload(audio).await?;
        let job_id = self.request_transcript(&audio_url).await?;
        self.poll_until_done(&job_id).await
    }

    /// Push raw audio bytes to the provider's upload endpoint.
    async fn upload(&self, audio: Vec<u8>) -> Result<String, TranscriptionError> {
        tracing::debug!(bytes = audio.len(), "Uploading audio to AssemblyAI");

        let response = self
            .http_client
            .post(format!("{}/v2/upload", self.base_url))
            .header("authorization", &self.api_key)
            .header("content-type", "application/octet-stream")
            .body(audio)
            .send()
            .await
            .map_err(|e| TranscriptionError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(TranscriptionError::Api(status.as_u16(), error_text));
        }

        let upload: UploadResponse = response
            .json()
            .await
            .map_err(|e| TranscriptionError::Parse(e.to_string()))?;

        Ok(upload.upload_url)
    }

    /// Ask for a transcript of the uploaded asset. Disfluencies are kept:
    /// the evaluator scores fluency, so filler words matter.
    async fn request_transcript(&self, audio_url: &str) -> Result<String, TranscriptionError> {
        let body = json!({
            "audio_url": audio_url,
            "language_code": "en",
            "disfluencies": true,
        });

        let response = self
            .http_client
            .post(format!("{}/v2/transcript", self.base_url))
            .header("authorization", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| TranscriptionError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(TranscriptionError::Api(status.as_u16(), error_text));
        }

        let job: TranscriptJob = response
            .json()
            .await
            .map_err(|e| TranscriptionError::Parse(e.to_string()))?;

        tracing::info!(job_id = %job.id, "Transcription requested");
        Ok(job.id)
    }

    /// Poll the job at a fixed interval until completed/error, or until the
    /// attempt budget is spent.
    async fn poll_until_done(&self, job_id: &str) -> Result<String, TranscriptionError> {
        let url = format!("{}/v2/transcript/{}", self.base_url, job_id);

        for attempt in 1..=self.poll_policy.max_attempts {
            let response = self
                .http_client
                .get(&url)
                .header("authorization", &self.api_key)
                .send()
                .await
                .map_err(|e| TranscriptionError::Network(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                let error_text = response.text().await.unwrap_or_default();
                return Err(TranscriptionError::Api(status.as_u16(), error_text));
            }

            let job: TranscriptStatus = response
                .json()
                .await
                .map_err(|e| TranscriptionError::Parse(e.to_string()))?;

            match job.status.as_str() {
                "completed" => {
                    tracing::info!(job_id = %job_id, attempts = attempt, "Transcription completed");
                    return Ok(job.text.unwrap_or_default());
                }
                "error" => {
                    tracing::warn!(job_id = %job_id, error = ?job.error, "Transcription failed");
                    return Err(TranscriptionError::TranscriptFailed(job.error));
                }
                other => {
                    tracing::debug!(job_id = %job_id, status = other, attempt, "Transcription pending");
                    // No point waiting out the interval when the budget is
                    // already spent
                    if attempt < self.poll_policy.max_attempts {
                        tokio::time::sleep(self.poll_policy.interval).await;
                    }
                }
            }
        }

        Err(TranscriptionError::TimedOut {
            attempts: self.poll_policy.max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_creation() {
        let client = TranscriptionClient::new(
            "test-key".to_string(),
            "http://127.0.0.1:1".to_string(),
            PollPolicy::default(),
        );
        assert!(client.is_ok());
    }

    #[test]
    fn failed_transcript_message_matches_provider_wording() {
        let err = TranscriptionError::TranscriptFailed(None);
        assert_eq!(err.to_string(), "AssemblyAI transcription failed");

        let err = TranscriptionError::TranscriptFailed(Some("audio too short".to_string()));
        assert_eq!(
            err.to_string(),
            "AssemblyAI transcription failed: audio too short"
        );
    }

    #[tokio::test]
    async fn poll_budget_exhaustion_times_out() {
        // Unroutable address: every poll attempt fails fast at the network
        // layer, which surfaces as Network rather than hanging.
        let client = TranscriptionClient::new(
            "test-key".to_string(),
            "http://127.0.0.1:1".to_string(),
            PollPolicy {
                interval: Duration::from_millis(1),
                max_attempts: 2,
            },
        )
        .unwrap();

        let result = client.poll_until_done("job-1").await;
        assert!(matches!(result, Err(TranscriptionError::Network(_))));
    }

    #[tokio::test]
    async fn exhausted_budget_skips_the_final_wait() {
        use axum::{routing::get, Json, Router};

        // Local stub that always reports the job still processing
        let app = Router::new().route(
            "/v2/transcript/:id",
            get(|| async { Json(serde_json::json!({ "status": "processing" })) }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // With a long interval, timing out quickly proves the last pending
        // poll does not pay one more interval before giving up.
        let client = TranscriptionClient::new(
            "test-key".to_string(),
            format!("http://{}", addr),
            PollPolicy {
                interval: Duration::from_secs(60),
                max_attempts: 1,
            },
        )
        .unwrap();

        let started = std::time::Instant::now();
        let result = client.poll_until_done("job-1").await;

        assert!(matches!(
            result,
            Err(TranscriptionError::TimedOut { attempts: 1 })
        ));
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}

//! Language-model evaluation client
//!
//! Sends the transcript plus topic through a fixed tutor prompt and parses
//! the model's reply into an [`Evaluation`]. The model is instructed to
//! return bare JSON; replies wrapped in a Markdown code fence are unwrapped
//! before parsing, anything else that fails to parse is surfaced with the
//! raw text attached. No retry or repair attempt.

use crate::models::Evaluation;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

const USER_AGENT: &str = concat!("lingua-link/", env!("CARGO_PKG_VERSION"));

/// Low temperature and a capped reply keep the output close to the
/// requested JSON shape.
const SAMPLING_TEMPERATURE: f64 = 0.2;
const MAX_OUTPUT_TOKENS: u32 = 700;

const SYSTEM_PROMPT: &str = "You are an AI assistant that evaluates speech transcripts and \
     provides feedback in JSON format. Your output must be a valid JSON object, and nothing \
     else. Do NOT include code block formatting (e.g., ```json).";

/// Evaluation client errors
#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Model response carried no content")]
    MissingContent,

    /// The reply text did not parse as an evaluation object.
    #[error("Invalid JSON from model")]
    InvalidOutput { raw: String },
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

/// Chat-completion client for the evaluation endpoint
pub struct EvaluationClient {
    http_client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model_id: String,
}

impl EvaluationClient {
    pub fn new(
        endpoint: String,
        api_key: String,
        model_id: String,
    ) -> Result<Self, EvaluationError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| EvaluationError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint,
            api_key,
            model_id,
        })
    }

    /// Score a transcript against its topic.
    pub async fn evaluate(
        &self,
        topic: &str,
        transcript: &str,
    ) -> Result<Evaluation, EvaluationError> {
        let body = json!({
            "model": self.model_id,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": build_prompt(topic, transcript)},
            ],
            "temperature": SAMPLING_TEMPERATURE,
            "max_tokens": MAX_OUTPUT_TOKENS,
        });

        let response = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .header("X-Title", "Lingua Link AI Practice")
            .json(&body)
            .send()
            .await
            .map_err(|e| EvaluationError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(EvaluationError::Api(status.as_u16(), error_text));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| EvaluationError::Api(status.as_u16(), e.to_string()))?;

        let raw = chat
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(EvaluationError::MissingContent)?;

        parse_evaluation(&raw)
    }
}

/// Fixed evaluation prompt. Scoring is restricted to spoken-language
/// proficiency; topic accuracy is explicitly off the table.
pub fn build_prompt(topic: &str, transcript: &str) -> String {
    format!(
        r#"You are an expert language tutor. Evaluate the following speech transcript provided by a language learner. The user is practicing their speaking skills in the context of the given topic.

Focus your evaluation strictly on the user's **spoken language proficiency**: fluency, pronunciation, grammar, and vocabulary. Do **not** judge topic accuracy or content knowledge. Do **not** provide suggestions related to topic ideas or content.

Provide clear, actionable tips for improving their **spoken English**.

Topic: """{topic}"""

Transcript: """{transcript}"""

Return ONLY a valid JSON object in the following format:

{{
  "overall_score": <0-100>,
  "fluency": <0-100>,
  "pronunciation": <0-100>,
  "grammar": <0-100>,
  "vocabulary": <0-100>,
  "suggestions": [
    "<language learning tip 1>",
    "<language learning tip 2>",
    "<language learning tip 3>"
  ]
}}"#
    )
}

/// Strip an optional Markdown code fence (``` or ```json) wrapping the
/// model's reply.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();

    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Drop the language tag on the opening fence line, if any
    let rest = match rest.split_once('\n') {
        Some((_lang, body)) => body,
        None => rest,
    };

    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Parse the (fence-stripped) reply as an evaluation object.
pub fn parse_evaluation(raw: &str) -> Result<Evaluation, EvaluationError> {
    let cleaned = strip_code_fence(raw);
    serde_json::from_str(cleaned).map_err(|_| EvaluationError::InvalidOutput {
        raw: raw.to_string(),
    })
}

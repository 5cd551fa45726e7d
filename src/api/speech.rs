//! Speech practice endpoints: audio upload and test history
//!
//! The upload handler holds the audio in memory and drives the pipeline to
//! completion before answering — the request suspends for the full
//! transcription wait (bounded by the poll policy).

use crate::api::session::AuthUser;
use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::models::TestHistoryEntry;
use crate::services::speech_pipeline::{self, SpeechSubmission};
use crate::AppState;
use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    routing::{get, post},
    Json, Router,
};

/// Audio uploads stay in memory; cap them well below anything a practice
/// recording produces.
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// POST /api/speech/upload (multipart: audio, topic, duration)
pub async fn upload_and_evaluate(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<speech_pipeline::SpeechReport>> {
    let mut audio: Option<Vec<u8>> = None;
    let mut topic: Option<String> = None;
    let mut duration: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("Malformed multipart body: {}", e)))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("audio") => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::Validation(format!("Failed to read audio: {}", e)))?;
                audio = Some(bytes.to_vec());
            }
            Some("topic") => {
                topic = field.text().await.ok();
            }
            Some("duration") => {
                duration = field.text().await.ok();
            }
            _ => {}
        }
    }

    let audio =
        audio.ok_or_else(|| ApiError::Validation("Audio file is required".to_string()))?;

    let duration_in_seconds: i64 = duration
        .as_deref()
        .and_then(|value| value.trim().parse().ok())
        .ok_or_else(|| ApiError::Validation("Invalid or missing duration".to_string()))?;

    let topic = topic
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| "Unknown Topic".to_string());

    let submission = SpeechSubmission {
        user_id: user.id,
        topic,
        duration_in_seconds,
        audio,
    };

    let report =
        speech_pipeline::run(&state.db, &state.transcription, &state.evaluation, submission)
            .await?;

    Ok(Json(report))
}

/// GET /api/speech/get-test-history
pub async fn test_history(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<TestHistoryEntry>>> {
    let history = db::test_results::history_for(&state.db, user.id).await?;
    Ok(Json(history))
}

/// Build speech routes
pub fn speech_routes() -> Router<AppState> {
    Router::new()
        .route("/api/speech/upload", post(upload_and_evaluate))
        .route("/api/speech/get-test-history", get(test_history))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

//! Speech evaluation pipeline
//!
//! Strictly sequential per submission: upload → transcribe (bounded poll) →
//! evaluate → parse → persist. Any stage failing aborts the whole run; a
//! transcript obtained before a failed evaluation is neither persisted nor
//! returned.

use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::models::Evaluation;
use crate::services::evaluation::{EvaluationClient, EvaluationError};
use crate::services::transcription::{TranscriptionClient, TranscriptionError};
use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

/// One audio submission, held in memory for the duration of the run.
pub struct SpeechSubmission {
    pub user_id: Uuid,
    pub topic: String,
    pub duration_in_seconds: i64,
    pub audio: Vec<u8>,
}

/// What the caller gets back on success.
#[derive(Debug, Serialize)]
pub struct SpeechReport {
    pub transcript: String,
    pub evaluation: Evaluation,
}

/// Run the pipeline for one submission.
pub async fn run(
    pool: &SqlitePool,
    transcription: &TranscriptionClient,
    evaluation: &EvaluationClient,
    submission: SpeechSubmission,
) -> ApiResult<SpeechReport> {
    let transcript = transcription
        .transcribe(submission.audio)
        .await
        .map_err(transcription_error)?;

    tracing::debug!(
        user_id = %submission.user_id,
        chars = transcript.len(),
        "Transcript captured"
    );

    let evaluation = evaluation
        .evaluate(&submission.topic, &transcript)
        .await
        .map_err(evaluation_error)?;

    db::test_results::insert_result(
        pool,
        submission.user_id,
        &submission.topic,
        &transcript,
        &evaluation,
        submission.duration_in_seconds,
    )
    .await?;

    tracing::info!(
        user_id = %submission.user_id,
        overall = evaluation.overall_score,
        "Speech test persisted"
    );

    Ok(SpeechReport {
        transcript,
        evaluation,
    })
}

/// Map transcription failures onto the API taxonomy. The provider-reported
/// job failure keeps its distinctive message; everything else collapses to
/// the generic transcription failure the client retries against.
pub fn transcription_error(error: TranscriptionError) -> ApiError {
    match error {
        TranscriptionError::TranscriptFailed(_) => {
            ApiError::Upstream("AssemblyAI transcription failed".to_string())
        }
        TranscriptionError::TimedOut { attempts } => {
            tracing::warn!(attempts, "Transcription poll budget exhausted");
            ApiError::Upstream("Failed to transcribe audio".to_string())
        }
        other => {
            tracing::error!(error = %other, "Transcription provider error");
            ApiError::Upstream("Failed to transcribe audio".to_string())
        }
    }
}

/// Map evaluation failures onto the API taxonomy, keeping the raw model text
/// on parse failures for diagnosis.
pub fn evaluation_error(error: EvaluationError) -> ApiError {
    match error {
        EvaluationError::InvalidOutput { raw } => ApiError::InvalidModelOutput {
            message: "Invalid JSON from model".to_string(),
            raw_output: raw,
        },
        other => {
            tracing::error!(error = %other, "Model evaluation error");
            ApiError::Upstream("Model evaluation failed".to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_job_failure_keeps_its_message() {
        let err = transcription_error(TranscriptionError::TranscriptFailed(Some(
            "bad audio".to_string(),
        )));
        match err {
            ApiError::Upstream(msg) => assert_eq!(msg, "AssemblyAI transcription failed"),
            other => panic!("expected Upstream, got {:?}", other),
        }
    }

    #[test]
    fn network_failure_maps_to_generic_transcription_message() {
        let err = transcription_error(TranscriptionError::Network("refused".to_string()));
        match err {
            ApiError::Upstream(msg) => assert_eq!(msg, "Failed to transcribe audio"),
            other => panic!("expected Upstream, got {:?}", other),
        }
    }

    #[test]
    fn parse_failure_carries_raw_output() {
        let err = evaluation_error(EvaluationError::InvalidOutput {
            raw: "not json".to_string(),
        });
        match err {
            ApiError::InvalidModelOutput { raw_output, .. } => {
                assert_eq!(raw_output, "not json")
            }
            other => panic!("expected InvalidModelOutput, got {:?}", other),
        }
    }
}

//! Test result queries
//!
//! Results are written once by the speech pipeline and read back newest
//! first by the history endpoint.

use crate::db::users::parse_timestamp;
use crate::error::{ApiError, ApiResult};
use crate::models::{Evaluation, TestHistoryEntry, TestResult};
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

pub async fn insert_result(
    pool: &SqlitePool,
    user_id: Uuid,
    topic: &str,
    transcript: &str,
    evaluation: &Evaluation,
    duration_in_seconds: i64,
) -> ApiResult<TestResult> {
    let id = Uuid::new_v4();
    let created_at = Utc::now();
    let suggestions = serde_json::to_string(&evaluation.suggestions)
        .map_err(|e| ApiError::Internal(format!("Failed to serialize suggestions: {}", e)))?;

    sqlx::query(
        r#"
        INSERT INTO test_results (
            id, user_id, topic, transcript,
            overall_score, fluency, pronunciation, grammar, vocabulary,
            suggestions, duration_in_seconds, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(user_id.to_string())
    .bind(topic)
    .bind(transcript)
    .bind(evaluation.overall_score)
    .bind(evaluation.fluency)
    .bind(evaluation.pronunciation)
    .bind(evaluation.grammar)
    .bind(evaluation.vocabulary)
    .bind(&suggestions)
    .bind(duration_in_seconds)
    .bind(created_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(TestResult {
        id,
        user_id,
        topic: topic.to_string(),
        transcript: transcript.to_string(),
        evaluation: evaluation.clone(),
        duration_in_seconds,
        created_at,
    })
}

/// Prior results for a user, newest first, projecting only the fields the
/// history page renders.
pub async fn history_for(pool: &SqlitePool, user_id: Uuid) -> ApiResult<Vec<TestHistoryEntry>> {
    let rows = sqlx::query(
        r#"
        SELECT topic, transcript,
               overall_score, fluency, pronunciation, grammar, vocabulary,
               suggestions, duration_in_seconds, created_at
        FROM test_results
        WHERE user_id = ?
        ORDER BY created_at DESC
        "#,
    )
    .bind(user_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            let suggestions: String = row.get("suggestions");
            let suggestions: Vec<String> = serde_json::from_str(&suggestions).map_err(|e| {
                ApiError::Internal(format!("Failed to deserialize suggestions: {}", e))
            })?;

            Ok(TestHistoryEntry {
                topic: row.get("topic"),
                transcript: row.get("transcript"),
                evaluation: Evaluation {
                    overall_score: row.get("overall_score"),
                    fluency: row.get("fluency"),
                    pronunciation: row.get("pronunciation"),
                    grammar: row.get("grammar"),
                    vocabulary: row.get("vocabulary"),
                    suggestions,
                },
                duration_in_seconds: row.get("duration_in_seconds"),
                created_at: parse_timestamp(&row.get::<String, _>("created_at"))?,
            })
        })
        .collect()
}

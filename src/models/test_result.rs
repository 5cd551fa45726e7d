//! Speech test result model
//!
//! Written only by the speech pipeline, immutable once created.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The structured evaluation the model is instructed to return: five
/// numeric sub-scores (0–100, fractional values allowed) plus an ordered
/// list of improvement suggestions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub overall_score: f64,
    pub fluency: f64,
    pub pronunciation: f64,
    pub grammar: f64,
    pub vocabulary: f64,
    pub suggestions: Vec<String>,
}

/// One persisted speech submission.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub id: Uuid,
    pub user_id: Uuid,
    pub topic: String,
    pub transcript: String,
    pub evaluation: Evaluation,
    pub duration_in_seconds: i64,
    pub created_at: DateTime<Utc>,
}

/// History projection returned by the test-history endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestHistoryEntry {
    pub topic: String,
    pub transcript: String,
    pub evaluation: Evaluation,
    pub duration_in_seconds: i64,
    pub created_at: DateTime<Utc>,
}

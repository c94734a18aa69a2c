//! Persisted analytics rows, keyed by internal integer ids

use serde::{Deserialize, Serialize};

/// One row per (form, calendar day)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DailyAnalytic {
    pub form_id: i64,
    /// Unix timestamp of the start of the day in the server offset
    pub day_start: i64,
    pub total_visits: i64,
    pub submission_count: i64,
    pub average_duration_seconds: i64,
}

/// Per-choice tally in a choice-shaped distribution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceCount {
    pub id: String,
    pub label: String,
    pub count: i64,
}

/// Distribution summary of one field
///
/// Serialized untagged: a choice distribution is an array of objects, a
/// scale distribution is an array of bucket counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Distribution {
    /// One entry per schema choice, in schema order
    Choices(Vec<ChoiceCount>),
    /// Dense buckets; index `i` counts answers with scale value `i + 1`
    Scale(Vec<i64>),
}

/// Materialized report for one answerable field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldReport {
    pub field_id: i64,
    /// Submissions considered
    pub total: i64,
    /// Non-null answers seen
    pub count: i64,
    /// Rounded to one decimal; zero for choice-shaped fields
    pub average: f64,
    pub distribution: Distribution,
}

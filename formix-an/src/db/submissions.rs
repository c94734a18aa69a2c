//! Read-only submission and answer queries

use formix_common::forms::{AnswerRecord, FieldKind, SubmissionRecord};
use formix_common::Result;
use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use tracing::warn;

/// Answer columns shared by every answer query. The answer's own kind tag
/// wins; older rows without one fall back to the field's kind.
const ANSWER_COLUMNS: &str = r#"
    a.submission_id, a.field_id, COALESCE(a.kind, f.kind) AS kind, a.value
"#;

/// Every submission of a form with its answers, oldest submission first
pub async fn list_for_form(pool: &SqlitePool, form_id: i64) -> Result<Vec<SubmissionRecord>> {
    let submission_rows = sqlx::query(
        "SELECT id, form_id, start_at, end_at FROM submissions WHERE form_id = ? ORDER BY id",
    )
    .bind(form_id)
    .fetch_all(pool)
    .await?;

    let answer_rows = sqlx::query(&format!(
        r#"
        SELECT {ANSWER_COLUMNS}
        FROM submission_fields a
        INNER JOIN submissions s ON s.id = a.submission_id
        INNER JOIN form_fields f ON f.id = a.field_id
        WHERE s.form_id = ?
        ORDER BY a.submission_id, a.field_id
        "#
    ))
    .bind(form_id)
    .fetch_all(pool)
    .await?;

    let mut answers_by_submission: HashMap<i64, Vec<AnswerRecord>> = HashMap::new();
    for row in &answer_rows {
        let answer = answer_from_row(row);
        answers_by_submission
            .entry(answer.submission_id)
            .or_default()
            .push(answer);
    }

    Ok(submission_rows
        .iter()
        .map(|row| {
            let id: i64 = row.get("id");
            SubmissionRecord {
                id,
                form_id: row.get("form_id"),
                start_at: row.get("start_at"),
                end_at: row.get("end_at"),
                answers: answers_by_submission.remove(&id).unwrap_or_default(),
            }
        })
        .collect())
}

/// Every answer given to one field, in submission order
pub async fn list_answers_for_field(pool: &SqlitePool, field_id: i64) -> Result<Vec<AnswerRecord>> {
    let rows = sqlx::query(&format!(
        r#"
        SELECT {ANSWER_COLUMNS}
        FROM submission_fields a
        INNER JOIN form_fields f ON f.id = a.field_id
        WHERE a.field_id = ?
        ORDER BY a.submission_id
        "#
    ))
    .bind(field_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(answer_from_row).collect())
}

/// The `limit` most recently completed answers to one field
pub async fn list_recent_answers(pool: &SqlitePool, field_id: i64, limit: u32) -> Result<Vec<AnswerRecord>> {
    let rows = sqlx::query(&format!(
        r#"
        SELECT {ANSWER_COLUMNS}
        FROM submission_fields a
        INNER JOIN submissions s ON s.id = a.submission_id
        INNER JOIN form_fields f ON f.id = a.field_id
        WHERE a.field_id = ?
        ORDER BY s.end_at DESC, s.id DESC
        LIMIT ?
        "#
    ))
    .bind(field_id)
    .bind(i64::from(limit))
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(answer_from_row).collect())
}

pub async fn count_for_form(pool: &SqlitePool, form_id: i64) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM submissions WHERE form_id = ?")
        .bind(form_id)
        .fetch_one(pool)
        .await?;

    Ok(count)
}

fn answer_from_row(row: &SqliteRow) -> AnswerRecord {
    let submission_id: i64 = row.get("submission_id");
    let field_id: i64 = row.get("field_id");
    let kind: String = row.get("kind");
    let raw: String = row.get("value");

    AnswerRecord {
        submission_id,
        field_id,
        kind: FieldKind::from_tag(&kind),
        value: parse_value(submission_id, field_id, &raw),
    }
}

/// Unreadable stored JSON becomes `Null`, which aggregation skips
fn parse_value(submission_id: i64, field_id: i64, raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|e| {
        warn!(submission_id, field_id, error = %e, "Unreadable answer value, treating as empty");
        Value::Null
    })
}

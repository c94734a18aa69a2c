//! Shared fixtures for formix-an integration tests
//!
//! Each test gets its own SQLite file in a temporary directory; in-memory
//! databases are per-connection and would not be shared across the pool.

#![allow(dead_code)]

use chrono::FixedOffset;
use formix_an::services::engine::EngineSettings;
use formix_common::db::init_database;
use serde_json::Value;
use sqlx::SqlitePool;
use tempfile::TempDir;

pub struct TestDb {
    /// Held so the directory outlives the pool
    pub dir: TempDir,
    pub pool: SqlitePool,
}

pub async fn test_db() -> TestDb {
    let dir = TempDir::new().unwrap();
    let pool = init_database(&dir.path().join("formix.db")).await.unwrap();
    TestDb { dir, pool }
}

pub fn utc() -> FixedOffset {
    FixedOffset::east_opt(0).unwrap()
}

pub fn settings() -> EngineSettings {
    EngineSettings {
        utc_offset: utc(),
        lock_retry_max_ms: 5000,
    }
}

pub async fn insert_form(pool: &SqlitePool, name: &str) -> i64 {
    sqlx::query("INSERT INTO forms (name) VALUES (?)")
        .bind(name)
        .execute(pool)
        .await
        .unwrap()
        .last_insert_rowid()
}

pub async fn insert_group(pool: &SqlitePool, form_id: i64, position: i64) -> i64 {
    sqlx::query("INSERT INTO form_field_groups (form_id, position) VALUES (?, ?)")
        .bind(form_id)
        .bind(position)
        .execute(pool)
        .await
        .unwrap()
        .last_insert_rowid()
}

pub async fn insert_field(
    pool: &SqlitePool,
    group_id: i64,
    position: i64,
    kind: &str,
    properties: Option<Value>,
) -> i64 {
    sqlx::query("INSERT INTO form_fields (group_id, position, kind, properties) VALUES (?, ?, ?, ?)")
        .bind(group_id)
        .bind(position)
        .bind(kind)
        .bind(properties.map(|p| p.to_string()))
        .execute(pool)
        .await
        .unwrap()
        .last_insert_rowid()
}

/// Insert a submission; each answer is `(field_id, kind, value)`
pub async fn insert_submission(pool: &SqlitePool, form_id: i64, end_at: i64, answers: &[(i64, &str, Value)]) -> i64 {
    let submission_id = sqlx::query("INSERT INTO submissions (form_id, start_at, end_at) VALUES (?, ?, ?)")
        .bind(form_id)
        .bind(end_at - 60)
        .bind(end_at)
        .execute(pool)
        .await
        .unwrap()
        .last_insert_rowid();

    for (field_id, kind, value) in answers {
        insert_raw_answer(pool, submission_id, *field_id, kind, &value.to_string()).await;
    }

    submission_id
}

/// Store an answer exactly as given, readable or not
pub async fn insert_raw_answer(pool: &SqlitePool, submission_id: i64, field_id: i64, kind: &str, raw: &str) {
    sqlx::query("INSERT INTO submission_fields (submission_id, field_id, kind, value) VALUES (?, ?, ?, ?)")
        .bind(submission_id)
        .bind(field_id)
        .bind(kind)
        .bind(raw)
        .execute(pool)
        .await
        .unwrap();
}

pub fn choices(ids: &[&str]) -> Value {
    let choices: Vec<Value> = ids
        .iter()
        .map(|id| serde_json::json!({ "id": id, "label": id.to_uppercase() }))
        .collect();
    serde_json::json!({ "choices": choices })
}

/// Raw stored report rows, every column, ordered by field
pub async fn report_rows(pool: &SqlitePool) -> Vec<(i64, i64, i64, f64, String, i64, i64)> {
    sqlx::query_as(
        "SELECT field_id, total, count, average, distribution, created_at, updated_at FROM field_reports ORDER BY field_id",
    )
    .fetch_all(pool)
    .await
    .unwrap()
}

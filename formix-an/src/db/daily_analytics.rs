//! Daily analytics row operations
//!
//! Counter writes are single `INSERT ... ON CONFLICT DO UPDATE` statements.
//! SQLite evaluates the whole upsert under its write lock, so the
//! first-of-day insert and every later increment are atomic with respect to
//! concurrent requests. No read-modify-write happens in application code.

use formix_common::db::DailyAnalytic;
use formix_common::Result;
use sqlx::SqlitePool;

/// Count one visit, creating the day's row on first use
pub async fn increment_visits(pool: &SqlitePool, form_id: i64, day_start: i64, now: i64) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO daily_analytics (
            form_id, day_start, total_visits, submission_count,
            average_duration_seconds, total_duration_seconds, created_at, updated_at
        ) VALUES (?, ?, 1, 0, 0, 0, ?, ?)
        ON CONFLICT(form_id, day_start) DO UPDATE SET
            total_visits = total_visits + 1,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(form_id)
    .bind(day_start)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(())
}

/// Count one submission and fold its duration into the running average
///
/// A first-of-day submission also counts as the day's first visit.
/// On conflict every right-hand side sees the pre-update row, so the new
/// average is computed from the pre-increment count:
/// `floor((sum + duration) / (count + 1))`, with `sum` the exact duration
/// total kept alongside the average.
pub async fn add_submission(
    pool: &SqlitePool,
    form_id: i64,
    day_start: i64,
    duration_seconds: i64,
    now: i64,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO daily_analytics (
            form_id, day_start, total_visits, submission_count,
            average_duration_seconds, total_duration_seconds, created_at, updated_at
        ) VALUES (?, ?, 1, 1, ?, ?, ?, ?)
        ON CONFLICT(form_id, day_start) DO UPDATE SET
            average_duration_seconds =
                (total_duration_seconds + excluded.total_duration_seconds) / (submission_count + 1),
            total_duration_seconds = total_duration_seconds + excluded.total_duration_seconds,
            submission_count = submission_count + 1,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(form_id)
    .bind(day_start)
    .bind(duration_seconds)
    .bind(duration_seconds)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(())
}

/// Load the row for one (form, day)
pub async fn find_for_day(pool: &SqlitePool, form_id: i64, day_start: i64) -> Result<Option<DailyAnalytic>> {
    let row = sqlx::query_as::<_, DailyAnalytic>(
        r#"
        SELECT form_id, day_start, total_visits, submission_count, average_duration_seconds
        FROM daily_analytics
        WHERE form_id = ? AND day_start = ?
        "#,
    )
    .bind(form_id)
    .bind(day_start)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Up to `limit` rows with `day_start <= until`, newest first
pub async fn list_until(pool: &SqlitePool, form_id: i64, until: i64, limit: u32) -> Result<Vec<DailyAnalytic>> {
    let rows = sqlx::query_as::<_, DailyAnalytic>(
        r#"
        SELECT form_id, day_start, total_visits, submission_count, average_duration_seconds
        FROM daily_analytics
        WHERE form_id = ? AND day_start <= ?
        ORDER BY day_start DESC
        LIMIT ?
        "#,
    )
    .bind(form_id)
    .bind(until)
    .bind(i64::from(limit))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

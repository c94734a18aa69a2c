//! Field report persistence
//!
//! Reports are replaced wholesale on every refresh. Each upsert is its own
//! statement; there is no transaction spanning the fields of a form.

use formix_common::db::{Distribution, FieldReport};
use formix_common::{Error, Result};
use sqlx::{Row, SqlitePool};

/// Insert or replace the report for one field
///
/// Returns `true` when a row was inserted or its content changed. Writing an
/// identical report leaves the row untouched, `updated_at` included.
pub async fn upsert(pool: &SqlitePool, report: &FieldReport, now: i64) -> Result<bool> {
    let distribution = serde_json::to_string(&report.distribution)?;

    let result = sqlx::query(
        r#"
        INSERT INTO field_reports (field_id, total, count, average, distribution, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(field_id) DO UPDATE SET
            total = excluded.total,
            count = excluded.count,
            average = excluded.average,
            distribution = excluded.distribution,
            updated_at = excluded.updated_at
        WHERE total != excluded.total
           OR count != excluded.count
           OR average != excluded.average
           OR distribution != excluded.distribution
        "#,
    )
    .bind(report.field_id)
    .bind(report.total)
    .bind(report.count)
    .bind(report.average)
    .bind(&distribution)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Load the stored report of one field
pub async fn find_by_field(pool: &SqlitePool, field_id: i64) -> Result<Option<FieldReport>> {
    let row = sqlx::query(
        "SELECT field_id, total, count, average, distribution FROM field_reports WHERE field_id = ?",
    )
    .bind(field_id)
    .fetch_optional(pool)
    .await?;

    row.map(|row| report_from_row(&row)).transpose()
}

/// All stored reports for a form's fields, in document order
pub async fn list_for_form(pool: &SqlitePool, form_id: i64) -> Result<Vec<FieldReport>> {
    let rows = sqlx::query(
        r#"
        SELECT r.field_id, r.total, r.count, r.average, r.distribution
        FROM field_reports r
        INNER JOIN form_fields f ON f.id = r.field_id
        INNER JOIN form_field_groups g ON g.id = f.group_id
        WHERE g.form_id = ?
        ORDER BY g.position, g.id, f.position, f.id
        "#,
    )
    .bind(form_id)
    .fetch_all(pool)
    .await?;

    rows.iter().map(report_from_row).collect()
}

fn report_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<FieldReport> {
    let field_id: i64 = row.get("field_id");
    let raw: String = row.get("distribution");
    let distribution: Distribution = serde_json::from_str(&raw).map_err(|e| {
        Error::Internal(format!("Corrupt distribution for field {}: {}", field_id, e))
    })?;

    Ok(FieldReport {
        field_id,
        total: row.get("total"),
        count: row.get("count"),
        average: row.get("average"),
        distribution,
    })
}

//! Database initialization
//!
//! Creates the database file and schema on first run. Every statement is
//! `CREATE ... IF NOT EXISTS`, so calling `init_database` against an existing
//! database is safe.
//!
//! The form/submission tables belong to the form CRUD layer; they are created
//! here so that a fresh database is usable, but analytics code only reads them.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// SQLite busy timeout applied to every pooled connection
pub const BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // Pragmas are per connection, so they are set on the connect options
    let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", db_path.display()))?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT);

    let pool = SqlitePoolOptions::new()
        .max_connections(20)
        .min_connections(1)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_schema(&pool).await?;

    Ok(pool)
}

/// Create all tables and indexes (idempotent)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_forms_table(pool).await?;
    create_form_field_groups_table(pool).await?;
    create_form_fields_table(pool).await?;
    create_submissions_table(pool).await?;
    create_submission_fields_table(pool).await?;

    // Analytics-owned tables
    create_daily_analytics_table(pool).await?;
    create_field_reports_table(pool).await?;

    Ok(())
}

async fn create_forms_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS forms (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL DEFAULT '',
            created_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_form_field_groups_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS form_field_groups (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            form_id INTEGER NOT NULL REFERENCES forms(id) ON DELETE CASCADE,
            position INTEGER NOT NULL DEFAULT 0,
            title TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_form_field_groups_form ON form_field_groups(form_id)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_form_fields_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS form_fields (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            group_id INTEGER NOT NULL REFERENCES form_field_groups(id) ON DELETE CASCADE,
            position INTEGER NOT NULL DEFAULT 0,
            title TEXT,
            kind TEXT NOT NULL,
            properties TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_form_fields_group ON form_fields(group_id)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_submissions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS submissions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            form_id INTEGER NOT NULL REFERENCES forms(id) ON DELETE CASCADE,
            start_at INTEGER NOT NULL DEFAULT 0,
            end_at INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_submissions_form ON submissions(form_id)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_submission_fields_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS submission_fields (
            submission_id INTEGER NOT NULL REFERENCES submissions(id) ON DELETE CASCADE,
            field_id INTEGER NOT NULL REFERENCES form_fields(id) ON DELETE CASCADE,
            kind TEXT,
            value TEXT NOT NULL,
            PRIMARY KEY (submission_id, field_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_submission_fields_field ON submission_fields(field_id)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_daily_analytics_table(pool: &SqlitePool) -> Result<()> {
    // total_duration_seconds keeps the exact sum behind the running average
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS daily_analytics (
            form_id INTEGER NOT NULL,
            day_start INTEGER NOT NULL,
            total_visits INTEGER NOT NULL DEFAULT 0 CHECK (total_visits >= 0),
            submission_count INTEGER NOT NULL DEFAULT 0 CHECK (submission_count >= 0),
            average_duration_seconds INTEGER NOT NULL DEFAULT 0 CHECK (average_duration_seconds >= 0),
            total_duration_seconds INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            UNIQUE (form_id, day_start)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_field_reports_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS field_reports (
            field_id INTEGER PRIMARY KEY,
            total INTEGER NOT NULL DEFAULT 0,
            count INTEGER NOT NULL DEFAULT 0,
            average REAL NOT NULL DEFAULT 0,
            distribution TEXT NOT NULL DEFAULT '[]',
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

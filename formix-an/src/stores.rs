//! Collaborator interfaces for the form schema and submission data
//!
//! The analytics engine never writes forms or submissions. It sees them
//! through these traits so that a different backing store can be injected.

use async_trait::async_trait;
use formix_common::forms::{AnswerRecord, Form, SubmissionRecord};
use formix_common::Result;
use sqlx::SqlitePool;

use crate::db;

#[async_trait]
pub trait FormSchemaStore: Send + Sync {
    /// Groups and fields in document order; `None` when the form is missing
    async fn get_form(&self, form_id: i64) -> Result<Option<Form>>;
}

#[async_trait]
pub trait SubmissionStore: Send + Sync {
    /// Every submission of the form with its per-field answers
    async fn list_submissions(&self, form_id: i64) -> Result<Vec<SubmissionRecord>>;

    async fn list_answers_for_field(&self, field_id: i64) -> Result<Vec<AnswerRecord>>;

    async fn count_submissions(&self, form_id: i64) -> Result<i64>;

    /// Newest first by submission completion time
    async fn list_recent_answers(&self, field_id: i64, limit: u32) -> Result<Vec<AnswerRecord>>;
}

/// SQLite-backed form schema reader
#[derive(Clone)]
pub struct SqliteFormSchemaStore {
    pool: SqlitePool,
}

impl SqliteFormSchemaStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FormSchemaStore for SqliteFormSchemaStore {
    async fn get_form(&self, form_id: i64) -> Result<Option<Form>> {
        db::forms::load_form(&self.pool, form_id).await
    }
}

/// SQLite-backed submission reader
#[derive(Clone)]
pub struct SqliteSubmissionStore {
    pool: SqlitePool,
}

impl SqliteSubmissionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubmissionStore for SqliteSubmissionStore {
    async fn list_submissions(&self, form_id: i64) -> Result<Vec<SubmissionRecord>> {
        db::submissions::list_for_form(&self.pool, form_id).await
    }

    async fn list_answers_for_field(&self, field_id: i64) -> Result<Vec<AnswerRecord>> {
        db::submissions::list_answers_for_field(&self.pool, field_id).await
    }

    async fn count_submissions(&self, form_id: i64) -> Result<i64> {
        db::submissions::count_for_form(&self.pool, form_id).await
    }

    async fn list_recent_answers(&self, field_id: i64, limit: u32) -> Result<Vec<AnswerRecord>> {
        db::submissions::list_recent_answers(&self.pool, field_id, limit).await
    }
}

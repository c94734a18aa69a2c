//! Daily visit and submission rollup

use chrono::{DateTime, FixedOffset, Utc};
use formix_common::db::DailyAnalytic;
use formix_common::{time, Error, Result};
use sqlx::SqlitePool;
use tracing::debug;

use crate::db::daily_analytics;
use crate::utils::db_retry::retry_on_lock;

/// Longest accepted form-fill duration: 31 days
pub const MAX_DURATION_SECONDS: i64 = 31 * 24 * 60 * 60;

/// Maintains one `DailyAnalytic` row per (form, day)
#[derive(Clone)]
pub struct VisitCounter {
    pool: SqlitePool,
    utc_offset: FixedOffset,
    lock_retry_max_ms: u64,
}

impl VisitCounter {
    pub fn new(pool: SqlitePool, utc_offset: FixedOffset, lock_retry_max_ms: u64) -> Self {
        Self {
            pool,
            utc_offset,
            lock_retry_max_ms,
        }
    }

    pub fn utc_offset(&self) -> &FixedOffset {
        &self.utc_offset
    }

    pub async fn record_visit(&self, form_id: i64) -> Result<()> {
        self.record_visit_at(form_id, time::now()).await
    }

    /// Count a visit on the day containing `at`
    pub async fn record_visit_at(&self, form_id: i64, at: DateTime<Utc>) -> Result<()> {
        let day_start = time::day_start(at, &self.utc_offset);
        let now = at.timestamp();

        retry_on_lock("record_visit", self.lock_retry_max_ms, || {
            daily_analytics::increment_visits(&self.pool, form_id, day_start, now)
        })
        .await?;

        debug!(form_id, day_start, "Visit recorded");
        Ok(())
    }

    pub async fn record_submission(&self, form_id: i64, duration_seconds: i64) -> Result<()> {
        self.record_submission_at(form_id, duration_seconds, time::now()).await
    }

    /// Count a submission on the day containing `at`
    pub async fn record_submission_at(
        &self,
        form_id: i64,
        duration_seconds: i64,
        at: DateTime<Utc>,
    ) -> Result<()> {
        if duration_seconds < 0 {
            return Err(Error::InvalidInput(format!(
                "Submission duration must not be negative, got {}",
                duration_seconds
            )));
        }
        if duration_seconds > MAX_DURATION_SECONDS {
            return Err(Error::InvalidInput(format!(
                "Submission duration must not exceed {} seconds, got {}",
                MAX_DURATION_SECONDS, duration_seconds
            )));
        }

        let day_start = time::day_start(at, &self.utc_offset);
        let now = at.timestamp();

        retry_on_lock("record_submission", self.lock_retry_max_ms, || {
            daily_analytics::add_submission(&self.pool, form_id, day_start, duration_seconds, now)
        })
        .await?;

        debug!(form_id, day_start, duration_seconds, "Submission recorded");
        Ok(())
    }

    /// Row for the day containing `at`, if anything was recorded that day
    pub async fn day(&self, form_id: i64, at: DateTime<Utc>) -> Result<Option<DailyAnalytic>> {
        let day_start = time::day_start(at, &self.utc_offset);
        daily_analytics::find_for_day(&self.pool, form_id, day_start).await
    }
}

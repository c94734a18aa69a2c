//! Read path over the daily analytics series

use formix_common::db::DailyAnalytic;
use formix_common::{Error, Result};
use sqlx::SqlitePool;

use crate::db::daily_analytics;

pub const MIN_RANGE_DAYS: i64 = 7;
pub const MAX_RANGE_DAYS: i64 = 365;

/// Range in days must lie in `[MIN_RANGE_DAYS, MAX_RANGE_DAYS]`; no clamping
pub fn validate_range_days(range_days: i64) -> Result<u32> {
    if !(MIN_RANGE_DAYS..=MAX_RANGE_DAYS).contains(&range_days) {
        return Err(Error::InvalidInput(format!(
            "Range must be between {} and {} days, got {}",
            MIN_RANGE_DAYS, MAX_RANGE_DAYS, range_days
        )));
    }

    Ok(range_days as u32)
}

#[derive(Clone)]
pub struct AnalyticsQueryService {
    pool: SqlitePool,
}

impl AnalyticsQueryService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// At most `range_days` rows with `day_start <= end_of_day`, newest first
    pub async fn daily_series(&self, form_id: i64, end_of_day: i64, range_days: i64) -> Result<Vec<DailyAnalytic>> {
        let limit = validate_range_days(range_days)?;
        daily_analytics::list_until(&self.pool, form_id, end_of_day, limit).await
    }
}

//! Timestamp and calendar-day utilities
//!
//! Daily analytics are keyed by the unix timestamp of local midnight in the
//! server's fixed UTC offset.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Utc};

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Unix timestamp of the start of the day containing `at`, in `offset`
pub fn day_start(at: DateTime<Utc>, offset: &FixedOffset) -> i64 {
    let local_midnight = at.with_timezone(offset).date_naive().and_time(NaiveTime::MIN);
    local_midnight.and_utc().timestamp() - i64::from(offset.local_minus_utc())
}

/// Unix timestamp of the last second of the day containing `at`, in `offset`
pub fn day_end(at: DateTime<Utc>, offset: &FixedOffset) -> i64 {
    day_start(at, offset) + SECONDS_PER_DAY - 1
}

/// Calendar date of a stored day key, in `offset`
pub fn day_label(day_start: i64, offset: &FixedOffset) -> NaiveDate {
    DateTime::<Utc>::from_timestamp(day_start, 0)
        .unwrap_or_default()
        .with_timezone(offset)
        .date_naive()
}

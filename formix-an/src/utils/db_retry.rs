//! Retry for SQLite write contention
//!
//! Counter upserts are single statements, so re-running one after a lock
//! failure cannot double-count: a failed statement wrote nothing.

use formix_common::Result;
use std::future::Future;
use std::time::{Duration, Instant};

const FIRST_BACKOFF: Duration = Duration::from_millis(10);
const BACKOFF_CAP: Duration = Duration::from_millis(1000);

/// Run `operation`, re-running it while it fails with "database is locked"
///
/// Backoff doubles from 10ms up to 1s per wait and never sleeps past the
/// `budget_ms` deadline. Once the deadline has passed the last lock error is
/// returned. Other errors are returned on the first attempt.
pub async fn retry_on_lock<F, Fut, T>(label: &str, budget_ms: u64, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let deadline = Instant::now() + Duration::from_millis(budget_ms);
    let mut backoff = FIRST_BACKOFF;
    let mut attempts = 1u32;

    loop {
        let err = match operation().await {
            Ok(value) => {
                if attempts > 1 {
                    tracing::debug!(operation = label, attempts, "Locked write went through on retry");
                }
                return Ok(value);
            }
            Err(err) if err.is_database_locked() => err,
            Err(err) => return Err(err),
        };

        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            tracing::error!(operation = label, attempts, budget_ms, "Database still locked, giving up");
            return Err(err);
        }

        let wait = backoff.min(remaining);
        tracing::warn!(
            operation = label,
            attempts,
            wait_ms = wait.as_millis() as u64,
            "Database locked, retrying"
        );
        tokio::time::sleep(wait).await;

        backoff = (backoff * 2).min(BACKOFF_CAP);
        attempts += 1;
    }
}

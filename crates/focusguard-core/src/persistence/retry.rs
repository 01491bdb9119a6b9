//! Retry policy and quota eviction for snapshot writes.

use std::time::Duration;

use chrono::{Days, NaiveDate};

use crate::clock::date_key;
use crate::error::StoreError;
use crate::model::DailyStatsMap;
use crate::store::QUOTA_BYTES_PER_ITEM;

/// How a failed write should be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Try again after the backoff.
    Transient,
    /// An item was too large; prune history, then try again.
    QuotaExceeded,
    /// Retrying cannot help.
    Fatal,
}

/// Attempts, backoff and eviction window for one logical write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Delay after the first failure; doubles on every further failure.
    pub base_backoff: Duration,
    /// Days of daily stats kept when evicting under quota pressure.
    pub keep_days: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff: Duration::from_millis(500),
            keep_days: 30,
        }
    }
}

impl RetryPolicy {
    /// Delay before the attempt after `attempt` (zero-based) failed.
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_backoff
            .saturating_mul(2u32.saturating_pow(attempt))
    }

    pub fn is_last_attempt(&self, attempt: u32) -> bool {
        attempt + 1 >= self.max_attempts
    }

    pub fn classify(&self, error: &StoreError) -> FailureKind {
        match error {
            StoreError::Write(message) if message.contains(QUOTA_BYTES_PER_ITEM) => {
                FailureKind::QuotaExceeded
            }
            StoreError::Write(_) | StoreError::Io { .. } => FailureKind::Transient,
            StoreError::Json(_) | StoreError::Config(_) => FailureKind::Fatal,
        }
    }
}

/// Drop daily stats older than `keep_days` before `today`.
///
/// Keys are fixed-width `YYYY-MM-DD`, so string order is date order.
pub fn clean_old_stats(map: &DailyStatsMap, keep_days: u32, today: NaiveDate) -> DailyStatsMap {
    let cutoff_date = today
        .checked_sub_days(Days::new(u64::from(keep_days)))
        .unwrap_or(NaiveDate::MIN);
    let cutoff = date_key(cutoff_date);
    map.iter()
        .filter(|(date, _)| date.as_str() >= cutoff.as_str())
        .map(|(date, stats)| (date.clone(), stats.clone()))
        .collect()
}

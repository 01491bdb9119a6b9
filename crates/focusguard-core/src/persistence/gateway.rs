//! Retrying snapshot writes.
//!
//! One logical write moves through:
//!
//! ```text
//! ATTEMPT(n) -> SUCCESS
//!            -> RETRY (sleep backoff(n)) -> ATTEMPT(n+1)
//!            -> EVICT (prune daily stats) -> RETRY
//!            -> FAIL (last attempt, or fatal error)
//! ```

use std::sync::Arc;

use crate::clock::Clock;
use crate::error::{PersistError, StoreError};
use crate::model::StorageData;
use crate::store::KeyValueStore;

use super::retry::{clean_old_stats, FailureKind, RetryPolicy};

pub struct PersistenceGateway {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    policy: RetryPolicy,
}

impl PersistenceGateway {
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>, policy: RetryPolicy) -> Self {
        Self {
            store,
            clock,
            policy,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Write the full snapshot, retrying per the policy.
    ///
    /// Quota eviction only changes the payload being written, never the
    /// caller's snapshot.
    pub async fn save_with_retry(&self, snapshot: &StorageData) -> Result<(), PersistError> {
        let mut snapshot = snapshot.clone();
        let mut attempt = 0;
        loop {
            let items = snapshot
                .to_items()
                .map_err(|e| PersistError::Fatal(StoreError::Json(e)))?;

            let error = match self.store.set(items).await {
                Ok(()) => {
                    if attempt > 0 {
                        tracing::info!(attempt = attempt + 1, "snapshot write succeeded after retry");
                    }
                    return Ok(());
                }
                Err(error) => error,
            };

            let kind = self.policy.classify(&error);
            tracing::warn!(
                attempt = attempt + 1,
                max = self.policy.max_attempts,
                kind = ?kind,
                error = %error,
                "snapshot write failed"
            );

            match kind {
                FailureKind::Fatal => return Err(PersistError::Fatal(error)),
                _ if self.policy.is_last_attempt(attempt) => {
                    return Err(PersistError::Exhausted {
                        attempts: attempt + 1,
                        source: error,
                    });
                }
                FailureKind::QuotaExceeded => {
                    let before = snapshot.daily_stats_map.len();
                    snapshot.daily_stats_map = clean_old_stats(
                        &snapshot.daily_stats_map,
                        self.policy.keep_days,
                        self.clock.today(),
                    );
                    tracing::info!(
                        evicted = before - snapshot.daily_stats_map.len(),
                        keep_days = self.policy.keep_days,
                        "pruned daily stats to fit storage quota"
                    );
                }
                FailureKind::Transient => {}
            }

            tokio::time::sleep(self.policy.backoff(attempt)).await;
            attempt += 1;
        }
    }
}

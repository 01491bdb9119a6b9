//! Durable writes of the engine state.
//!
//! - [`RetryPolicy`]: attempts, exponential backoff, error classification.
//! - [`PersistenceGateway`]: retries one snapshot write, pruning old daily
//!   stats when the store reports a per-item quota violation.
//! - [`SnapshotWriter`]: serializes writes through one background task.

mod gateway;
mod retry;
mod writer;

pub use gateway::PersistenceGateway;
pub use retry::{clean_old_stats, FailureKind, RetryPolicy};
pub use writer::{SnapshotWriter, WriterStatus};

//! Single-writer snapshot queue.
//!
//! Mutators publish full snapshots without waiting. One background task
//! owns the [`PersistenceGateway`] and writes the most recent snapshot it
//! has not written yet, so at most one write is in flight and snapshots
//! published during a write collapse into the next one. The newest state
//! always lands last; an older snapshot's retry can never overwrite it.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::model::StorageData;

use super::gateway::PersistenceGateway;

#[derive(Debug, Clone)]
struct Pending {
    generation: u64,
    snapshot: StorageData,
}

/// Outcome of the writes processed so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriterStatus {
    /// Generation of the most recent snapshot whose write finished.
    pub completed: u64,
    /// Message of the last failed write, until a later write succeeds or
    /// the error is cleared.
    pub last_error: Option<String>,
}

pub struct SnapshotWriter {
    pending: watch::Sender<Option<Pending>>,
    status: Arc<watch::Sender<WriterStatus>>,
    scheduled: u64,
    task: JoinHandle<()>,
}

impl SnapshotWriter {
    /// Start the writer task on the current tokio runtime.
    pub fn spawn(gateway: PersistenceGateway) -> Self {
        let (pending, rx) = watch::channel(None);
        let status = Arc::new(watch::channel(WriterStatus::default()).0);
        let task = tokio::spawn(run(gateway, rx, status.clone()));
        Self {
            pending,
            status,
            scheduled: 0,
            task,
        }
    }

    /// Queue `snapshot`, replacing any snapshot not yet picked up.
    pub fn schedule(&mut self, snapshot: StorageData) {
        self.scheduled += 1;
        let generation = self.scheduled;
        self.pending.send_replace(Some(Pending {
            generation,
            snapshot,
        }));
        tracing::trace!(generation, "snapshot scheduled");
    }

    /// Wait until everything scheduled so far has been written or has failed.
    pub async fn flush(&self) {
        let target = self.scheduled;
        let mut rx = self.status.subscribe();
        if rx.wait_for(|s| s.completed >= target).await.is_err() {
            tracing::warn!("snapshot writer stopped before flush completed");
        }
    }

    pub fn status(&self) -> WriterStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<WriterStatus> {
        self.status.subscribe()
    }

    pub fn last_error(&self) -> Option<String> {
        self.status.borrow().last_error.clone()
    }

    pub fn clear_error(&self) {
        self.status.send_modify(|s| s.last_error = None);
    }

    /// Flush, then stop the writer task.
    pub async fn shutdown(self) {
        self.flush().await;
        self.task.abort();
    }
}

async fn run(
    gateway: PersistenceGateway,
    mut rx: watch::Receiver<Option<Pending>>,
    status: Arc<watch::Sender<WriterStatus>>,
) {
    while rx.changed().await.is_ok() {
        let Some(pending) = rx.borrow_and_update().clone() else {
            continue;
        };

        let result = gateway.save_with_retry(&pending.snapshot).await;
        status.send_modify(|s| {
            s.completed = pending.generation;
            match &result {
                Ok(()) => s.last_error = None,
                Err(e) => s.last_error = Some(e.to_string()),
            }
        });
        if let Err(e) = result {
            tracing::error!(generation = pending.generation, error = %e, "snapshot not persisted");
        }
    }
}

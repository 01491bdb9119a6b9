//! In-memory key-value store.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::broadcast;

use super::{check_item_quota, select, ChangeNotifier, Items, KeyValueStore, StorageChange};
use crate::error::StoreError;

#[derive(Debug, Default)]
struct Inner {
    data: Items,
    /// Messages of write failures to return before accepting writes again.
    pending_failures: VecDeque<String>,
    /// Every batch passed to `set`, accepted or not.
    write_log: Vec<Items>,
}

/// Store that lives only as long as the process.
///
/// Besides headless use it doubles as a fault-injection backend: queued
/// failures make the next `set` calls fail with a given message, and every
/// attempted write is logged.
#[derive(Debug)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    quota_bytes_per_item: Option<usize>,
    notifier: ChangeNotifier,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_quota(None)
    }

    pub fn with_quota(quota_bytes_per_item: Option<usize>) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            quota_bytes_per_item,
            notifier: ChangeNotifier::new("memory"),
        }
    }

    /// Make the next `set` fail with `message`. Calls queue up in order.
    pub fn fail_next(&self, message: impl Into<String>) {
        self.lock().pending_failures.push_back(message.into());
    }

    /// Number of `set` calls so far, including failed ones.
    pub fn write_count(&self) -> usize {
        self.lock().write_log.len()
    }

    /// Every batch passed to `set`, oldest first.
    pub fn write_log(&self) -> Vec<Items> {
        self.lock().write_log.clone()
    }

    /// Current contents.
    pub fn snapshot(&self) -> Items {
        self.lock().data.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, keys: &[&str]) -> Result<Items, StoreError> {
        Ok(select(&self.lock().data, keys))
    }

    async fn set(&self, items: Items) -> Result<(), StoreError> {
        let mut inner = self.lock();
        inner.write_log.push(items.clone());
        if let Some(message) = inner.pending_failures.pop_front() {
            return Err(StoreError::Write(message));
        }
        check_item_quota(&items, self.quota_bytes_per_item)?;
        self.notifier.apply(&mut inner.data, items);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.notifier.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn one(key: &str, value: serde_json::Value) -> Items {
        let mut items = Items::new();
        items.insert(key.to_string(), value);
        items
    }

    #[tokio::test]
    async fn set_then_get() {
        let store = MemoryStore::new();
        store.set(one("tasks", json!([]))).await.unwrap();
        let got = store.get(&["tasks", "settings"]).await.unwrap();
        assert_eq!(got.get("tasks"), Some(&json!([])));
        assert!(!got.contains_key("settings"));
    }

    #[tokio::test]
    async fn scripted_failures_are_consumed_in_order() {
        let store = MemoryStore::new();
        store.fail_next("disk on fire");
        store.fail_next("still on fire");

        let first = store.set(one("a", json!(1))).await.unwrap_err();
        let second = store.set(one("a", json!(1))).await.unwrap_err();
        assert_eq!(first.to_string(), "disk on fire");
        assert_eq!(second.to_string(), "still on fire");
        store.set(one("a", json!(1))).await.unwrap();

        assert_eq!(store.write_count(), 3);
        assert_eq!(store.snapshot().get("a"), Some(&json!(1)));
    }

    #[tokio::test]
    async fn quota_rejects_whole_batch() {
        let store = MemoryStore::with_quota(Some(32));
        let mut batch = one("small", json!(1));
        batch.insert("large".into(), json!("y".repeat(64)));

        assert!(store.set(batch).await.is_err());
        assert!(store.snapshot().is_empty());
    }

    #[tokio::test]
    async fn subscribers_see_changes() {
        let store = MemoryStore::new();
        let mut rx = store.subscribe();
        store.set(one("rewardStatus", json!({"bonusMinutes": 60}))).await.unwrap();
        let change = rx.recv().await.unwrap();
        assert!(change.changes.contains_key("rewardStatus"));
    }
}

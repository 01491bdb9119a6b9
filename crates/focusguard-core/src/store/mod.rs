//! Asynchronous key-value storage.
//!
//! The engine persists its state as a handful of JSON values under fixed
//! keys. Backends implement [`KeyValueStore`]; which one is used is decided
//! by [`StorageConfig`](crate::config::StorageConfig), never by probing the
//! environment.
//!
//! - [`MemoryStore`]: in-process, for headless and development use. Supports
//!   a per-item quota and scripted write failures.
//! - [`FileStore`]: a single JSON document on local disk.

mod file;
mod memory;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;

use crate::config::{StorageBackend, StorageConfig};
use crate::error::StoreError;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Key/value pairs read from or written to a store.
pub type Items = serde_json::Map<String, Value>;

/// Marker a backend puts in its error message when one item exceeds the
/// per-item size limit.
pub const QUOTA_BYTES_PER_ITEM: &str = "QUOTA_BYTES_PER_ITEM";

const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Old and new value of one key in a change notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueChange {
    pub old_value: Option<Value>,
    pub new_value: Option<Value>,
}

/// A batch of key changes produced by one `set`.
#[derive(Debug, Clone, PartialEq)]
pub struct StorageChange {
    pub changes: BTreeMap<String, ValueChange>,
    pub area_name: String,
}

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the given keys. Keys with no stored value are absent from the result.
    async fn get(&self, keys: &[&str]) -> Result<Items, StoreError>;

    /// Write all items or none of them.
    async fn set(&self, items: Items) -> Result<(), StoreError>;

    /// Receive a [`StorageChange`] after every `set` that changed something.
    fn subscribe(&self) -> broadcast::Receiver<StorageChange>;
}

/// Open the backend selected by `config`.
pub fn open_store(config: &StorageConfig) -> Result<Arc<dyn KeyValueStore>, StoreError> {
    let store: Arc<dyn KeyValueStore> = match config.backend {
        StorageBackend::Memory => Arc::new(MemoryStore::with_quota(config.quota_bytes_per_item)),
        StorageBackend::File => {
            let path = config.resolved_path()?;
            Arc::new(FileStore::new(path).with_quota(config.quota_bytes_per_item))
        }
    };
    tracing::debug!(backend = ?config.backend, "opened key-value store");
    Ok(store)
}

/// Fan-out for change notifications shared by the backends.
#[derive(Debug)]
pub(crate) struct ChangeNotifier {
    area_name: &'static str,
    sender: broadcast::Sender<StorageChange>,
}

impl ChangeNotifier {
    pub(crate) fn new(area_name: &'static str) -> Self {
        let (sender, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self { area_name, sender }
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.sender.subscribe()
    }

    /// Apply `items` to `data` and notify subscribers about keys whose value changed.
    pub(crate) fn apply(&self, data: &mut Items, items: Items) {
        let mut changes = BTreeMap::new();
        for (key, new_value) in items {
            let old_value = data.insert(key.clone(), new_value.clone());
            if old_value.as_ref() != Some(&new_value) {
                changes.insert(
                    key,
                    ValueChange {
                        old_value,
                        new_value: Some(new_value),
                    },
                );
            }
        }
        if changes.is_empty() {
            return;
        }
        // No receivers is fine; nobody is listening yet.
        let _ = self.sender.send(StorageChange {
            changes,
            area_name: self.area_name.to_string(),
        });
    }
}

/// Reject the batch if any single item is larger than `quota` bytes.
///
/// Size is measured as the key plus the JSON encoding of the value.
pub(crate) fn check_item_quota(items: &Items, quota: Option<usize>) -> Result<(), StoreError> {
    let Some(quota) = quota else {
        return Ok(());
    };
    for (key, value) in items {
        let size = key.len() + serde_json::to_string(value)?.len();
        if size > quota {
            return Err(StoreError::Write(format!(
                "{QUOTA_BYTES_PER_ITEM} quota exceeded: item '{key}' is {size} bytes (limit {quota})"
            )));
        }
    }
    Ok(())
}

/// Copy the requested keys out of `data`.
pub(crate) fn select(data: &Items, keys: &[&str]) -> Items {
    keys.iter()
        .filter_map(|key| data.get(*key).map(|v| ((*key).to_string(), v.clone())))
        .collect()
}

//! File-backed key-value store.
//!
//! All keys live in one JSON object on disk. Writes go to a sibling temp
//! file that is renamed over the original, so a crash mid-write leaves the
//! previous contents intact.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::{broadcast, Mutex};

use super::{check_item_quota, select, ChangeNotifier, Items, KeyValueStore, StorageChange};
use crate::error::StoreError;

#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    quota_bytes_per_item: Option<usize>,
    /// Serializes read-modify-write cycles.
    lock: Mutex<()>,
    notifier: ChangeNotifier,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            quota_bytes_per_item: None,
            lock: Mutex::new(()),
            notifier: ChangeNotifier::new("local"),
        }
    }

    pub fn with_quota(mut self, quota_bytes_per_item: Option<usize>) -> Self {
        self.quota_bytes_per_item = quota_bytes_per_item;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    async fn read_all(&self) -> Result<Items, StoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => Ok(Items::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Items::new()),
            Err(e) => Err(self.io_error(e)),
        }
    }

    async fn write_all(&self, data: &Items) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }
        let content = serde_json::to_string(data)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, content)
            .await
            .map_err(|e| self.io_error(e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| self.io_error(e))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, keys: &[&str]) -> Result<Items, StoreError> {
        let _guard = self.lock.lock().await;
        let data = self.read_all().await?;
        Ok(select(&data, keys))
    }

    async fn set(&self, items: Items) -> Result<(), StoreError> {
        check_item_quota(&items, self.quota_bytes_per_item)?;
        let _guard = self.lock.lock().await;
        let mut data = self.read_all().await?;
        let mut merged = data.clone();
        merged.extend(items.clone());
        self.write_all(&merged).await?;
        self.notifier.apply(&mut data, items);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.notifier.subscribe()
    }
}

//! Full-state backup export and import.
//!
//! A backup is the five storage keys as one pretty-printed JSON object.
//! Export reads straight from the store, so it reflects what is durable
//! rather than what is in memory. Import validates the shape, then replaces
//! every key at once. Engines pick the new state up through the store's
//! change notifications or [`FocusEngine::reload`](crate::FocusEngine::reload).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;

use crate::clock::Clock;
use crate::error::{BackupError, StoreError};
use crate::model::{
    StorageData, KEY_CURRENT_SESSION, KEY_DAILY_STATS, KEY_REWARD_STATUS, KEY_SETTINGS, KEY_TASKS,
    STORAGE_KEYS,
};
use crate::store::{Items, KeyValueStore};

/// Serialized backup ready to be offered as a download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupFile {
    pub file_name: String,
    pub contents: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub tasks: usize,
    pub stats_days: usize,
}

pub struct BackupCodec {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
}

impl BackupCodec {
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// `focus-guard-backup-YYYY-MM-DD.json` for today.
    pub fn file_name(&self) -> String {
        format!("focus-guard-backup-{}.json", self.clock.today_key())
    }

    /// Read the stored envelope. Keys never written are exported with their
    /// default values.
    pub async fn export_data(&self) -> Result<BackupFile, BackupError> {
        let stored = self.store.get(&STORAGE_KEYS).await?;
        let defaults = StorageData::default().to_items().map_err(StoreError::from)?;

        let mut envelope = Items::new();
        for key in STORAGE_KEYS {
            let value = match stored.get(key) {
                Some(value) if !value.is_null() => value.clone(),
                _ => defaults.get(key).cloned().unwrap_or(Value::Null),
            };
            envelope.insert(key.to_string(), value);
        }

        let contents =
            serde_json::to_string_pretty(&Value::Object(envelope)).map_err(StoreError::from)?;
        tracing::info!(bytes = contents.len(), "backup exported");
        Ok(BackupFile {
            file_name: self.file_name(),
            contents,
        })
    }

    /// Export into `dir`, returning the path of the written file.
    pub async fn export_to_dir(&self, dir: &Path) -> Result<PathBuf, BackupError> {
        let backup = self.export_data().await?;
        let path = dir.join(&backup.file_name);
        tokio::fs::write(&path, backup.contents)
            .await
            .map_err(|source| BackupError::Io {
                path: path.clone(),
                source,
            })?;
        Ok(path)
    }

    /// Validate `contents` and replace the stored state with it verbatim.
    pub async fn import_data(&self, contents: &str) -> Result<ImportSummary, BackupError> {
        let value: Value = serde_json::from_str(contents).map_err(BackupError::Parse)?;
        let envelope = validate_backup(&value)?;
        StorageData::from_items(envelope)
            .map_err(|e| BackupError::Validation(format!("backup does not load: {e}")))?;

        let summary = ImportSummary {
            tasks: envelope[KEY_TASKS].as_array().map_or(0, Vec::len),
            stats_days: envelope[KEY_DAILY_STATS].as_object().map_or(0, |m| m.len()),
        };
        self.store.set(envelope.clone()).await?;
        tracing::info!(tasks = summary.tasks, stats_days = summary.stats_days, "backup imported");
        Ok(summary)
    }

    pub async fn import_file(&self, path: &Path) -> Result<ImportSummary, BackupError> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| BackupError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        self.import_data(&contents).await
    }
}

/// Check that `value` has every storage key with the minimal expected shape.
///
/// All defects are reported together, separated by `; `.
pub fn validate_backup(value: &Value) -> Result<&Items, BackupError> {
    let Some(envelope) = value.as_object() else {
        return Err(BackupError::Validation(
            "backup must be a JSON object".into(),
        ));
    };

    let mut defects = Vec::new();
    for key in STORAGE_KEYS {
        if !envelope.contains_key(key) {
            defects.push(format!("missing key '{key}'"));
        }
    }

    if let Some(settings) = envelope.get(KEY_SETTINGS) {
        match settings.as_object() {
            None => defects.push("settings must be an object".into()),
            Some(settings) => {
                if !settings.get("hourlyRate").is_some_and(Value::is_number) {
                    defects.push("settings.hourlyRate must be a number".into());
                }
                if !matches!(
                    settings.get("mode").and_then(Value::as_str),
                    Some("strict" | "auto")
                ) {
                    defects.push("settings.mode must be 'strict' or 'auto'".into());
                }
                if !settings.get("distractingSites").is_some_and(Value::is_array) {
                    defects.push("settings.distractingSites must be an array".into());
                }
            }
        }
    }

    if let Some(session) = envelope.get(KEY_CURRENT_SESSION) {
        if !session.get("isActive").is_some_and(Value::is_boolean) {
            defects.push("currentSession.isActive must be a boolean".into());
        }
    }
    if envelope.get(KEY_TASKS).is_some_and(|v| !v.is_array()) {
        defects.push("tasks must be an array".into());
    }
    if envelope.get(KEY_DAILY_STATS).is_some_and(|v| !v.is_object()) {
        defects.push("dailyStatsMap must be an object".into());
    }
    if envelope.get(KEY_REWARD_STATUS).is_some_and(|v| !v.is_object()) {
        defects.push("rewardStatus must be an object".into());
    }

    if defects.is_empty() {
        Ok(envelope)
    } else {
        Err(BackupError::Validation(defects.join("; ")))
    }
}

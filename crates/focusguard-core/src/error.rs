//! Core error types for focusguard-core.
//!
//! This module defines the error hierarchy using thiserror. Store failures
//! are classified by the persistence gateway; backup failures surface to
//! callers that explicitly await an import or export.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for focusguard-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Key-value store errors
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// Write failures after the retry policy gave up
    #[error("Persistence error: {0}")]
    Persist(#[from] PersistError),

    /// Backup export/import errors
    #[error("Backup error: {0}")]
    Backup(#[from] BackupError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised by a [`KeyValueStore`](crate::store::KeyValueStore) backend.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backend rejected a write. The message is provider-defined and may
    /// contain `QUOTA_BYTES_PER_ITEM` when a single item is too large.
    #[error("{0}")]
    Write(String),

    /// Local disk failure in a file-backed store
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A stored value could not be encoded or decoded
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The backend could not be located from configuration
    #[error("Store configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Failure of one logical snapshot write.
#[derive(Error, Debug)]
pub enum PersistError {
    /// Every attempt failed; carries the last error.
    #[error("write failed after {attempts} attempts: {source}")]
    Exhausted {
        attempts: u32,
        #[source]
        source: StoreError,
    },

    /// The failure cannot improve by retrying.
    #[error("write failed permanently: {0}")]
    Fatal(#[source] StoreError),
}

impl PersistError {
    /// The underlying store error.
    pub fn store_error(&self) -> &StoreError {
        match self {
            PersistError::Exhausted { source, .. } => source,
            PersistError::Fatal(source) => source,
        }
    }
}

/// Backup codec errors.
#[derive(Error, Debug)]
pub enum BackupError {
    /// The backup file is not valid JSON
    #[error("Backup is not valid JSON: {0}")]
    Parse(#[source] serde_json::Error),

    /// The backup parsed but is missing keys or has malformed values
    #[error("Invalid backup: {0}")]
    Validation(String),

    /// Reading or writing the store failed
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// Reading or writing the backup file failed
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Data directory could not be determined or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),

    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

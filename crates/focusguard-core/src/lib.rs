//! # Focus Guard Core Library
//!
//! State and persistence engine for the Focus Guard focus tracker. UI,
//! browser plumbing and charts live elsewhere; this crate owns the data and
//! the rules that change it.
//!
//! ## Architecture
//!
//! - **Engine**: [`FocusEngine`] holds tasks, the work session, daily stats
//!   and rewards, and exposes the mutators
//! - **Daily stats**: a per-day cache that is only refreshed at explicit
//!   checkpoints
//! - **Rewards**: unlimited-until-midnight and bonus minutes earned from the
//!   daily goal
//! - **Persistence**: retrying, quota-aware snapshot writes through a single
//!   writer task
//! - **Backup**: lossless export and validated import of the full state
//!
//! ## Key Components
//!
//! - [`FocusEngine`]: State container and mutators
//! - [`KeyValueStore`]: Injected storage capability
//! - [`Clock`]: Injected wall clock and local calendar
//! - [`PersistenceGateway`]: Retry and eviction for one write
//! - [`BackupCodec`]: Export/import
//! - [`EngineConfig`]: Backend selection and retry policy

pub mod accounting;
pub mod backup;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod model;
pub mod persistence;
pub mod reward;
pub mod stats;
pub mod store;

pub use backup::{BackupCodec, BackupFile, ImportSummary};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{EngineConfig, StorageBackend, StorageConfig};
pub use engine::FocusEngine;
pub use error::{BackupError, ConfigError, CoreError, PersistError, StoreError};
pub use model::{
    BlockingMode, CurrentSession, DailyGoal, DailyStats, DailyStatsMap, RewardStatus, SiteAction,
    SiteRule, StorageData, Task, TaskPatch, UserSettings, WeeklyGoal,
};
pub use persistence::{PersistenceGateway, RetryPolicy, SnapshotWriter, WriterStatus};
pub use store::{FileStore, KeyValueStore, MemoryStore, StorageChange};

//! Persisted domain types.
//!
//! Every type here serializes with camelCase keys; the same JSON shape is
//! used in the key-value store and in backup files.

mod settings;
mod task;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use settings::{
    BlockingMode, DailyGoal, NotificationSettings, SiteAction, SiteRule, UserSettings, WeeklyGoal,
};
pub use task::{CurrentSession, Task, TaskPatch};

/// Store keys making up the persisted envelope.
pub const KEY_SETTINGS: &str = "settings";
pub const KEY_CURRENT_SESSION: &str = "currentSession";
pub const KEY_TASKS: &str = "tasks";
pub const KEY_DAILY_STATS: &str = "dailyStatsMap";
pub const KEY_REWARD_STATUS: &str = "rewardStatus";

pub const STORAGE_KEYS: [&str; 5] = [
    KEY_SETTINGS,
    KEY_CURRENT_SESSION,
    KEY_TASKS,
    KEY_DAILY_STATS,
    KEY_REWARD_STATUS,
];

/// Aggregate for one local calendar day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStats {
    /// `YYYY-MM-DD`
    #[serde(default)]
    pub date: String,
    /// Seconds.
    #[serde(default)]
    pub total_focus_time: u64,
    /// Seconds.
    #[serde(default)]
    pub total_distract_time: u64,
    /// Whole units when written here; other writers may store fractions.
    #[serde(default)]
    pub earned_money: f64,
    #[serde(default)]
    pub lost_money: f64,
    #[serde(default)]
    pub completed_tasks: u32,
    /// Snapshot of all tasks when the entry was written.
    #[serde(default)]
    pub tasks: Vec<Task>,
}

/// Daily stats keyed by date. Ordered so that keys sort chronologically.
pub type DailyStatsMap = BTreeMap<String, DailyStats>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardStatus {
    /// Epoch milliseconds until which blocking is lifted.
    #[serde(default)]
    pub unlimited_until: Option<i64>,
    #[serde(default)]
    pub bonus_minutes: u32,
}

/// The full persisted state; the unit of persistence, export and import.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageData {
    #[serde(default)]
    pub settings: UserSettings,
    #[serde(default)]
    pub current_session: CurrentSession,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub daily_stats_map: DailyStatsMap,
    #[serde(default)]
    pub reward_status: RewardStatus,
}

impl StorageData {
    /// Split into one JSON value per store key.
    pub fn to_items(&self) -> serde_json::Result<serde_json::Map<String, serde_json::Value>> {
        let mut items = serde_json::Map::new();
        items.insert(KEY_SETTINGS.into(), serde_json::to_value(&self.settings)?);
        items.insert(
            KEY_CURRENT_SESSION.into(),
            serde_json::to_value(&self.current_session)?,
        );
        items.insert(KEY_TASKS.into(), serde_json::to_value(&self.tasks)?);
        items.insert(
            KEY_DAILY_STATS.into(),
            serde_json::to_value(&self.daily_stats_map)?,
        );
        items.insert(
            KEY_REWARD_STATUS.into(),
            serde_json::to_value(&self.reward_status)?,
        );
        Ok(items)
    }

    /// Rebuild from store items. Missing or null keys take their defaults.
    pub fn from_items(
        items: &serde_json::Map<String, serde_json::Value>,
    ) -> serde_json::Result<Self> {
        fn field<T: serde::de::DeserializeOwned + Default>(
            items: &serde_json::Map<String, serde_json::Value>,
            key: &str,
        ) -> serde_json::Result<T> {
            match items.get(key) {
                Some(serde_json::Value::Null) | None => Ok(T::default()),
                Some(value) => T::deserialize(value),
            }
        }

        Ok(Self {
            settings: field(items, KEY_SETTINGS)?,
            current_session: field(items, KEY_CURRENT_SESSION)?,
            tasks: field(items, KEY_TASKS)?,
            daily_stats_map: field(items, KEY_DAILY_STATS)?,
            reward_status: field(items, KEY_REWARD_STATUS)?,
        })
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn task_mut(&mut self, id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }
}

//! Tasks and the active work session.

use serde::{Deserialize, Serialize};

/// A unit of work whose focus time is tracked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    #[serde(default)]
    pub title: String,
    /// Minimum planned time in minutes.
    #[serde(default)]
    pub min_time: u32,
    /// Accumulated focus time in seconds.
    #[serde(default)]
    pub total_time: u64,
    #[serde(default)]
    pub is_completed: bool,
    /// Epoch milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
    /// Epoch milliseconds of the most recent start.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<i64>,
}

impl Task {
    pub fn new(id: impl Into<String>, title: impl Into<String>, min_time: u32) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            min_time,
            total_time: 0,
            is_completed: false,
            completed_at: None,
            started_at: None,
        }
    }

    /// Merge the fields present in `patch`.
    pub fn apply(&mut self, patch: TaskPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(min_time) = patch.min_time {
            self.min_time = min_time;
        }
        if let Some(total_time) = patch.total_time {
            self.total_time = total_time;
        }
        if let Some(is_completed) = patch.is_completed {
            self.is_completed = is_completed;
        }
        if let Some(completed_at) = patch.completed_at {
            self.completed_at = completed_at;
        }
    }
}

/// Partial update for [`Task`]. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub min_time: Option<u32>,
    pub total_time: Option<u64>,
    pub is_completed: Option<bool>,
    /// `Some(None)` clears the completion timestamp.
    pub completed_at: Option<Option<i64>>,
}

impl TaskPatch {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }
}

/// The singleton work session.
///
/// When `is_active` is false, `start_time` is `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentSession {
    #[serde(default)]
    pub task_id: Option<String>,
    /// Epoch milliseconds when the running interval began.
    #[serde(default)]
    pub start_time: Option<i64>,
    #[serde(default)]
    pub is_active: bool,
    /// Seconds banked by previous start/stop cycles.
    #[serde(default)]
    pub accumulated_time: u64,
}

impl CurrentSession {
    /// Returns the start time if the session is running.
    pub fn running_since(&self) -> Option<i64> {
        if self.is_active {
            self.start_time
        } else {
            None
        }
    }
}

//! User-facing settings persisted under the `settings` key.

use serde::{Deserialize, Serialize};

/// How distracting sites are blocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BlockingMode {
    /// Block whenever a rule matches.
    #[default]
    Strict,
    /// Block only while a focus session is active.
    Auto,
}

/// What happens when a distracting site is visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SiteAction {
    #[default]
    Redirect,
    Warn,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteRule {
    pub url: String,
    pub name: String,
    #[serde(default)]
    pub action: SiteAction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyGoal {
    #[serde(default = "default_daily_hours")]
    pub hours: f64,
    #[serde(default = "default_daily_tasks")]
    pub tasks: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyGoal {
    #[serde(default = "default_weekly_hours")]
    pub hours: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub session_complete: bool,
    #[serde(default = "default_true")]
    pub goal_reached: bool,
    #[serde(default = "default_true")]
    pub distraction_warning: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    /// Currency units earned per focused hour.
    #[serde(default = "default_hourly_rate")]
    pub hourly_rate: f64,
    #[serde(default)]
    pub mode: BlockingMode,
    #[serde(default)]
    pub distracting_sites: Vec<SiteRule>,
    #[serde(default)]
    pub daily_goal: DailyGoal,
    #[serde(default)]
    pub weekly_goal: WeeklyGoal,
    #[serde(default)]
    pub notifications: NotificationSettings,
}

fn default_hourly_rate() -> f64 {
    30.0
}
fn default_daily_hours() -> f64 {
    6.0
}
fn default_daily_tasks() -> u32 {
    3
}
fn default_weekly_hours() -> f64 {
    30.0
}
fn default_true() -> bool {
    true
}

impl Default for DailyGoal {
    fn default() -> Self {
        Self {
            hours: default_daily_hours(),
            tasks: default_daily_tasks(),
        }
    }
}

impl Default for WeeklyGoal {
    fn default() -> Self {
        Self {
            hours: default_weekly_hours(),
        }
    }
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            session_complete: true,
            goal_reached: true,
            distraction_warning: true,
        }
    }
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            hourly_rate: default_hourly_rate(),
            mode: BlockingMode::default(),
            distracting_sites: Vec::new(),
            daily_goal: DailyGoal::default(),
            weekly_goal: WeeklyGoal::default(),
            notifications: NotificationSettings::default(),
        }
    }
}

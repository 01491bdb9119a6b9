//! Reward evaluation against the daily goal.
//!
//! Meeting either half of the daily goal lifts blocking until the next local
//! midnight. Each completed task beyond the goal is worth an hour of bonus
//! time; the bonus is recomputed from the stats on every evaluation rather
//! than added to.

use crate::model::{DailyGoal, DailyStats, RewardStatus};

const BONUS_MINUTES_PER_EXTRA_TASK: u32 = 60;

/// Which parts of the daily goal a stats entry meets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GoalProgress {
    pub hours_met: bool,
    pub tasks_met: bool,
    pub extra_tasks: u32,
}

impl GoalProgress {
    pub fn evaluate(stats: &DailyStats, goal: &DailyGoal) -> Self {
        let goal_secs = (goal.hours * 3600.0).max(0.0);
        Self {
            hours_met: stats.total_focus_time as f64 >= goal_secs,
            tasks_met: stats.completed_tasks >= goal.tasks,
            extra_tasks: stats.completed_tasks.saturating_sub(goal.tasks),
        }
    }

    pub fn any_met(&self) -> bool {
        self.hours_met || self.tasks_met
    }
}

/// Apply the reward rules to `current`.
///
/// `unlimited_until` never moves earlier. `next_midnight_ms` is the start of
/// the next local day.
pub fn grant_reward(
    current: &RewardStatus,
    stats: &DailyStats,
    goal: &DailyGoal,
    next_midnight_ms: i64,
) -> RewardStatus {
    let progress = GoalProgress::evaluate(stats, goal);
    let mut status = current.clone();

    if progress.any_met() {
        let until = current.unlimited_until.unwrap_or(0).max(next_midnight_ms);
        status.unlimited_until = Some(until);
    }
    if progress.extra_tasks > 0 {
        status.bonus_minutes = progress.extra_tasks * BONUS_MINUTES_PER_EXTRA_TASK;
    }
    status
}

/// Whether blocking is currently lifted.
pub fn is_unlimited(status: &RewardStatus, now_ms: i64) -> bool {
    status.unlimited_until.is_some_and(|until| now_ms < until)
}

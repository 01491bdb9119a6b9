//! Daily stats cache.
//!
//! Today's entry in `dailyStatsMap` is a checkpoint, not a live view: once
//! written it is returned unchanged until the next explicit refresh. When no
//! entry exists yet, readers get a transient aggregate computed from the
//! current tasks that is never stored.
//!
//! Refresh points are owned by the engine: stopping a task, completing a
//! task, and recording distraction time.

use chrono::{Days, NaiveDate};

use crate::accounting::money_for_seconds;
use crate::clock::date_key;
use crate::model::{DailyStats, DailyStatsMap, StorageData};

/// Aggregate of the current tasks for `date`, without distraction time.
pub fn transient_daily_stats(data: &StorageData, date: &str) -> DailyStats {
    let total_focus_time: u64 = data.tasks.iter().map(|t| t.total_time).sum();
    let completed_tasks = data.tasks.iter().filter(|t| t.is_completed).count() as u32;
    DailyStats {
        date: date.to_string(),
        total_focus_time,
        total_distract_time: 0,
        earned_money: money_for_seconds(total_focus_time, data.settings.hourly_rate) as f64,
        lost_money: 0.0,
        completed_tasks,
        tasks: data.tasks.clone(),
    }
}

/// Cached entry for `date` if one exists, otherwise the transient aggregate.
pub fn daily_stats(data: &StorageData, date: &str) -> DailyStats {
    match data.daily_stats_map.get(date) {
        Some(cached) => cached.clone(),
        None => transient_daily_stats(data, date),
    }
}

/// Recompute focus totals for `date` and cache them.
///
/// Distraction time and lost money already cached for `date` carry over.
pub fn refresh_daily_stats(data: &mut StorageData, date: &str) -> DailyStats {
    let mut fresh = transient_daily_stats(data, date);
    if let Some(previous) = data.daily_stats_map.get(date) {
        fresh.total_distract_time = previous.total_distract_time;
        fresh.lost_money = previous.lost_money;
    }
    data.daily_stats_map.insert(date.to_string(), fresh.clone());
    fresh
}

/// Add distraction time to the entry for `date` and cache it.
pub fn add_distract_time(data: &mut StorageData, date: &str, seconds: u64) -> DailyStats {
    let mut stats = daily_stats(data, date);
    stats.total_distract_time += seconds;
    stats.lost_money += money_for_seconds(seconds, data.settings.hourly_rate) as f64;
    data.daily_stats_map.insert(date.to_string(), stats.clone());
    stats
}

/// Cached focus seconds over the seven days ending on `today`.
pub fn weekly_focus_seconds(map: &DailyStatsMap, today: NaiveDate) -> u64 {
    let start = today.checked_sub_days(Days::new(6)).unwrap_or(today);
    let (from, to) = (date_key(start), date_key(today));
    map.range(from..=to).map(|(_, s)| s.total_focus_time).sum()
}

//! Integration tests for session accounting, daily stats and rewards.

use std::sync::Arc;

use chrono::{FixedOffset, TimeZone};
use focusguard_core::{
    Clock, DailyGoal, FocusEngine, ManualClock, MemoryStore, RetryPolicy, RewardStatus, TaskPatch,
};

async fn engine_at(date: &str, hour: u32) -> (FocusEngine, Arc<ManualClock>, Arc<MemoryStore>) {
    let clock = Arc::new(ManualClock::at(date, hour, 0).unwrap());
    let store = Arc::new(MemoryStore::new());
    let engine = FocusEngine::open(store.clone(), clock.clone(), RetryPolicy::default())
        .await
        .unwrap();
    (engine, clock, store)
}

fn utc_midnight(y: i32, m: u32, d: u32) -> i64 {
    FixedOffset::east_opt(0)
        .unwrap()
        .with_ymd_and_hms(y, m, d, 0, 0, 0)
        .unwrap()
        .timestamp_millis()
}

#[tokio::test]
async fn test_start_stop_accumulates_whole_seconds() {
    let (mut engine, clock, _) = engine_at("2026-02-08", 9).await;
    let task = engine.add_task("Deep work", 25);

    engine.start_task(&task.id);
    clock.advance(chrono::Duration::milliseconds(90_700));
    assert_eq!(engine.stop_task(), Some(90));
    assert_eq!(engine.task(&task.id).unwrap().total_time, 90);

    engine.start_task(&task.id);
    clock.advance_secs(30);
    engine.stop_task();
    assert_eq!(engine.task(&task.id).unwrap().total_time, 120);

    let session = engine.session();
    assert!(!session.is_active);
    assert_eq!(session.start_time, None);
    assert_eq!(session.accumulated_time, 120);
}

#[tokio::test]
async fn test_stop_on_inactive_session_is_noop() {
    let (mut engine, _, _) = engine_at("2026-02-08", 9).await;
    engine.add_task("Idle", 10);
    let before = engine.state().clone();

    assert_eq!(engine.stop_task(), None);
    assert_eq!(engine.state(), &before);
}

#[tokio::test]
async fn test_complete_task_only_touches_target() {
    let (mut engine, clock, _) = engine_at("2026-02-08", 9).await;
    let a = engine.add_task("a", 0);
    let b = engine.add_task("b", 0);

    assert!(engine.complete_task(&a.id));

    let done = engine.task(&a.id).unwrap();
    assert!(done.is_completed);
    assert_eq!(done.completed_at, Some(clock.now_ms()));
    let other = engine.task(&b.id).unwrap();
    assert!(!other.is_completed);
    assert_eq!(other.completed_at, None);
}

#[tokio::test]
async fn test_daily_stats_freeze_until_refresh() {
    let (mut engine, clock, _) = engine_at("2026-02-08", 9).await;
    let task = engine.add_task("a", 0);
    engine.update_task(
        &task.id,
        TaskPatch {
            total_time: Some(600),
            ..Default::default()
        },
    );

    // No cache yet: live aggregate.
    let transient = engine.get_daily_stats();
    assert_eq!(transient.total_focus_time, 600);
    assert!(engine.state().daily_stats_map.is_empty());

    engine.update_daily_stats();

    // Further work does not show up until the next refresh.
    engine.start_task(&task.id);
    clock.advance_secs(300);
    let session = engine.session().clone();
    assert!(session.is_active);
    engine.update_task(
        &task.id,
        TaskPatch {
            is_completed: Some(true),
            ..Default::default()
        },
    );
    let frozen = engine.get_daily_stats();
    assert_eq!(frozen.total_focus_time, 600);
    assert_eq!(frozen.completed_tasks, 0);

    let refreshed = engine.update_daily_stats();
    assert_eq!(refreshed.completed_tasks, 1);
    assert_eq!(engine.get_daily_stats(), refreshed);
}

#[tokio::test]
async fn test_record_distract_time_accumulates() {
    let (mut engine, _, _) = engine_at("2026-02-08", 9).await;
    let mut settings = engine.settings().clone();
    settings.hourly_rate = 20.0;
    engine.update_settings(settings);

    engine.record_distract_time(1800);
    let stats = engine.record_distract_time(900);
    assert_eq!(stats.total_distract_time, 2700);
    // floor(1800/3600*20) + floor(900/3600*20) = 10 + 5
    assert_eq!(stats.lost_money, 15.0);

    // Refreshing focus totals keeps the distraction already recorded.
    let refreshed = engine.update_daily_stats();
    assert_eq!(refreshed.total_distract_time, 2700);
    assert_eq!(refreshed.lost_money, 15.0);
}

#[tokio::test]
async fn test_first_distraction_of_the_day_keeps_live_focus_totals() {
    let (mut engine, _, _) = engine_at("2026-02-08", 9).await;
    let task = engine.add_task("Reading", 30);
    engine.update_task(
        &task.id,
        TaskPatch {
            total_time: Some(1800),
            ..Default::default()
        },
    );
    assert!(engine.state().daily_stats_map.is_empty());

    let stats = engine.record_distract_time(60);
    let cached = &engine.state().daily_stats_map["2026-02-08"];
    assert_eq!(cached, &stats);
    assert_eq!(cached.total_focus_time, 1800);
    // Default rate of 30 per hour for half an hour.
    assert_eq!(cached.earned_money, 15.0);
    assert_eq!(cached.total_distract_time, 60);
    assert_eq!(cached.lost_money, 0.0);
}

#[tokio::test]
async fn test_hours_goal_grants_unlimited_until_next_midnight() {
    let (mut engine, clock, _) = engine_at("2026-02-08", 9).await;
    let mut settings = engine.settings().clone();
    settings.daily_goal = DailyGoal {
        hours: 6.0,
        tasks: 3,
    };
    engine.update_settings(settings);

    let task = engine.add_task("Marathon", 360);
    engine.start_task(&task.id);
    clock.advance_secs(21_600);
    engine.stop_task();
    assert_eq!(engine.get_daily_stats().total_focus_time, 21_600);

    let status = engine.check_and_grant_reward();
    assert_eq!(status.unlimited_until, Some(utc_midnight(2026, 2, 9)));
    assert_eq!(status.bonus_minutes, 0);
    assert!(engine.is_unlimited_active());
}

#[tokio::test]
async fn test_short_focus_grants_nothing() {
    let (mut engine, clock, _) = engine_at("2026-02-08", 9).await;
    let task = engine.add_task("Short", 5);
    engine.start_task(&task.id);
    clock.advance_secs(100);
    engine.stop_task();

    let status = engine.check_and_grant_reward();
    assert_eq!(status.unlimited_until, None);
    assert_eq!(status.bonus_minutes, 0);
    assert!(!engine.is_unlimited_active());
}

#[tokio::test]
async fn test_reward_needs_cached_stats() {
    let (mut engine, _, _) = engine_at("2026-02-08", 9).await;
    for i in 0..4 {
        let task = engine.add_task(format!("t{i}"), 0);
        engine.update_task(
            &task.id,
            TaskPatch {
                is_completed: Some(true),
                ..Default::default()
            },
        );
    }
    // Completed via update, so nothing has been cached for today.
    let status = engine.check_and_grant_reward();
    assert_eq!(status, RewardStatus::default());
}

#[tokio::test]
async fn test_extra_completed_tasks_earn_bonus_minutes() {
    let (mut engine, _, _) = engine_at("2026-02-08", 9).await;
    let ids: Vec<String> = (0..5).map(|i| engine.add_task(format!("t{i}"), 0).id).collect();
    for id in &ids {
        engine.complete_task(id);
    }

    let status = engine.reward_status().clone();
    assert_eq!(status.bonus_minutes, 120);
    assert_eq!(status.unlimited_until, Some(utc_midnight(2026, 2, 9)));

    // Re-evaluating the same stats does not stack the bonus.
    assert_eq!(engine.check_and_grant_reward(), status);
}

#[tokio::test]
async fn test_unlimited_is_not_moved_earlier_on_a_later_grant() {
    let (mut engine, clock, _) = engine_at("2026-02-08", 23).await;
    let ids: Vec<String> = (0..3).map(|i| engine.add_task(format!("t{i}"), 0).id).collect();
    for id in &ids {
        engine.complete_task(id);
    }
    let first = engine.reward_status().unlimited_until.unwrap();

    // Pretend the clock was corrected backwards across midnight.
    clock.set(
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2026, 2, 7, 22, 0, 0)
            .unwrap(),
    );
    engine.update_daily_stats();
    let status = engine.check_and_grant_reward();
    assert_eq!(status.unlimited_until, Some(first));
}

#[tokio::test]
async fn test_new_day_starts_with_transient_stats() {
    let (mut engine, clock, _) = engine_at("2026-02-08", 22).await;
    let task = engine.add_task("late", 0);
    engine.start_task(&task.id);
    clock.advance_secs(600);
    engine.stop_task();
    assert!(engine.state().daily_stats_map.contains_key("2026-02-08"));

    clock.advance_secs(3 * 3600);
    let stats = engine.get_daily_stats();
    assert_eq!(stats.date, "2026-02-09");
    assert!(!engine.state().daily_stats_map.contains_key("2026-02-09"));
}

#[tokio::test]
async fn test_state_survives_reopen_on_same_store() {
    let (mut engine, clock, store) = engine_at("2026-02-08", 9).await;
    let task = engine.add_task("durable", 10);
    engine.start_task(&task.id);
    clock.advance_secs(42);
    engine.stop_task();
    engine.flush().await;
    assert!(engine.last_error().is_none());
    let expected = engine.state().clone();
    engine.shutdown().await;

    let reopened = FocusEngine::open(store, clock, RetryPolicy::default())
        .await
        .unwrap();
    assert_eq!(reopened.state(), &expected);
}

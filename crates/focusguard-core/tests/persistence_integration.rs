//! Integration tests for retrying writes, quota eviction and the writer queue.

use std::sync::Arc;
use std::time::Duration;

use focusguard_core::persistence::clean_old_stats;
use focusguard_core::{
    DailyStats, FileStore, FocusEngine, ManualClock, MemoryStore, PersistError,
    PersistenceGateway, RetryPolicy, StorageData,
};
use tokio::time::Instant;

fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::at("2026-02-08", 10, 0).unwrap())
}

fn history(dates: &[&str]) -> StorageData {
    let mut data = StorageData::default();
    for date in dates {
        data.daily_stats_map.insert(
            date.to_string(),
            DailyStats {
                date: date.to_string(),
                total_focus_time: 1200,
                ..DailyStats::default()
            },
        );
    }
    data
}

#[test]
fn test_clean_old_stats_drops_january_keeps_february() {
    let data = history(&["2026-01-01", "2026-02-08"]);
    let today = chrono::NaiveDate::from_ymd_opt(2026, 2, 8).unwrap();
    let cleaned = clean_old_stats(&data.daily_stats_map, 30, today);
    assert!(!cleaned.contains_key("2026-01-01"));
    assert!(cleaned.contains_key("2026-02-08"));

    assert!(clean_old_stats(&Default::default(), 30, today).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_one_transient_failure_then_success() {
    let store = Arc::new(MemoryStore::new());
    store.fail_next("Failed to write: IO error");
    let gateway = PersistenceGateway::new(store.clone(), clock(), RetryPolicy::default());

    let started = Instant::now();
    gateway.save_with_retry(&StorageData::default()).await.unwrap();

    assert_eq!(store.write_count(), 2);
    assert!(started.elapsed() >= Duration::from_millis(500));
}

#[tokio::test(start_paused = true)]
async fn test_three_failures_reject_with_final_error() {
    let store = Arc::new(MemoryStore::new());
    for message in ["e1", "e2", "e3"] {
        store.fail_next(message);
    }
    let gateway = PersistenceGateway::new(store.clone(), clock(), RetryPolicy::default());

    let err = gateway
        .save_with_retry(&StorageData::default())
        .await
        .unwrap_err();
    assert_eq!(store.write_count(), 3);
    match err {
        PersistError::Exhausted { attempts, source } => {
            assert_eq!(attempts, 3);
            assert_eq!(source.to_string(), "e3");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_real_quota_limit_is_relieved_by_eviction() {
    // Sized so the recent entries fit but the full history does not.
    let mut data = StorageData::default();
    let padding = "x".repeat(200);
    for date in ["2025-11-01", "2025-11-02", "2025-11-03", "2026-02-07", "2026-02-08"] {
        let mut stats = DailyStats {
            date: date.to_string(),
            ..DailyStats::default()
        };
        stats.tasks.push(focusguard_core::Task::new("t", padding.clone(), 0));
        data.daily_stats_map.insert(date.to_string(), stats);
    }
    let full_size = serde_json::to_string(&data.daily_stats_map).unwrap().len();

    let store = Arc::new(MemoryStore::with_quota(Some(full_size * 3 / 5)));
    let gateway = PersistenceGateway::new(store.clone(), clock(), RetryPolicy::default());
    gateway.save_with_retry(&data).await.unwrap();

    let stored = store.snapshot();
    let stats = stored["dailyStatsMap"].as_object().unwrap();
    let mut dates: Vec<_> = stats.keys().cloned().collect();
    dates.sort();
    assert_eq!(dates, ["2026-02-07", "2026-02-08"]);
    assert_eq!(store.write_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_engine_records_and_clears_write_errors() {
    let store = Arc::new(MemoryStore::new());
    let mut engine = FocusEngine::open(store.clone(), clock(), RetryPolicy::default())
        .await
        .unwrap();

    for _ in 0..3 {
        store.fail_next("storage offline");
    }
    let task = engine.add_task("kept in memory", 5);
    engine.flush().await;

    let message = engine.last_error().unwrap();
    assert!(message.contains("storage offline"));
    // Memory is not rolled back.
    assert!(engine.task(&task.id).is_some());

    engine.add_task("second", 5);
    engine.flush().await;
    assert_eq!(engine.last_error(), None);
    assert_eq!(store.snapshot()["tasks"].as_array().unwrap().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_rapid_mutations_persist_latest_state() {
    let store = Arc::new(MemoryStore::new());
    store.fail_next("slow start");
    let mut engine = FocusEngine::open(store.clone(), clock(), RetryPolicy::default())
        .await
        .unwrap();

    for i in 0..10 {
        engine.add_task(format!("task {i}"), 0);
    }
    engine.flush().await;

    let tasks = store.snapshot()["tasks"].as_array().unwrap().clone();
    assert_eq!(tasks.len(), 10);
    assert_eq!(tasks[9]["title"], "task 9");
    // Coalescing means far fewer writes than mutations.
    assert!(store.write_count() < 10);
}

#[tokio::test]
async fn test_file_backend_round_trip() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("storage.json");
    let clock = clock();

    let mut engine = FocusEngine::open(
        Arc::new(FileStore::new(&path)),
        clock.clone(),
        RetryPolicy::default(),
    )
    .await
    .unwrap();
    let task = engine.add_task("on disk", 45);
    engine.complete_task(&task.id);
    let expected = engine.state().clone();
    engine.shutdown().await;

    let reopened = FocusEngine::open(Arc::new(FileStore::new(&path)), clock, RetryPolicy::default())
        .await
        .unwrap();
    assert_eq!(reopened.state(), &expected);
}

#[tokio::test]
async fn test_reload_picks_up_external_writes() {
    let store = Arc::new(MemoryStore::new());
    let clock = clock();
    let mut first = FocusEngine::open(store.clone(), clock.clone(), RetryPolicy::default())
        .await
        .unwrap();
    let mut second = FocusEngine::open(store.clone(), clock, RetryPolicy::default())
        .await
        .unwrap();
    let mut changes = first.subscribe_changes();

    second.add_task("from elsewhere", 10);
    second.flush().await;

    let change = changes.recv().await.unwrap();
    assert!(change.changes.contains_key("tasks"));
    first.reload().await.unwrap();
    assert_eq!(first.tasks().len(), 1);
    assert_eq!(first.tasks()[0].title, "from elsewhere");
}

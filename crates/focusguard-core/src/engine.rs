//! The focus engine: in-memory state and its mutators.
//!
//! [`FocusEngine`] owns the whole [`StorageData`] envelope. Every mutator
//! changes memory synchronously and then hands a full snapshot to the
//! [`SnapshotWriter`]; callers never wait on storage unless they ask to via
//! [`FocusEngine::flush`]. Write failures do not roll anything back. They
//! show up as a sticky message in [`FocusEngine::last_error`].
//!
//! ## Checkpoints
//!
//! ```text
//! stop_task            -> refresh daily stats -> persist
//! complete_task        -> refresh daily stats -> check reward -> persist
//! record_distract_time -> update daily stats  -> persist
//! ```

use std::sync::Arc;

use tokio::sync::{broadcast, watch};

use crate::accounting::{elapsed_seconds, live_session_seconds};
use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::error::{Result, StoreError};
use crate::model::{
    CurrentSession, DailyStats, RewardStatus, SiteRule, StorageData, Task, TaskPatch,
    UserSettings, STORAGE_KEYS,
};
use crate::persistence::{PersistenceGateway, RetryPolicy, SnapshotWriter, WriterStatus};
use crate::reward::{grant_reward, is_unlimited};
use crate::stats::{add_distract_time, daily_stats, refresh_daily_stats, weekly_focus_seconds};
use crate::store::{open_store, KeyValueStore, StorageChange};

pub struct FocusEngine {
    state: StorageData,
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    writer: SnapshotWriter,
}

impl FocusEngine {
    /// Load state from `store` and start the snapshot writer.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn open(
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        policy: RetryPolicy,
    ) -> Result<Self, StoreError> {
        let state = load_state(store.as_ref()).await?;
        let gateway = PersistenceGateway::new(store.clone(), clock.clone(), policy);
        tracing::info!(
            tasks = state.tasks.len(),
            stats_days = state.daily_stats_map.len(),
            "focus engine loaded"
        );
        Ok(Self {
            state,
            store,
            clock,
            writer: SnapshotWriter::spawn(gateway),
        })
    }

    /// Open the configured store with the system clock.
    pub async fn from_config(config: &EngineConfig) -> Result<Self> {
        let store = open_store(&config.storage)?;
        let engine = Self::open(
            store,
            Arc::new(SystemClock),
            config.persistence.retry_policy(),
        )
        .await?;
        Ok(engine)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &StorageData {
        &self.state
    }

    pub fn tasks(&self) -> &[Task] {
        &self.state.tasks
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.state.task(id)
    }

    pub fn session(&self) -> &CurrentSession {
        &self.state.current_session
    }

    pub fn settings(&self) -> &UserSettings {
        &self.state.settings
    }

    pub fn reward_status(&self) -> &RewardStatus {
        &self.state.reward_status
    }

    /// Session seconds including the interval currently running.
    pub fn live_session_seconds(&self) -> u64 {
        live_session_seconds(&self.state.current_session, self.clock.now_ms())
    }

    pub fn is_unlimited_active(&self) -> bool {
        is_unlimited(&self.state.reward_status, self.clock.now_ms())
    }

    /// Cached focus seconds over the last seven local days.
    pub fn weekly_focus_seconds(&self) -> u64 {
        weekly_focus_seconds(&self.state.daily_stats_map, self.clock.today())
    }

    pub fn weekly_goal_met(&self) -> bool {
        let goal_secs = self.state.settings.weekly_goal.hours * 3600.0;
        self.weekly_focus_seconds() as f64 >= goal_secs
    }

    // ── Tasks ────────────────────────────────────────────────────────

    pub fn add_task(&mut self, title: impl Into<String>, min_time: u32) -> Task {
        let task = Task::new(uuid::Uuid::new_v4().to_string(), title, min_time);
        tracing::debug!(task_id = %task.id, "task added");
        self.state.tasks.push(task.clone());
        self.persist();
        task
    }

    /// Merge `patch` into the task. Returns false if no task has `id`.
    pub fn update_task(&mut self, id: &str, patch: TaskPatch) -> bool {
        let Some(task) = self.state.task_mut(id) else {
            return false;
        };
        task.apply(patch);
        self.persist();
        true
    }

    /// Remove and return the task so it can be restored.
    pub fn delete_task(&mut self, id: &str) -> Option<Task> {
        let index = self.state.tasks.iter().position(|t| t.id == id)?;
        let task = self.state.tasks.remove(index);
        tracing::debug!(task_id = %task.id, "task deleted");
        self.persist();
        Some(task)
    }

    /// Put back a task exactly as it was, replacing any task with the same id.
    pub fn restore_task(&mut self, task: Task) {
        match self.state.task_mut(&task.id) {
            Some(existing) => *existing = task,
            None => self.state.tasks.push(task),
        }
        self.persist();
    }

    // ── Session ──────────────────────────────────────────────────────

    /// Start timing `id`.
    ///
    /// Banked session time is kept. A session already running for another
    /// task is not stopped first; that is up to the caller.
    pub fn start_task(&mut self, id: &str) {
        let now = self.clock.now_ms();
        let session = &mut self.state.current_session;
        session.task_id = Some(id.to_string());
        session.start_time = Some(now);
        session.is_active = true;
        if let Some(task) = self.state.task_mut(id) {
            task.started_at = Some(now);
        }
        tracing::debug!(task_id = id, "session started");
        self.persist();
    }

    /// Stop the running session and credit its time to the task.
    ///
    /// Returns the whole seconds credited, or `None` if nothing was running.
    pub fn stop_task(&mut self) -> Option<u64> {
        let session = &self.state.current_session;
        let start = session.running_since()?;
        let elapsed = elapsed_seconds(start, self.clock.now_ms());
        let task_id = session.task_id.clone();

        if let Some(task) = task_id.as_deref().and_then(|id| self.state.task_mut(id)) {
            task.total_time += elapsed;
        }
        let session = &mut self.state.current_session;
        session.is_active = false;
        session.start_time = None;
        session.accumulated_time += elapsed;
        tracing::debug!(task_id = ?task_id, elapsed, "session stopped");

        self.refresh_today();
        self.persist();
        Some(elapsed)
    }

    /// Mark the task completed now, then refresh stats and check rewards.
    ///
    /// Returns false if no task has `id`; stats and rewards are still
    /// re-evaluated.
    pub fn complete_task(&mut self, id: &str) -> bool {
        let now = self.clock.now_ms();
        let found = match self.state.task_mut(id) {
            Some(task) => {
                task.is_completed = true;
                task.completed_at = Some(now);
                true
            }
            None => false,
        };
        tracing::debug!(task_id = id, found, "task completed");

        self.refresh_today();
        self.grant_reward_for_today();
        self.persist();
        found
    }

    // ── Daily stats ──────────────────────────────────────────────────

    /// Today's cached stats, or a transient aggregate if none are cached.
    pub fn get_daily_stats(&self) -> DailyStats {
        daily_stats(&self.state, &self.clock.today_key())
    }

    /// Recompute today's stats from the tasks and cache them.
    pub fn update_daily_stats(&mut self) -> DailyStats {
        let stats = self.refresh_today();
        self.persist();
        stats
    }

    pub fn record_distract_time(&mut self, seconds: u64) -> DailyStats {
        let stats = add_distract_time(&mut self.state, &self.clock.today_key(), seconds);
        tracing::debug!(seconds, total = stats.total_distract_time, "distraction recorded");
        self.persist();
        stats
    }

    // ── Rewards ──────────────────────────────────────────────────────

    /// Evaluate today's cached stats against the daily goal.
    ///
    /// Without a cached entry for today nothing is granted. State is
    /// persisted either way.
    pub fn check_and_grant_reward(&mut self) -> RewardStatus {
        self.grant_reward_for_today();
        self.persist();
        self.state.reward_status.clone()
    }

    // ── Settings ─────────────────────────────────────────────────────

    pub fn update_settings(&mut self, settings: UserSettings) {
        self.state.settings = settings;
        self.persist();
    }

    /// Add a rule, replacing an existing rule for the same URL.
    pub fn add_distracting_site(&mut self, rule: SiteRule) {
        let sites = &mut self.state.settings.distracting_sites;
        match sites.iter_mut().find(|s| s.url == rule.url) {
            Some(existing) => *existing = rule,
            None => sites.push(rule),
        }
        self.persist();
    }

    pub fn remove_distracting_site(&mut self, url: &str) -> bool {
        let sites = &mut self.state.settings.distracting_sites;
        let before = sites.len();
        sites.retain(|s| s.url != url);
        let removed = sites.len() != before;
        if removed {
            self.persist();
        }
        removed
    }

    // ── Persistence ──────────────────────────────────────────────────

    /// Wait for every scheduled snapshot to be written or to fail.
    pub async fn flush(&self) {
        self.writer.flush().await;
    }

    /// Message of the last failed write, if it has not been superseded.
    pub fn last_error(&self) -> Option<String> {
        self.writer.last_error()
    }

    pub fn clear_error(&self) {
        self.writer.clear_error();
    }

    pub fn subscribe_status(&self) -> watch::Receiver<WriterStatus> {
        self.writer.subscribe_status()
    }

    /// Store change notifications, including those caused by this engine.
    pub fn subscribe_changes(&self) -> broadcast::Receiver<StorageChange> {
        self.store.subscribe()
    }

    /// Replace in-memory state with what the store holds.
    ///
    /// Pending local writes are flushed first so they are not lost.
    pub async fn reload(&mut self) -> Result<(), StoreError> {
        self.writer.flush().await;
        self.state = load_state(self.store.as_ref()).await?;
        tracing::info!(tasks = self.state.tasks.len(), "state reloaded from store");
        Ok(())
    }

    /// Flush pending writes and stop the writer.
    pub async fn shutdown(self) {
        self.writer.shutdown().await;
    }

    fn refresh_today(&mut self) -> DailyStats {
        refresh_daily_stats(&mut self.state, &self.clock.today_key())
    }

    fn grant_reward_for_today(&mut self) {
        let Some(stats) = self.state.daily_stats_map.get(&self.clock.today_key()) else {
            return;
        };
        let granted = grant_reward(
            &self.state.reward_status,
            stats,
            &self.state.settings.daily_goal,
            self.clock.start_of_next_day_ms(),
        );
        if granted != self.state.reward_status {
            tracing::info!(
                unlimited_until = ?granted.unlimited_until,
                bonus_minutes = granted.bonus_minutes,
                "reward granted"
            );
        }
        self.state.reward_status = granted;
    }

    fn persist(&mut self) {
        self.writer.schedule(self.state.clone());
    }
}

async fn load_state(store: &dyn KeyValueStore) -> Result<StorageData, StoreError> {
    let items = store.get(&STORAGE_KEYS).await?;
    Ok(StorageData::from_items(&items)?)
}

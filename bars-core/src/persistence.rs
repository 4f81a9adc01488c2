//! Scheduled autosave.
//!
//! ```text
//! StateManager ──subscriber──► watch<Arc<AppState>> ──► autosave task ──► Storage
//!                                                        ├─ debounce (1 s after last change)
//!                                                        └─ interval (every 30 s while dirty)
//! ```
//!
//! Saving runs on a tokio task and never blocks dispatch. A failed save is
//! logged and retried on the next change or tick; it never touches the
//! in-memory state.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::error::{BarsResult, StorageResult};
use crate::state::AppState;
use crate::store::{PersistedState, Storage};

/// Autosave timing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutosaveConfig {
    /// Periodic save interval.
    pub interval: Duration,
    /// Quiet period after the last change before saving.
    pub debounce: Duration,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            debounce: Duration::from_secs(1),
        }
    }
}

/// Save `state` once.
///
/// # Errors
///
/// Returns the backend's [`StorageError`](crate::StorageError).
pub async fn save_snapshot(storage: &dyn Storage, state: &AppState) -> StorageResult<()> {
    storage.save(&PersistedState::now(state.clone())).await
}

/// Load the saved state, checking its invariants.
///
/// # Errors
///
/// Returns [`BarsError::Storage`](crate::BarsError::Storage) if loading
/// fails and [`BarsError::Invariant`](crate::BarsError::Invariant) if the
/// stored state is inconsistent.
pub async fn load_snapshot(storage: &dyn Storage) -> BarsResult<Option<AppState>> {
    let Some(persisted) = storage.load().await? else {
        return Ok(None);
    };
    persisted.state.validate()?;
    tracing::debug!(
        saved_at = persisted.saved_at,
        bars = persisted.state.bars.len(),
        "Loaded snapshot"
    );
    Ok(Some(persisted.state))
}

/// Handle to a running autosave task.
#[derive(Debug)]
pub struct AutosaveHandle {
    sender: Arc<watch::Sender<Arc<AppState>>>,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl AutosaveHandle {
    /// A [`StateManager`](crate::StateManager) subscriber that feeds
    /// snapshots to the task.
    pub fn subscriber(&self) -> impl FnMut(&Arc<AppState>) + 'static {
        let sender = Arc::clone(&self.sender);
        move |state: &Arc<AppState>| {
            sender.send_if_modified(|current| {
                if Arc::ptr_eq(current, state) {
                    false
                } else {
                    *current = Arc::clone(state);
                    true
                }
            });
        }
    }

    /// Stop the task, saving any change that has not been written yet.
    pub async fn shutdown(self) {
        // The task may already have exited if every sender was dropped.
        let _ = self.shutdown.send(());
        if let Err(e) = self.task.await {
            tracing::warn!("Autosave task ended abnormally: {e}");
        }
    }

    /// Stop the task immediately, dropping unsaved changes.
    pub fn abort(self) {
        self.task.abort();
    }
}

/// Start saving snapshots of `initial` and everything fed through
/// [`AutosaveHandle::subscriber`].
///
/// Must be called from within a tokio runtime.
pub fn spawn_autosave(
    storage: Arc<dyn Storage>,
    initial: Arc<AppState>,
    config: AutosaveConfig,
) -> AutosaveHandle {
    let (sender, receiver) = watch::channel(initial);
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let task = tokio::spawn(run_autosave(storage, receiver, shutdown_rx, config));
    AutosaveHandle {
        sender: Arc::new(sender),
        shutdown: shutdown_tx,
        task,
    }
}

async fn run_autosave(
    storage: Arc<dyn Storage>,
    mut receiver: watch::Receiver<Arc<AppState>>,
    mut shutdown: oneshot::Receiver<()>,
    config: AutosaveConfig,
) {
    let mut ticker = tokio::time::interval(config.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    ticker.tick().await;

    let mut dirty = false;
    let mut deadline: Option<Instant> = None;

    tracing::debug!(?config, "Autosave started");

    loop {
        let debounce_at = deadline.unwrap_or_else(Instant::now);
        tokio::select! {
            _ = &mut shutdown => {
                if dirty || receiver.has_changed().unwrap_or(false) {
                    save_latest(storage.as_ref(), &receiver).await;
                }
                break;
            }
            changed = receiver.changed() => {
                if changed.is_err() {
                    if dirty {
                        save_latest(storage.as_ref(), &receiver).await;
                    }
                    break;
                }
                dirty = true;
                deadline = Some(Instant::now() + config.debounce);
            }
            () = tokio::time::sleep_until(debounce_at), if deadline.is_some() => {
                dirty = !save_latest(storage.as_ref(), &receiver).await;
                deadline = None;
            }
            _ = ticker.tick() => {
                if dirty {
                    dirty = !save_latest(storage.as_ref(), &receiver).await;
                    deadline = None;
                }
            }
        }
    }

    tracing::debug!("Autosave stopped");
}

/// Save the newest snapshot; `true` on success.
async fn save_latest(storage: &dyn Storage, receiver: &watch::Receiver<Arc<AppState>>) -> bool {
    let state = Arc::clone(&receiver.borrow());
    match save_snapshot(storage, &state).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("Autosave failed: {e}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{Action, Command};
    use crate::bar::BarDraft;
    use crate::reducer::reduce;
    use crate::store::MemoryStorage;

    fn grow(state: &Arc<AppState>) -> Arc<AppState> {
        Arc::new(reduce(
            state,
            &Action::new(Command::AddBar(BarDraft::new()), 0),
        ))
    }

    fn setup() -> (Arc<MemoryStorage>, AutosaveHandle, Arc<AppState>) {
        let storage = Arc::new(MemoryStorage::new());
        let initial = Arc::new(AppState::new());
        let handle = spawn_autosave(
            Arc::clone(&storage) as Arc<dyn Storage>,
            Arc::clone(&initial),
            AutosaveConfig::default(),
        );
        (storage, handle, initial)
    }

    async fn sleep_ms(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_saves_after_debounce() {
        let (storage, handle, initial) = setup();
        let mut notify = handle.subscriber();
        let next = grow(&initial);
        notify(&next);

        sleep_ms(500).await;
        assert_eq!(storage.save_count(), 0);

        sleep_ms(600).await;
        assert_eq!(storage.save_count(), 1);
        let saved = storage.snapshot().expect("saved");
        assert_eq!(saved.state.bars.len(), 1);

        handle.shutdown().await;
        assert_eq!(storage.save_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_change_resets_debounce() {
        let (storage, handle, initial) = setup();
        let mut notify = handle.subscriber();
        let first = grow(&initial);
        notify(&first);
        sleep_ms(500).await;
        notify(&grow(&first));

        sleep_ms(700).await;
        assert_eq!(storage.save_count(), 0);
        sleep_ms(400).await;
        assert_eq!(storage.save_count(), 1);
        assert_eq!(storage.snapshot().expect("saved").state.bars.len(), 2);
        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_saves_during_continuous_editing() {
        let (storage, handle, initial) = setup();
        let mut notify = handle.subscriber();
        let mut state = initial;
        for _ in 0..40 {
            state = grow(&state);
            notify(&state);
            sleep_ms(900).await;
        }
        assert_eq!(storage.save_count(), 1);
        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_snapshot_is_not_a_change() {
        let (storage, handle, initial) = setup();
        let mut notify = handle.subscriber();
        notify(&initial);
        sleep_ms(2_000).await;
        assert_eq!(storage.save_count(), 0);
        handle.shutdown().await;
        assert_eq!(storage.save_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_flushes_pending_change() {
        let (storage, handle, initial) = setup();
        let mut notify = handle.subscriber();
        notify(&grow(&initial));
        handle.shutdown().await;
        assert_eq!(storage.save_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_save_is_retried_on_next_change() {
        let (storage, handle, initial) = setup();
        storage.set_failing(true);
        let mut notify = handle.subscriber();
        let first = grow(&initial);
        notify(&first);
        sleep_ms(1_100).await;
        assert_eq!(storage.save_count(), 0);

        storage.set_failing(false);
        notify(&grow(&first));
        sleep_ms(1_100).await;
        assert_eq!(storage.save_count(), 1);
        handle.abort();
    }

    #[tokio::test]
    async fn test_load_snapshot_validates() {
        let mut state = AppState::new();
        state.unit_bar_id = Some(crate::bar::BarId::new());
        let storage = MemoryStorage::with_snapshot(PersistedState::now(state));
        let err = load_snapshot(&storage).await;
        assert!(matches!(err, Err(crate::BarsError::Invariant(_))));

        let empty = MemoryStorage::new();
        assert!(load_snapshot(&empty).await.expect("load").is_none());
    }
}

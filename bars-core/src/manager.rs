//! The state container: current snapshot, action log and subscribers.
//!
//! ```text
//! dispatch ──► (batch buffer) ──► log.append + reduce ──► Arc<AppState> ──► subscribers
//!                                      ▲
//! undo ─► log.undo ─► replay(base, log)┘
//! ```
//!
//! A [`StateManager`] is built explicitly and handed to whatever drives it;
//! there is no global instance.

use std::sync::Arc;

use crate::action::{current_timestamp_ms, Action, Command};
use crate::history::{ActionLog, DEFAULT_MAX_HISTORY};
use crate::reducer::{self, reduce};
use crate::state::AppState;

/// Callback invoked with every new snapshot.
pub type Subscriber = Box<dyn FnMut(&Arc<AppState>)>;

/// Handle returned by [`StateManager::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Configuration for a [`StateManager`].
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Number of actions kept for undo.
    pub max_history: usize,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            max_history: DEFAULT_MAX_HISTORY,
        }
    }
}

/// Owns the application state and its undo history.
pub struct StateManager {
    /// State before the oldest action still in the log.
    base: Arc<AppState>,
    /// Current snapshot.
    state: Arc<AppState>,
    log: ActionLog,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: u64,
    /// Actions dispatched inside an open batch.
    pending: Option<Vec<Action>>,
    /// State changed inside the open batch; notify when it closes.
    batch_changed: bool,
}

impl std::fmt::Debug for StateManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateManager")
            .field("state", &self.state)
            .field("log", &self.log)
            .field("subscribers", &self.subscribers.len())
            .field("batching", &self.pending.is_some())
            .finish_non_exhaustive()
    }
}

impl StateManager {
    /// Create a manager over an empty default state.
    #[must_use]
    pub fn new() -> Self {
        Self::with_state(AppState::new())
    }

    /// Create a manager starting from `state`.
    #[must_use]
    pub fn with_state(state: AppState) -> Self {
        Self::with_config(state, ManagerConfig::default())
    }

    /// Create a manager with a custom configuration.
    #[must_use]
    pub fn with_config(state: AppState, config: ManagerConfig) -> Self {
        let state = Arc::new(state);
        Self {
            base: Arc::clone(&state),
            state,
            log: ActionLog::with_max_size(config.max_history),
            subscribers: Vec::new(),
            next_subscription: 0,
            pending: None,
            batch_changed: false,
        }
    }

    /// The current snapshot.
    #[must_use]
    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// Stamp `command` with the current time and dispatch it.
    pub fn dispatch(&mut self, command: Command) {
        self.dispatch_action(Action::new(command, current_timestamp_ms()));
    }

    /// Dispatch an already stamped action.
    ///
    /// Inside [`StateManager::batch`] the action is buffered; otherwise it is
    /// applied and subscribers are notified immediately.
    pub fn dispatch_action(&mut self, action: Action) {
        if let Some(pending) = self.pending.as_mut() {
            tracing::trace!(command = action.command.kind(), "Buffering action in batch");
            pending.push(action);
            return;
        }
        self.execute(action);
        self.notify();
    }

    /// Dispatch `command`, folding it into the latest log entry when it
    /// [supersedes](Command::supersedes) that entry.
    ///
    /// Continuous drags use this so a whole gesture is one undo step.
    /// Inside a batch, or with a redo branch pending, this is a plain
    /// [`StateManager::dispatch`].
    pub fn dispatch_coalesced(&mut self, command: Command) {
        let mergeable = self.pending.is_none()
            && self.log.future_len() == 0
            && self
                .log
                .last()
                .is_some_and(|last| command.supersedes(&last.command));
        if !mergeable {
            self.dispatch(command);
            return;
        }

        let action = Action::new(command, current_timestamp_ms());
        tracing::trace!(command = action.command.kind(), "Coalescing into latest action");
        let next = reduce(&self.state, &action);
        self.log.replace_last(action);
        self.commit(next);
        self.notify();
    }

    /// Run `f`, applying everything it dispatches once it returns.
    ///
    /// Each buffered action becomes its own log entry, so undo still steps
    /// through them one at a time, but subscribers see only the final state.
    /// Nested batches fold into the outermost one. An undo, redo or restore
    /// inside `f` first applies what was dispatched before it, keeping
    /// dispatch order.
    pub fn batch<F>(&mut self, f: F)
    where
        F: FnOnce(&mut Self),
    {
        if self.pending.is_some() {
            f(self);
            return;
        }

        self.pending = Some(Vec::new());
        self.batch_changed = false;
        f(self);
        self.flush_pending();
        self.pending = None;
        if std::mem::take(&mut self.batch_changed) {
            self.notify();
        }
    }

    /// Undo the latest action. Returns `false` when there is nothing to undo.
    ///
    /// The state is rebuilt by replaying the remaining log from the base
    /// snapshot, so actions without an inverse (joins) undo correctly.
    pub fn undo(&mut self) -> bool {
        self.flush_pending();
        if !self.log.undo() {
            tracing::trace!("Undo with empty history ignored");
            return false;
        }

        let mut replayed = (*self.base).clone();
        for action in self.log.actions() {
            reducer::apply(&mut replayed, &action.command);
        }
        tracing::debug!(remaining = self.log.len(), "Undo");
        self.commit(replayed);
        self.publish();
        true
    }

    /// Re-apply the most recently undone action. Returns `false` when there
    /// is nothing to redo.
    ///
    /// The rest of the redo buffer is kept, so several undos can be redone
    /// in turn.
    pub fn redo(&mut self) -> bool {
        self.flush_pending();
        let Some(action) = self.log.redo() else {
            tracing::trace!("Redo with empty buffer ignored");
            return false;
        };

        tracing::debug!(command = action.command.kind(), "Redo");
        let next = reduce(&self.state, action);
        self.commit(next);
        self.publish();
        true
    }

    /// Whether [`StateManager::undo`] would do anything.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.log.is_empty()
    }

    /// Whether [`StateManager::redo`] would do anything.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.log.future_len() > 0
    }

    /// Number of actions that can be undone.
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.log.len()
    }

    /// Logged actions, oldest first.
    pub fn actions(&self) -> impl Iterator<Item = &Action> {
        self.log.actions()
    }

    /// Whether a batch is currently open.
    #[must_use]
    pub fn is_batching(&self) -> bool {
        self.pending.is_some()
    }

    /// Replace the state wholesale (e.g. after loading from storage).
    ///
    /// History is cleared: the restored state becomes the new undo floor.
    pub fn restore(&mut self, state: AppState) {
        self.flush_pending();
        tracing::debug!(bars = state.bars.len(), "Restoring state");
        self.log.clear();
        self.commit(state);
        self.base = Arc::clone(&self.state);
        self.publish();
    }

    /// Register a callback. It is called immediately with the current state
    /// and again after every change.
    pub fn subscribe<F>(&mut self, mut subscriber: F) -> SubscriptionId
    where
        F: FnMut(&Arc<AppState>) + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        subscriber(&self.state);
        self.subscribers.push((id, Box::new(subscriber)));
        id
    }

    /// Remove a callback. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    fn execute(&mut self, action: Action) {
        tracing::debug!(command = action.command.kind(), "Dispatching action");
        self.log.clear_future();
        let next = reduce(&self.state, &action);
        if let Some(evicted) = self.log.append(action) {
            let mut base = (*self.base).clone();
            reducer::apply(&mut base, &evicted.command);
            self.base = Arc::new(base);
        }
        self.commit(next);
    }

    fn commit(&mut self, next: AppState) {
        if let Err(violation) = next.validate() {
            tracing::error!(%violation, "State invariant violated");
        }
        self.state = Arc::new(next);
    }

    /// Apply the actions buffered so far in the open batch, which stays
    /// open. Does nothing outside a batch.
    fn flush_pending(&mut self) {
        let actions = self.pending.as_mut().map(std::mem::take).unwrap_or_default();
        if actions.is_empty() {
            return;
        }
        tracing::debug!(count = actions.len(), "Applying batch");
        for action in actions {
            self.execute(action);
        }
        self.batch_changed = true;
    }

    /// Notify now, or when the open batch closes.
    fn publish(&mut self) {
        if self.pending.is_some() {
            self.batch_changed = true;
        } else {
            self.notify();
        }
    }

    fn notify(&mut self) {
        for (_, subscriber) in &mut self.subscribers {
            subscriber(&self.state);
        }
    }
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}

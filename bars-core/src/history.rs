//! # Action Log
//!
//! Bounded, ordered log of dispatched actions plus the redo buffer.
//!
//! ```text
//! dispatch: past.push_back(a), future.clear()   (oldest evicted past the bound)
//! undo:     future.push(past.pop_back())
//! redo:     past.push_back(future.pop())
//! ```

use std::collections::VecDeque;

use crate::action::Action;

/// Number of actions kept for undo.
pub const DEFAULT_MAX_HISTORY: usize = 100;

/// Undo/redo log.
#[derive(Debug, Clone)]
pub struct ActionLog {
    /// Applied actions, oldest first.
    past: VecDeque<Action>,
    /// Undone actions, most recently undone last.
    future: Vec<Action>,
    /// Maximum number of applied actions retained.
    max_size: usize,
}

impl ActionLog {
    /// Create an empty log holding up to [`DEFAULT_MAX_HISTORY`] actions.
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_size(DEFAULT_MAX_HISTORY)
    }

    /// Create a log with a custom bound. A bound of zero is raised to one.
    #[must_use]
    pub fn with_max_size(max_size: usize) -> Self {
        Self {
            past: VecDeque::new(),
            future: Vec::new(),
            max_size: max_size.max(1),
        }
    }

    /// Append an action, returning the oldest one if it had to be evicted.
    ///
    /// Does not touch the redo buffer; see [`ActionLog::clear_future`].
    pub fn append(&mut self, action: Action) -> Option<Action> {
        self.past.push_back(action);
        if self.past.len() > self.max_size {
            self.past.pop_front()
        } else {
            None
        }
    }

    /// The latest applied action.
    #[must_use]
    pub fn last(&self) -> Option<&Action> {
        self.past.back()
    }

    /// Swap the latest applied action for `action`, returning the old one.
    /// Does nothing on an empty log.
    pub fn replace_last(&mut self, action: Action) -> Option<Action> {
        let last = self.past.back_mut()?;
        Some(std::mem::replace(last, action))
    }

    /// Abandon the redo branch.
    pub fn clear_future(&mut self) {
        self.future.clear();
    }

    /// Move the latest action into the redo buffer.
    ///
    /// Returns `false` when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        match self.past.pop_back() {
            Some(action) => {
                self.future.push(action);
                true
            }
            None => false,
        }
    }

    /// Move the most recently undone action back onto the log and return it.
    pub fn redo(&mut self) -> Option<&Action> {
        let action = self.future.pop()?;
        // past + future never exceeds the bound, so this cannot evict.
        self.past.push_back(action);
        self.past.back()
    }

    /// Applied actions, oldest first.
    pub fn actions(&self) -> impl Iterator<Item = &Action> {
        self.past.iter()
    }

    /// Number of applied actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.past.len()
    }

    /// Check if no actions are applied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.past.is_empty()
    }

    /// Number of undone actions available for redo.
    #[must_use]
    pub fn future_len(&self) -> usize {
        self.future.len()
    }

    /// The retention bound.
    #[must_use]
    pub const fn max_size(&self) -> usize {
        self.max_size
    }

    /// Drop all applied and undone actions.
    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }
}

impl Default for ActionLog {
    fn default() -> Self {
        Self::new()
    }
}

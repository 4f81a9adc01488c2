//! Replay scripts.
//!
//! A script is a JSON array of steps, each tagged by `kind`:
//!
//! ```json
//! [
//!   { "kind": "down", "id": 0, "x": 20, "y": 20, "t": 0 },
//!   { "kind": "up", "id": 0, "x": 20, "y": 20, "t": 80 },
//!   { "kind": "key", "key": "s" },
//!   { "kind": "command", "command": { "type": "CHANGE_TOOL", "payload": { "tool": "bar" } } },
//!   { "kind": "batch", "steps": [ { "kind": "undo" } ] }
//! ]
//! ```

use bars_core::input::KeyModifiers;
use bars_core::measure::measure_all;
use bars_core::{BarsResult, Command, InputController, StateManager};
use serde::{Deserialize, Serialize};

/// One scripted input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ScriptStep {
    /// Pointer pressed.
    Down {
        /// Pointer id.
        id: u32,
        /// X position.
        x: f32,
        /// Y position.
        y: f32,
        /// Timestamp in milliseconds.
        #[serde(default)]
        t: u64,
    },
    /// Pointer moved.
    Move {
        /// Pointer id.
        id: u32,
        /// X position.
        x: f32,
        /// Y position.
        y: f32,
    },
    /// Pointer released.
    Up {
        /// Pointer id.
        id: u32,
        /// X position.
        x: f32,
        /// Y position.
        y: f32,
        /// Timestamp in milliseconds.
        #[serde(default)]
        t: u64,
    },
    /// Pointer cancelled.
    Cancel {
        /// Pointer id.
        id: u32,
    },
    /// Key pressed.
    Key {
        /// Key name, as in `KeyboardEvent.key`.
        key: String,
        /// Held modifiers.
        #[serde(default)]
        modifiers: KeyModifiers,
    },
    /// A raw command in its wire form.
    Command {
        /// `{ "type": ..., "payload": ... }`.
        command: serde_json::Value,
    },
    /// Undo once.
    Undo,
    /// Redo once.
    Redo,
    /// Label every bar with its fraction of the unit bar.
    Measure,
    /// Run nested steps as one batch.
    Batch {
        /// Steps to run.
        steps: Vec<ScriptStep>,
    },
}

/// What a replay did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Steps executed, nested ones included.
    pub steps: usize,
    /// Gesture intents produced by pointer steps.
    pub intents: usize,
    /// Key steps that matched a shortcut.
    pub keys_handled: usize,
}

/// Parse a script document.
///
/// # Errors
///
/// Returns an error if the JSON is not an array of steps.
pub fn parse_script(json: &str) -> serde_json::Result<Vec<ScriptStep>> {
    serde_json::from_str(json)
}

/// Run `steps` against `manager`, routing pointer and key input through
/// `input`.
///
/// # Errors
///
/// Returns the first malformed `command` step. Steps before it have been
/// applied.
pub fn run_script(
    manager: &mut StateManager,
    input: &mut InputController,
    steps: &[ScriptStep],
) -> BarsResult<ReplaySummary> {
    let mut summary = ReplaySummary::default();
    for step in steps {
        run_step(manager, input, step, &mut summary)?;
    }
    Ok(summary)
}

fn run_step(
    manager: &mut StateManager,
    input: &mut InputController,
    step: &ScriptStep,
    summary: &mut ReplaySummary,
) -> BarsResult<()> {
    summary.steps += 1;
    let intent = match step {
        ScriptStep::Down { id, x, y, t } => {
            input.pointer_down(manager, *id, *x, *y, *t);
            None
        }
        ScriptStep::Move { id, x, y } => input.pointer_move(manager, *id, *x, *y),
        ScriptStep::Up { id, x, y, t } => input.pointer_up(manager, *id, *x, *y, *t),
        ScriptStep::Cancel { id } => {
            input.pointer_cancel(*id);
            None
        }
        ScriptStep::Key { key, modifiers } => {
            if input.key_down(manager, key, *modifiers) {
                summary.keys_handled += 1;
            }
            None
        }
        ScriptStep::Command { command } => {
            manager.dispatch(Command::from_json(&command.to_string())?);
            None
        }
        ScriptStep::Undo => {
            manager.undo();
            None
        }
        ScriptStep::Redo => {
            manager.redo();
            None
        }
        ScriptStep::Measure => {
            let commands = measure_all(manager.state());
            manager.batch(|m| {
                for command in commands {
                    m.dispatch(command);
                }
            });
            None
        }
        ScriptStep::Batch { steps } => {
            let mut result = Ok(());
            manager.batch(|m| {
                for nested in steps {
                    result = run_step(m, input, nested, summary);
                    if result.is_err() {
                        break;
                    }
                }
            });
            result?;
            None
        }
    };
    if let Some(intent) = intent {
        tracing::trace!(?intent, "Gesture intent");
        summary.intents += 1;
    }
    Ok(())
}

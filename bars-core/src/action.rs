//! Commands and timestamped actions, the only way state changes.

use serde::{Deserialize, Serialize};

use crate::bar::{Bar, BarChanges, BarDraft, BarId, Split};
use crate::error::{BarsError, BarsResult};
use crate::state::{SettingsPatch, Tool};

/// Wire names of every command type, as found in the `type` field.
pub const COMMAND_TYPES: [&str; 8] = [
    "ADD_BAR",
    "REMOVE_BAR",
    "MODIFY_BAR",
    "SPLIT_BAR",
    "JOIN_BARS",
    "SET_UNIT_BAR",
    "CHANGE_TOOL",
    "UPDATE_SETTINGS",
];

/// A state mutation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "SCREAMING_SNAKE_CASE"
)]
pub enum Command {
    /// Append a new bar.
    AddBar(BarDraft),

    /// Remove a bar.
    RemoveBar {
        /// Bar to remove.
        id: BarId,
    },

    /// Shallow-merge changes into a bar.
    ModifyBar {
        /// Bar to change.
        id: BarId,
        /// Fields to overwrite.
        changes: BarChanges,
    },

    /// Replace a bar's splits.
    #[serde(rename_all = "camelCase")]
    SplitBar {
        /// Bar to split.
        bar_id: BarId,
        /// The new splits.
        splits: Vec<Split>,
    },

    /// Replace several bars with one.
    #[serde(rename_all = "camelCase")]
    JoinBars {
        /// Bars being joined.
        source_ids: Vec<BarId>,
        /// The bar that replaces them.
        result_bar: Bar,
    },

    /// Make a bar the unit bar.
    SetUnitBar {
        /// The new unit bar.
        id: BarId,
    },

    /// Switch the active tool.
    ChangeTool {
        /// The new tool.
        tool: Tool,
    },

    /// Shallow-merge a settings patch.
    UpdateSettings(SettingsPatch),
}

impl Command {
    /// Parse a command from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`BarsError::UnknownCommand`] when the `type` field names no
    /// known command, and [`BarsError::Serialization`] for any other
    /// malformed input.
    pub fn from_json(json: &str) -> BarsResult<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        if let Some(kind) = value.get("type").and_then(serde_json::Value::as_str) {
            if !COMMAND_TYPES.contains(&kind) {
                return Err(BarsError::UnknownCommand(kind.to_string()));
            }
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Whether applying `self` right after `earlier` gives the same state as
    /// applying `self` in its place. True for two moves of the same bar.
    #[must_use]
    pub fn supersedes(&self, earlier: &Command) -> bool {
        match (self, earlier) {
            (
                Self::ModifyBar { id, changes },
                Self::ModifyBar {
                    id: earlier_id,
                    changes: earlier_changes,
                },
            ) => id == earlier_id && changes.is_position_only() && earlier_changes.is_position_only(),
            _ => false,
        }
    }

    /// Wire name of this command.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::AddBar(_) => "ADD_BAR",
            Self::RemoveBar { .. } => "REMOVE_BAR",
            Self::ModifyBar { .. } => "MODIFY_BAR",
            Self::SplitBar { .. } => "SPLIT_BAR",
            Self::JoinBars { .. } => "JOIN_BARS",
            Self::SetUnitBar { .. } => "SET_UNIT_BAR",
            Self::ChangeTool { .. } => "CHANGE_TOOL",
            Self::UpdateSettings(_) => "UPDATE_SETTINGS",
        }
    }
}

/// A command stamped with the time it was dispatched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// The mutation.
    pub command: Command,
    /// Dispatch time in milliseconds since epoch.
    pub timestamp: u64,
}

impl Action {
    /// Create an action.
    #[must_use]
    pub const fn new(command: Command, timestamp: u64) -> Self {
        Self { command, timestamp }
    }

    /// Create an action stamped with the current time.
    #[must_use]
    pub fn now(command: Command) -> Self {
        Self::new(command, current_timestamp_ms())
    }
}

/// Get the current Unix timestamp in milliseconds.
#[cfg(not(all(feature = "wasm", target_arch = "wasm32")))]
#[must_use]
pub fn current_timestamp_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};

    SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |d| {
        // Timestamp will not exceed u64 max for millennia
        #[allow(clippy::cast_possible_truncation)]
        {
            d.as_millis() as u64
        }
    })
}

/// Get the current Unix timestamp in milliseconds.
#[cfg(all(feature = "wasm", target_arch = "wasm32"))]
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn current_timestamp_ms() -> u64 {
    js_sys::Date::now() as u64
}

//! Turning pointer and keyboard input into commands.
//!
//! The [`InputController`] owns a [`GestureClassifier`] and translates its
//! intents into [`Command`]s against the bar under the pointer. Keyboard
//! shortcuts are mapped by [`Shortcut::from_key`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::action::Command;
use crate::bar::{BarChanges, BarDraft, BarId};
use crate::geometry::{self, snap};
use crate::gesture::{GestureClassifier, GestureConfig, GestureIntent};
use crate::manager::StateManager;
use crate::measure::fraction_of;
use crate::state::{AppState, Tool};

/// Distance moved by an arrow key (pixels).
pub const NUDGE_STEP: f32 = 1.0;

/// Distance moved by Shift + arrow key (pixels).
pub const NUDGE_STEP_LARGE: f32 = 10.0;

/// Phase of a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerPhase {
    /// Pointer pressed.
    Down,
    /// Pointer moved while pressed.
    Move,
    /// Pointer released.
    Up,
    /// Pointer cancelled (e.g., palm rejection).
    Cancel,
}

/// A single pointer sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointerEvent {
    /// Pointer identifier (for multi-touch).
    pub id: u32,
    /// Phase of this event.
    pub phase: PointerPhase,
    /// X position in canvas coordinates.
    pub x: f32,
    /// Y position in canvas coordinates.
    pub y: f32,
    /// Timestamp in milliseconds.
    #[serde(default)]
    pub timestamp_ms: u64,
}

/// Keyboard modifiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct KeyModifiers {
    /// Shift key pressed.
    #[serde(default)]
    pub shift: bool,
    /// Control key pressed.
    #[serde(default)]
    pub ctrl: bool,
    /// Alt/Option key pressed.
    #[serde(default)]
    pub alt: bool,
    /// Meta/Command key pressed.
    #[serde(default)]
    pub meta: bool,
}

impl KeyModifiers {
    /// Modifiers with only Shift held.
    #[must_use]
    pub const fn shift() -> Self {
        Self {
            shift: true,
            ctrl: false,
            alt: false,
            meta: false,
        }
    }

    /// Modifiers with only Ctrl held.
    #[must_use]
    pub const fn ctrl() -> Self {
        Self {
            shift: false,
            ctrl: true,
            alt: false,
            meta: false,
        }
    }

    /// Whether the platform command key (Ctrl or Cmd) is held.
    #[must_use]
    pub const fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// An action bound to a key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shortcut {
    /// Undo the last action.
    Undo,
    /// Redo the last undone action.
    Redo,
    /// Remove the selected bars.
    DeleteSelected,
    /// Move the selected bars.
    Nudge {
        /// Horizontal offset.
        dx: f32,
        /// Vertical offset.
        dy: f32,
    },
    /// Switch tools.
    SelectTool(Tool),
    /// Make the single selected bar the unit bar.
    SetUnitBar,
}

impl Shortcut {
    /// Map a key name (as in `KeyboardEvent.key`) to a shortcut.
    #[must_use]
    pub fn from_key(key: &str, modifiers: KeyModifiers) -> Option<Self> {
        if modifiers.command() {
            return match key {
                "z" | "Z" if modifiers.shift => Some(Self::Redo),
                "z" | "Z" => Some(Self::Undo),
                "y" | "Y" => Some(Self::Redo),
                _ => None,
            };
        }

        let step = if modifiers.shift {
            NUDGE_STEP_LARGE
        } else {
            NUDGE_STEP
        };
        match key {
            "Delete" | "Backspace" => Some(Self::DeleteSelected),
            "ArrowLeft" => Some(Self::Nudge { dx: -step, dy: 0.0 }),
            "ArrowRight" => Some(Self::Nudge { dx: step, dy: 0.0 }),
            "ArrowUp" => Some(Self::Nudge { dx: 0.0, dy: -step }),
            "ArrowDown" => Some(Self::Nudge { dx: 0.0, dy: step }),
            "b" | "B" => Some(Self::SelectTool(Tool::Bar)),
            "s" | "S" => Some(Self::SelectTool(Tool::Split)),
            "j" | "J" => Some(Self::SelectTool(Tool::Join)),
            "m" | "M" => Some(Self::SelectTool(Tool::Measure)),
            "u" | "U" => Some(Self::SetUnitBar),
            _ => None,
        }
    }
}

/// The bar being manipulated by the current gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
struct GestureTarget {
    bar_id: BarId,
    /// Bar position when the gesture started.
    origin_x: f32,
    origin_y: f32,
    /// Where the pointer went down.
    press_x: f32,
    press_y: f32,
    /// A split was already dispatched during this gesture.
    split_done: bool,
    /// A move was already logged during this gesture.
    moved: bool,
}

/// Routes pointer and keyboard input into a [`StateManager`].
#[derive(Debug, Clone, Default)]
pub struct InputController {
    classifier: GestureClassifier,
    target: Option<GestureTarget>,
}

impl InputController {
    /// Create a controller with default gesture thresholds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a controller with custom gesture thresholds.
    #[must_use]
    pub fn with_config(config: GestureConfig) -> Self {
        Self {
            classifier: GestureClassifier::with_config(config),
            target: None,
        }
    }

    /// The underlying classifier.
    #[must_use]
    pub const fn classifier(&self) -> &GestureClassifier {
        &self.classifier
    }

    /// ID of the bar the current gesture acts on.
    #[must_use]
    pub fn target(&self) -> Option<BarId> {
        self.target.map(|t| t.bar_id)
    }

    /// Feed one pointer event. Returns the intent it produced, if any.
    pub fn handle_pointer(
        &mut self,
        manager: &mut StateManager,
        event: &PointerEvent,
    ) -> Option<GestureIntent> {
        match event.phase {
            PointerPhase::Down => {
                self.pointer_down(manager, event.id, event.x, event.y, event.timestamp_ms);
                None
            }
            PointerPhase::Move => self.pointer_move(manager, event.id, event.x, event.y),
            PointerPhase::Up => {
                self.pointer_up(manager, event.id, event.x, event.y, event.timestamp_ms)
            }
            PointerPhase::Cancel => {
                self.pointer_cancel(event.id);
                None
            }
        }
    }

    /// A pointer went down. The first pointer picks the topmost bar under
    /// it as the gesture target; a second pointer ends any manipulation.
    pub fn pointer_down(&mut self, manager: &StateManager, id: u32, x: f32, y: f32, t: u64) {
        self.classifier.pointer_down(id, x, y, t);
        if self.classifier.active_pointers() == 1 {
            self.target = manager.state().bar_at(x, y).map(|bar| GestureTarget {
                bar_id: bar.id,
                origin_x: bar.x,
                origin_y: bar.y,
                press_x: x,
                press_y: y,
                split_done: false,
                moved: false,
            });
        } else {
            self.target = None;
        }
    }

    /// A pointer moved. Drags move the target bar; splits cut it when the
    /// split tool is active.
    pub fn pointer_move(
        &mut self,
        manager: &mut StateManager,
        id: u32,
        x: f32,
        y: f32,
    ) -> Option<GestureIntent> {
        let intent = self.classifier.pointer_move(id, x, y)?;
        match intent {
            GestureIntent::Drag {
                delta_x, delta_y, ..
            } => self.move_target(manager, delta_x, delta_y),
            GestureIntent::Split { orientation, x, y } => {
                if manager.state().current_tool == Tool::Split {
                    self.split_target(manager, orientation, x, y);
                } else if let Some(target) = self.target {
                    self.move_target(manager, x - target.press_x, y - target.press_y);
                }
            }
            GestureIntent::Pinch { .. } | GestureIntent::Select { .. } => {}
        }
        Some(intent)
    }

    /// A pointer lifted. A tap acts according to the current tool.
    pub fn pointer_up(
        &mut self,
        manager: &mut StateManager,
        id: u32,
        x: f32,
        y: f32,
        t: u64,
    ) -> Option<GestureIntent> {
        let intent = self.classifier.pointer_up(id, x, y, t);
        if self.classifier.active_pointers() == 0 {
            self.target = None;
        }
        if let Some(GestureIntent::Select { x, y }) = intent {
            tap(manager, x, y);
        }
        intent
    }

    /// A pointer was cancelled; nothing is dispatched.
    pub fn pointer_cancel(&mut self, id: u32) {
        self.classifier.pointer_cancel(id);
        if self.classifier.active_pointers() == 0 {
            self.target = None;
        }
    }

    /// Handle a key press. Returns `true` if the key was bound.
    pub fn key_down(&mut self, manager: &mut StateManager, key: &str, modifiers: KeyModifiers) -> bool {
        let Some(shortcut) = Shortcut::from_key(key, modifiers) else {
            return false;
        };
        tracing::debug!(?shortcut, "Keyboard shortcut");
        apply_shortcut(manager, shortcut);
        true
    }

    fn move_target(&mut self, manager: &mut StateManager, delta_x: f32, delta_y: f32) {
        let Some(target) = self.target else {
            return;
        };
        let settings = &manager.state().settings;
        let (mut x, mut y) = (target.origin_x + delta_x, target.origin_y + delta_y);
        if settings.snap_to_grid {
            x = snap(x, settings.grid_size);
            y = snap(y, settings.grid_size);
        }
        let unchanged = manager
            .state()
            .bar(target.bar_id)
            .map_or(true, |bar| {
                (bar.x - x).abs() < f32::EPSILON && (bar.y - y).abs() < f32::EPSILON
            });
        if unchanged {
            return;
        }
        let command = Command::ModifyBar {
            id: target.bar_id,
            changes: BarChanges::position(x, y),
        };
        // Later moves of the same gesture replace the first one in history.
        if target.moved {
            manager.dispatch_coalesced(command);
        } else {
            manager.dispatch(command);
        }
        if let Some(target) = self.target.as_mut() {
            target.moved = true;
        }
    }

    fn split_target(
        &mut self,
        manager: &mut StateManager,
        orientation: geometry::SplitOrientation,
        x: f32,
        y: f32,
    ) {
        let Some(target) = self.target.as_mut() else {
            return;
        };
        if target.split_done {
            return;
        }
        let Some(bar) = manager.state().bar(target.bar_id) else {
            return;
        };
        let Some(splits) = geometry::split_at(bar, x, y, orientation) else {
            tracing::trace!(?orientation, x, y, "Split outside bar ignored");
            return;
        };
        target.split_done = true;
        let bar_id = target.bar_id;
        manager.dispatch(Command::SplitBar { bar_id, splits });
    }
}

/// Act on a tap at `(x, y)` according to the current tool.
fn tap(manager: &mut StateManager, x: f32, y: f32) {
    let state = Arc::clone(manager.state());
    let hit = state.bar_at(x, y);

    match (state.current_tool, hit) {
        (Tool::Bar, None) => {
            let (x, y) = if state.settings.snap_to_grid {
                (snap(x, state.settings.grid_size), snap(y, state.settings.grid_size))
            } else {
                (x, y)
            };
            manager.dispatch(Command::AddBar(BarDraft::new().at(x, y)));
        }
        (Tool::Measure, Some(bar)) => {
            if let Some(fraction) = state.unit_bar().and_then(|unit| fraction_of(bar, unit)) {
                manager.dispatch(Command::ModifyBar {
                    id: bar.id,
                    changes: BarChanges::fraction(fraction.to_string()),
                });
            } else {
                toggle_selection(manager, bar.id, bar.is_selected);
            }
        }
        (Tool::Join, Some(bar)) => {
            let partner = state
                .selected_bars()
                .find(|other| other.id != bar.id && geometry::can_join(other, bar));
            if let Some(partner) = partner {
                manager.dispatch(Command::JoinBars {
                    source_ids: vec![partner.id, bar.id],
                    result_bar: geometry::join(partner, bar),
                });
            } else {
                toggle_selection(manager, bar.id, bar.is_selected);
            }
        }
        (_, Some(bar)) => toggle_selection(manager, bar.id, bar.is_selected),
        (_, None) => clear_selection(manager, &state),
    }
}

fn toggle_selection(manager: &mut StateManager, id: BarId, is_selected: bool) {
    manager.dispatch(Command::ModifyBar {
        id,
        changes: BarChanges::selected(!is_selected),
    });
}

fn clear_selection(manager: &mut StateManager, state: &AppState) {
    manager.batch(|m| {
        for id in &state.selected_bar_ids {
            m.dispatch(Command::ModifyBar {
                id: *id,
                changes: BarChanges::selected(false),
            });
        }
    });
}

fn apply_shortcut(manager: &mut StateManager, shortcut: Shortcut) {
    let state = Arc::clone(manager.state());
    match shortcut {
        Shortcut::Undo => {
            manager.undo();
        }
        Shortcut::Redo => {
            manager.redo();
        }
        Shortcut::DeleteSelected => manager.batch(|m| {
            for id in &state.selected_bar_ids {
                m.dispatch(Command::RemoveBar { id: *id });
            }
        }),
        Shortcut::Nudge { dx, dy } => manager.batch(|m| {
            for bar in state.selected_bars() {
                m.dispatch(Command::ModifyBar {
                    id: bar.id,
                    changes: BarChanges::position(bar.x + dx, bar.y + dy),
                });
            }
        }),
        Shortcut::SelectTool(tool) => {
            if state.current_tool != tool {
                manager.dispatch(Command::ChangeTool { tool });
            }
        }
        Shortcut::SetUnitBar => {
            if let [id] = state.selected_bar_ids.as_slice() {
                manager.dispatch(Command::SetUnitBar { id: *id });
            }
        }
    }
}

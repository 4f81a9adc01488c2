//! WebAssembly bindings for bars-core.
//!
//! Exposes a [`WasmFractionBars`] instance that the browser widget drives
//! with pointer, keyboard and command input. State crosses the boundary as
//! JSON in the persisted (camelCase) shape.

use uuid::Uuid;
use wasm_bindgen::prelude::*;

use crate::action::Command;
use crate::bar::BarId;
use crate::export::ExportScene;
use crate::input::{InputController, KeyModifiers};
use crate::manager::StateManager;
use crate::measure::measure_all;
use crate::narration::describe;
use crate::store::PersistedState;

/// Initialize the WASM module.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "wasm")]
    console_error_panic_hook::set_once();
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn millis(t: f64) -> u64 {
    t.max(0.0) as u64
}

/// Fraction bars instance for WASM.
#[wasm_bindgen]
pub struct WasmFractionBars {
    manager: StateManager,
    input: InputController,
}

#[wasm_bindgen]
impl WasmFractionBars {
    /// Create an instance with an empty canvas.
    #[wasm_bindgen(constructor)]
    #[must_use]
    pub fn new() -> Self {
        Self {
            manager: StateManager::new(),
            input: InputController::new(),
        }
    }

    /// Current state as JSON.
    #[wasm_bindgen(js_name = getStateJson)]
    #[must_use]
    pub fn get_state_json(&self) -> String {
        serde_json::to_string(self.manager.state().as_ref()).unwrap_or_default()
    }

    /// Current state wrapped for storage, as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error string if serialization fails.
    #[wasm_bindgen(js_name = getPersistedJson)]
    pub fn get_persisted_json(&self) -> Result<String, String> {
        PersistedState::now(self.manager.state().as_ref().clone())
            .to_json_pretty()
            .map_err(|e| e.to_string())
    }

    /// Replace the state with a persisted document, clearing history.
    ///
    /// # Errors
    ///
    /// Returns an error string if the document is malformed or breaks a
    /// state invariant.
    #[wasm_bindgen(js_name = loadPersistedJson)]
    pub fn load_persisted_json(&mut self, json: &str) -> Result<(), String> {
        let persisted = PersistedState::from_json(json).map_err(|e| e.to_string())?;
        persisted.state.validate().map_err(|e| e.to_string())?;
        self.manager.restore(persisted.state);
        Ok(())
    }

    /// Dispatch a command serialized as `{ "type": ..., "payload": ... }`.
    ///
    /// # Errors
    ///
    /// Returns an error string for unknown command types or bad payloads.
    #[wasm_bindgen(js_name = dispatchJson)]
    pub fn dispatch_json(&mut self, json: &str) -> Result<(), String> {
        let command = Command::from_json(json).map_err(|e| e.to_string())?;
        self.manager.dispatch(command);
        Ok(())
    }

    /// Undo the last action.
    pub fn undo(&mut self) -> bool {
        self.manager.undo()
    }

    /// Redo the last undone action.
    pub fn redo(&mut self) -> bool {
        self.manager.redo()
    }

    /// Whether there is anything to undo.
    #[wasm_bindgen(js_name = canUndo)]
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.manager.can_undo()
    }

    /// Whether there is anything to redo.
    #[wasm_bindgen(js_name = canRedo)]
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.manager.can_redo()
    }

    /// Pointer pressed.
    #[wasm_bindgen(js_name = pointerDown)]
    pub fn pointer_down(&mut self, id: u32, x: f32, y: f32, timestamp_ms: f64) {
        self.input
            .pointer_down(&self.manager, id, x, y, millis(timestamp_ms));
    }

    /// Pointer moved. Returns the gesture intent as JSON, if any.
    #[wasm_bindgen(js_name = pointerMove)]
    pub fn pointer_move(&mut self, id: u32, x: f32, y: f32) -> Option<String> {
        let intent = self.input.pointer_move(&mut self.manager, id, x, y)?;
        serde_json::to_string(&intent).ok()
    }

    /// Pointer released. Returns the tap intent as JSON, if any.
    #[wasm_bindgen(js_name = pointerUp)]
    pub fn pointer_up(&mut self, id: u32, x: f32, y: f32, timestamp_ms: f64) -> Option<String> {
        let intent = self
            .input
            .pointer_up(&mut self.manager, id, x, y, millis(timestamp_ms))?;
        serde_json::to_string(&intent).ok()
    }

    /// Pointer cancelled.
    #[wasm_bindgen(js_name = pointerCancel)]
    pub fn pointer_cancel(&mut self, id: u32) {
        self.input.pointer_cancel(id);
    }

    /// Key pressed. Returns `true` if the key was handled.
    #[wasm_bindgen(js_name = keyDown)]
    #[allow(clippy::fn_params_excessive_bools)]
    pub fn key_down(&mut self, key: &str, shift: bool, ctrl: bool, alt: bool, meta: bool) -> bool {
        let modifiers = KeyModifiers {
            shift,
            ctrl,
            alt,
            meta,
        };
        self.input.key_down(&mut self.manager, key, modifiers)
    }

    /// Label every bar with its fraction of the unit bar, as one batch.
    /// Returns the number of bars relabelled.
    #[wasm_bindgen(js_name = measureAll)]
    pub fn measure_all(&mut self) -> usize {
        let commands = measure_all(self.manager.state());
        let count = commands.len();
        self.manager.batch(|m| {
            for command in commands {
                m.dispatch(command);
            }
        });
        count
    }

    /// Spoken description of a bar, for the live region.
    #[wasm_bindgen(js_name = describeBar)]
    #[must_use]
    pub fn describe_bar(&self, id: &str) -> Option<String> {
        let id = BarId::from_uuid(Uuid::parse_str(id).ok()?);
        self.manager.state().bar(id).map(describe)
    }

    /// The drawable scene as JSON, for export and print.
    ///
    /// # Errors
    ///
    /// Returns an error string if serialization fails.
    #[wasm_bindgen(js_name = getExportSceneJson)]
    pub fn get_export_scene_json(&self) -> Result<String, String> {
        ExportScene::from_state(self.manager.state())
            .to_json()
            .map_err(|e| e.to_string())
    }
}

impl Default for WasmFractionBars {
    fn default() -> Self {
        Self::new()
    }
}

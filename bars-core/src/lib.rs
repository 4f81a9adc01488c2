//! # Fraction Bars Core
//!
//! State, history and gesture logic for the fraction bars manipulative:
//! learners draw bars, cut them into parts, join them back together and
//! measure them against a chosen unit bar.
//! Compiles to WASM for the browser widget.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                      bars-core                          │
//! ├─────────────────────────────────────────────────────────┤
//! │  Input              │  State                            │
//! │  - Gesture classify │  - Commands + reducer             │
//! │  - Input controller │  - Bounded action log             │
//! │  - Shortcuts        │  - StateManager (undo/redo/batch) │
//! ├─────────────────────────────────────────────────────────┤
//! │  Boundaries         │  Persistence                      │
//! │  - Renderer         │  - Storage (file / memory)        │
//! │  - Narrator         │  - Debounced autosave             │
//! │  - Exporter         │                                   │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Data flows one way: input → [`Command`] → [`reduce`] → new
//! [`AppState`] snapshot → subscribers (renderer, narrator, autosave).

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod action;
pub mod bar;
pub mod error;
pub mod export;
pub mod geometry;
pub mod gesture;
pub mod history;
pub mod input;
pub mod manager;
pub mod measure;
pub mod narration;
pub mod reducer;
pub mod render;
pub mod state;
pub mod store;

#[cfg(not(target_arch = "wasm32"))]
pub mod persistence;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use action::{Action, Command};
pub use bar::{Bar, BarChanges, BarDraft, BarId, Split, SplitId};
pub use error::{BarsError, BarsResult, ExportError, InvariantViolation, StorageError, StorageResult};
pub use export::{ExportFormat, ExportOptions, ExportScene, Exporter};
pub use geometry::{Rect, SplitOrientation};
pub use gesture::{GestureClassifier, GestureConfig, GestureIntent};
pub use history::ActionLog;
pub use input::{InputController, KeyModifiers, PointerEvent, PointerPhase, Shortcut};
pub use manager::{ManagerConfig, StateManager, SubscriptionId};
pub use measure::Fraction;
pub use narration::{LiveRegion, Narrator, Priority};
pub use reducer::reduce;
pub use render::Renderer;
pub use state::{AppState, Settings, SettingsPatch, Tool};
pub use store::{FileStorage, MemoryStorage, PersistedState, Storage};

#[cfg(not(target_arch = "wasm32"))]
pub use persistence::{spawn_autosave, AutosaveConfig, AutosaveHandle};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! # Gesture Recognition
//!
//! Turns raw pointer streams into discrete intents.
//!
//! ```text
//! one pointer, moving:   |dx|,|dy| < 10        → nothing (dead zone)
//!                        |dy| > 2|dx|          → vertical split
//!                        |dx| > 2|dy|          → horizontal split
//!                        otherwise             → drag (dx, dy)
//! two pointers, moving:  scale = d / d0 ∈ [0.5, 2], rotation = a - a0 → pinch
//! pointer up:            < 300 ms and < 10 px  → select (tap)
//! ```
//!
//! Single-pointer classification is re-evaluated on every move unless
//! [`GestureConfig::latch_classification`] is set.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::geometry::{angle, distance, SplitOrientation};

/// Thresholds for gesture classification.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureConfig {
    /// Movement on both axes below this is ignored (pixels).
    pub drag_threshold: f32,
    /// Dominant-axis ratio above which a move counts as a split.
    pub split_ratio: f32,
    /// Longest press that still counts as a tap (milliseconds).
    pub tap_max_duration_ms: u64,
    /// Farthest travel that still counts as a tap (pixels).
    pub tap_max_distance: f32,
    /// Lower pinch scale clamp.
    pub min_scale: f32,
    /// Upper pinch scale clamp.
    pub max_scale: f32,
    /// Keep the first single-pointer classification until the pointer lifts.
    pub latch_classification: bool,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            drag_threshold: 10.0,
            split_ratio: 2.0,
            tap_max_duration_ms: 300,
            tap_max_distance: 10.0,
            min_scale: 0.5,
            max_scale: 2.0,
            latch_classification: false,
        }
    }
}

/// A classified user action.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "intent",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
#[allow(missing_docs)] // Enum variant fields documented at variant level
pub enum GestureIntent {
    /// Tap at a point (x, y coordinates).
    Select { x: f32, y: f32 },

    /// Drag from the press point; carries the current point and the total
    /// delta since the press.
    Drag {
        x: f32,
        y: f32,
        delta_x: f32,
        delta_y: f32,
    },

    /// Cut along `orientation` at the current point.
    Split {
        orientation: SplitOrientation,
        x: f32,
        y: f32,
    },

    /// Two-finger pinch/rotate around the midpoint; rotation in radians.
    Pinch {
        center_x: f32,
        center_y: f32,
        scale: f32,
        rotation: f32,
    },
}

/// Tracking data for one active pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerTrack {
    /// X where the pointer went down (or was re-anchored).
    pub start_x: f32,
    /// Y where the pointer went down (or was re-anchored).
    pub start_y: f32,
    /// Latest X.
    pub current_x: f32,
    /// Latest Y.
    pub current_y: f32,
    /// Press time in milliseconds.
    pub start_time: u64,
    /// Whether lifting this pointer may still produce a tap.
    pub tap_eligible: bool,
}

/// Single-pointer classification, remembered when latching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Classification {
    Split(SplitOrientation),
    Drag,
}

/// State of the interaction in progress. Exists from the first press until
/// the last pointer lifts.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureState {
    pointers: BTreeMap<u32, PointerTrack>,
    /// Distance between the two pointers when the pinch began.
    pub start_distance: f32,
    /// Angle between the two pointers when the pinch began.
    pub start_angle: f32,
    /// Current clamped pinch scale.
    pub scale: f32,
    /// Current rotation in radians.
    pub rotation: f32,
    latched: Option<Classification>,
}

impl GestureState {
    fn new() -> Self {
        Self {
            pointers: BTreeMap::new(),
            start_distance: 0.0,
            start_angle: 0.0,
            scale: 1.0,
            rotation: 0.0,
            latched: None,
        }
    }

    /// Tracking data for a pointer.
    #[must_use]
    pub fn pointer(&self, id: u32) -> Option<&PointerTrack> {
        self.pointers.get(&id)
    }

    /// Number of pointers currently down.
    #[must_use]
    pub fn pointer_count(&self) -> usize {
        self.pointers.len()
    }

    fn pair(&self) -> Option<(PointerTrack, PointerTrack)> {
        let mut tracks = self.pointers.values();
        match (tracks.next(), tracks.next(), tracks.next()) {
            (Some(a), Some(b), None) => Some((*a, *b)),
            _ => None,
        }
    }

    /// Snapshot the pinch baseline from the two active pointers.
    fn begin_pinch(&mut self) {
        if let Some((a, b)) = self.pair() {
            self.start_distance = distance(a.current_x, a.current_y, b.current_x, b.current_y);
            self.start_angle = angle(a.current_x, a.current_y, b.current_x, b.current_y);
            self.scale = 1.0;
            self.rotation = 0.0;
        }
        self.latched = None;
    }

    /// Restart single-pointer tracking from where the remaining pointer is.
    /// The leftover pointer no longer counts as a tap.
    fn reanchor(&mut self) {
        for track in self.pointers.values_mut() {
            track.start_x = track.current_x;
            track.start_y = track.current_y;
            track.tap_eligible = false;
        }
        self.start_distance = 0.0;
        self.start_angle = 0.0;
        self.scale = 1.0;
        self.rotation = 0.0;
        self.latched = None;
    }
}

/// Pointer-stream classifier.
#[derive(Debug, Clone, Default)]
pub struct GestureClassifier {
    config: GestureConfig,
    state: Option<GestureState>,
}

impl GestureClassifier {
    /// Create a classifier with default thresholds.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(GestureConfig::default())
    }

    /// Create with custom configuration.
    #[must_use]
    pub fn with_config(config: GestureConfig) -> Self {
        Self {
            config,
            state: None,
        }
    }

    /// Get the current configuration.
    #[must_use]
    pub const fn config(&self) -> &GestureConfig {
        &self.config
    }

    /// The interaction in progress, if any pointer is down.
    #[must_use]
    pub fn state(&self) -> Option<&GestureState> {
        self.state.as_ref()
    }

    /// Number of pointers currently down.
    #[must_use]
    pub fn active_pointers(&self) -> usize {
        self.state.as_ref().map_or(0, GestureState::pointer_count)
    }

    /// Current pinch scale (1.0 when not pinching).
    #[must_use]
    pub fn scale(&self) -> f32 {
        self.state.as_ref().map_or(1.0, |s| s.scale)
    }

    /// Current pinch rotation in radians (0.0 when not pinching).
    #[must_use]
    pub fn rotation(&self) -> f32 {
        self.state.as_ref().map_or(0.0, |s| s.rotation)
    }

    /// A pointer went down at `(x, y)` at time `t` (milliseconds).
    pub fn pointer_down(&mut self, id: u32, x: f32, y: f32, t: u64) {
        let state = self.state.get_or_insert_with(GestureState::new);
        state.pointers.insert(
            id,
            PointerTrack {
                start_x: x,
                start_y: y,
                current_x: x,
                current_y: y,
                start_time: t,
                tap_eligible: true,
            },
        );
        if state.pointers.len() == 2 {
            state.begin_pinch();
        }
        tracing::trace!(pointer = id, active = state.pointers.len(), "Pointer down");
    }

    /// A tracked pointer moved. Returns at most one intent.
    pub fn pointer_move(&mut self, id: u32, x: f32, y: f32) -> Option<GestureIntent> {
        let config = &self.config;
        let state = self.state.as_mut()?;
        let track = state.pointers.get_mut(&id)?;
        track.current_x = x;
        track.current_y = y;
        let track = *track;

        match state.pointers.len() {
            1 => classify_single(config, state, &track),
            2 => update_pinch(config, state),
            _ => None,
        }
    }

    /// A tracked pointer lifted at `(x, y)` at time `t`. Returns a select
    /// intent for a tap.
    pub fn pointer_up(&mut self, id: u32, x: f32, y: f32, t: u64) -> Option<GestureIntent> {
        let track = self.release(id)?;
        let elapsed = t.saturating_sub(track.start_time);
        let travel = distance(track.start_x, track.start_y, x, y);

        if track.tap_eligible
            && elapsed < self.config.tap_max_duration_ms
            && travel < self.config.tap_max_distance
        {
            tracing::debug!(x, y, elapsed, "Tap");
            Some(GestureIntent::Select { x, y })
        } else {
            None
        }
    }

    /// A tracked pointer was cancelled (e.g. palm rejection).
    pub fn pointer_cancel(&mut self, id: u32) {
        let _ = self.release(id);
    }

    /// Forget every pointer.
    pub fn reset(&mut self) {
        self.state = None;
    }

    fn release(&mut self, id: u32) -> Option<PointerTrack> {
        let state = self.state.as_mut()?;
        let before = state.pointers.len();
        let track = state.pointers.remove(&id)?;

        match state.pointers.len() {
            0 => self.state = None,
            1 if before == 2 => state.reanchor(),
            2 => state.begin_pinch(),
            _ => {}
        }
        Some(track)
    }
}

fn classify_single(
    config: &GestureConfig,
    state: &mut GestureState,
    track: &PointerTrack,
) -> Option<GestureIntent> {
    let delta_x = track.current_x - track.start_x;
    let delta_y = track.current_y - track.start_y;
    let (abs_x, abs_y) = (delta_x.abs(), delta_y.abs());

    if abs_x < config.drag_threshold && abs_y < config.drag_threshold {
        return None;
    }

    let fresh = if abs_y > config.split_ratio * abs_x {
        Classification::Split(SplitOrientation::Vertical)
    } else if abs_x > config.split_ratio * abs_y {
        Classification::Split(SplitOrientation::Horizontal)
    } else {
        Classification::Drag
    };
    let kind = if config.latch_classification {
        *state.latched.get_or_insert(fresh)
    } else {
        fresh
    };

    let (x, y) = (track.current_x, track.current_y);
    Some(match kind {
        Classification::Split(orientation) => GestureIntent::Split { orientation, x, y },
        Classification::Drag => GestureIntent::Drag {
            x,
            y,
            delta_x,
            delta_y,
        },
    })
}

fn update_pinch(config: &GestureConfig, state: &mut GestureState) -> Option<GestureIntent> {
    let (a, b) = state.pair()?;
    let current_distance = distance(a.current_x, a.current_y, b.current_x, b.current_y);
    let current_angle = angle(a.current_x, a.current_y, b.current_x, b.current_y);

    state.scale = if state.start_distance > 0.0 {
        (current_distance / state.start_distance).clamp(config.min_scale, config.max_scale)
    } else {
        1.0
    };
    state.rotation = current_angle - state.start_angle;

    Some(GestureIntent::Pinch {
        center_x: (a.current_x + b.current_x) / 2.0,
        center_y: (a.current_y + b.current_y) / 2.0,
        scale: state.scale,
        rotation: state.rotation,
    })
}

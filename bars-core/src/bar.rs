//! Fraction bars and their splits.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geometry::Rect;

/// Width given to a new bar when neither the command nor the settings say otherwise.
pub const DEFAULT_BAR_WIDTH: f32 = 100.0;

/// Unique identifier for a bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BarId(Uuid);

impl BarId {
    /// Create a new unique bar ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from an existing UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for BarId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BarId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SplitId(Uuid);

impl SplitId {
    /// Create a new unique split ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SplitId {
    fn default() -> Self {
        Self::new()
    }
}

/// A sub-rectangle of a bar, positioned relative to the bar's origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Split {
    /// Unique identifier.
    pub id: SplitId,
    /// X offset from the bar's left edge.
    pub x: f32,
    /// Y offset from the bar's top edge.
    pub y: f32,
    /// Width in pixels.
    pub width: f32,
    /// Height in pixels.
    pub height: f32,
    /// Fill color as hex.
    pub color: String,
    /// Whether this split is selected.
    pub is_selected: bool,
}

impl Split {
    /// Create an unselected split covering the given relative rectangle.
    #[must_use]
    pub fn new(rect: Rect, color: impl Into<String>) -> Self {
        Self {
            id: SplitId::new(),
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            color: color.into(),
            is_selected: false,
        }
    }
}

/// A rectangular bar representing a fraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bar {
    /// Unique identifier.
    pub id: BarId,
    /// X position (pixels from left).
    pub x: f32,
    /// Y position (pixels from top).
    pub y: f32,
    /// Width in pixels.
    pub width: f32,
    /// Height in pixels.
    pub height: f32,
    /// Fill color as hex.
    pub color: String,
    /// Whether this bar is selected.
    pub is_selected: bool,
    /// Whether this bar is the unit other bars are measured against.
    pub is_unit_bar: bool,
    /// Optional user label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Optional fraction display string, e.g. `"3/4"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fraction: Option<String>,
    /// Sub-rectangles, in creation order.
    #[serde(default)]
    pub splits: Vec<Split>,
}

impl Bar {
    /// Create an unselected, unsplit bar with the given geometry.
    #[must_use]
    pub fn new(rect: Rect, color: impl Into<String>) -> Self {
        Self {
            id: BarId::new(),
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            color: color.into(),
            is_selected: false,
            is_unit_bar: false,
            label: None,
            fraction: None,
            splits: Vec::new(),
        }
    }

    /// Set the label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// The bar's rectangle in canvas coordinates.
    #[must_use]
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    /// Check if a point (in canvas coordinates) is within this bar.
    #[must_use]
    pub fn contains_point(&self, x: f32, y: f32) -> bool {
        self.rect().contains(x, y)
    }
}

/// Payload of an add-bar command. Every field except the id may be omitted.
///
/// The id is fixed when the draft is built so that replaying the command
/// during undo recreates the same bar.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BarDraft {
    /// Identifier of the bar to create.
    #[serde(default)]
    pub id: BarId,
    /// X position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f32>,
    /// Y position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f32>,
    /// Width; defaults to [`DEFAULT_BAR_WIDTH`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
    /// Height; defaults to the settings' default height.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,
    /// Color; defaults to the settings' default color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Initial selection state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_selected: Option<bool>,
    /// Label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Fraction display string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fraction: Option<String>,
}

impl BarDraft {
    /// Start a draft with a fresh id and every other field defaulted.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Place the bar's origin.
    #[must_use]
    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    /// Give the bar an explicit size.
    #[must_use]
    pub fn sized(mut self, width: f32, height: f32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Give the bar an explicit color.
    #[must_use]
    pub fn colored(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Give the bar a label.
    #[must_use]
    pub fn labeled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Partial update applied by a modify-bar command.
///
/// Unit-bar status and splits are not part of this: they change through
/// their own commands so the unit and split invariants stay with the reducer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BarChanges {
    /// New X position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f32>,
    /// New Y position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f32>,
    /// New width; ignored unless positive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
    /// New height; ignored unless positive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,
    /// New color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// New selection state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_selected: Option<bool>,
    /// New label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// New fraction display string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fraction: Option<String>,
}

impl BarChanges {
    /// Changes that move a bar to a new origin.
    #[must_use]
    pub fn position(x: f32, y: f32) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    /// Whether these changes set the origin and nothing else.
    #[must_use]
    pub fn is_position_only(&self) -> bool {
        self.x.is_some()
            && self.y.is_some()
            && self.width.is_none()
            && self.height.is_none()
            && self.color.is_none()
            && self.is_selected.is_none()
            && self.label.is_none()
            && self.fraction.is_none()
    }

    /// Changes that select or deselect a bar.
    #[must_use]
    pub fn selected(is_selected: bool) -> Self {
        Self {
            is_selected: Some(is_selected),
            ..Self::default()
        }
    }

    /// Changes that set the fraction display string.
    #[must_use]
    pub fn fraction(fraction: impl Into<String>) -> Self {
        Self {
            fraction: Some(fraction.into()),
            ..Self::default()
        }
    }

    /// Merge these changes into `bar`.
    pub fn apply_to(&self, bar: &mut Bar) {
        if let Some(x) = self.x {
            bar.x = x;
        }
        if let Some(y) = self.y {
            bar.y = y;
        }
        if let Some(width) = self.width.filter(|w| *w > 0.0) {
            bar.width = width;
        }
        if let Some(height) = self.height.filter(|h| *h > 0.0) {
            bar.height = height;
        }
        if let Some(color) = &self.color {
            bar.color.clone_from(color);
        }
        if let Some(selected) = self.is_selected {
            bar.is_selected = selected;
        }
        if let Some(label) = &self.label {
            bar.label = Some(label.clone());
        }
        if let Some(fraction) = &self.fraction {
            bar.fraction = Some(fraction.clone());
        }
    }
}

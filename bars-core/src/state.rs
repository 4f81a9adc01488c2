//! Application state: the bar collection, the active tool and settings.

use serde::{Deserialize, Serialize};

use crate::bar::{Bar, BarId};
use crate::error::InvariantViolation;

/// Schema version written into every state snapshot.
pub const STATE_VERSION: u32 = 1;

/// The tool selected in the toolbar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    /// Create and move bars.
    #[default]
    Bar,
    /// Cut bars in two.
    Split,
    /// Join adjacent bars.
    Join,
    /// Measure bars against the unit bar.
    Measure,
    /// Undo button.
    Undo,
    /// Redo button.
    Redo,
    /// Export the scene to a file.
    Export,
    /// Print the scene.
    Print,
}

impl Tool {
    /// Parse a tool from its lowercase name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "bar" => Some(Self::Bar),
            "split" => Some(Self::Split),
            "join" => Some(Self::Join),
            "measure" => Some(Self::Measure),
            "undo" => Some(Self::Undo),
            "redo" => Some(Self::Redo),
            "export" => Some(Self::Export),
            "print" => Some(Self::Print),
            _ => None,
        }
    }
}

/// User-adjustable settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Color given to new bars.
    pub default_color: String,
    /// Height given to new bars.
    pub default_height: f32,
    /// Whether labels are drawn.
    pub show_labels: bool,
    /// Whether dragged bars snap to the grid.
    pub snap_to_grid: bool,
    /// Grid spacing in pixels.
    pub grid_size: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_color: "#4a90d9".to_string(),
            default_height: 50.0,
            show_labels: true,
            snap_to_grid: false,
            grid_size: 10.0,
        }
    }
}

/// Partial settings update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    /// New color for bars added without one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_color: Option<String>,
    /// New height for bars added without one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_height: Option<f32>,
    /// Show or hide bar labels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_labels: Option<bool>,
    /// Turn grid snapping on or off.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snap_to_grid: Option<bool>,
    /// New grid spacing in pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_size: Option<f32>,
}

impl SettingsPatch {
    /// Merge this patch into `settings`.
    pub fn apply_to(&self, settings: &mut Settings) {
        if let Some(color) = &self.default_color {
            settings.default_color.clone_from(color);
        }
        if let Some(height) = self.default_height.filter(|h| *h > 0.0) {
            settings.default_height = height;
        }
        if let Some(show) = self.show_labels {
            settings.show_labels = show;
        }
        if let Some(snap) = self.snap_to_grid {
            settings.snap_to_grid = snap;
        }
        if let Some(grid) = self.grid_size.filter(|g| *g > 0.0) {
            settings.grid_size = grid;
        }
    }
}

/// The complete application state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    /// Snapshot schema version.
    pub version: u32,
    /// All bars; order is drawing and focus order.
    pub bars: Vec<Bar>,
    /// Active tool.
    pub current_tool: Tool,
    /// Selected bar IDs, in selection order.
    pub selected_bar_ids: Vec<BarId>,
    /// The bar other bars are measured against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_bar_id: Option<BarId>,
    /// User settings.
    pub settings: Settings,
}

impl AppState {
    /// Create an empty state with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::with_settings(Settings::default())
    }

    /// Create an empty state with the given settings.
    #[must_use]
    pub fn with_settings(settings: Settings) -> Self {
        Self {
            version: STATE_VERSION,
            bars: Vec::new(),
            current_tool: Tool::default(),
            selected_bar_ids: Vec::new(),
            unit_bar_id: None,
            settings,
        }
    }

    /// Get a bar by ID.
    #[must_use]
    pub fn bar(&self, id: BarId) -> Option<&Bar> {
        self.bars.iter().find(|b| b.id == id)
    }

    /// Find the topmost bar at the given canvas coordinates.
    #[must_use]
    pub fn bar_at(&self, x: f32, y: f32) -> Option<&Bar> {
        self.bars.iter().rev().find(|b| b.contains_point(x, y))
    }

    /// Get currently selected bars, in selection order.
    pub fn selected_bars(&self) -> impl Iterator<Item = &Bar> {
        self.selected_bar_ids.iter().filter_map(|id| self.bar(*id))
    }

    /// Get the unit bar, if one is set.
    #[must_use]
    pub fn unit_bar(&self) -> Option<&Bar> {
        self.unit_bar_id.and_then(|id| self.bar(id))
    }

    /// Check the unit-bar, size and selection invariants.
    ///
    /// # Errors
    ///
    /// Returns the first [`InvariantViolation`] found.
    pub fn validate(&self) -> Result<(), InvariantViolation> {
        let units = self.bars.iter().filter(|b| b.is_unit_bar).count();
        if units > 1 {
            return Err(InvariantViolation::MultipleUnitBars(units));
        }
        if let Some(unit_id) = self.unit_bar_id {
            if self.bar(unit_id).is_none() {
                return Err(InvariantViolation::DanglingUnitBar(unit_id.to_string()));
            }
        }
        for bar in &self.bars {
            if bar.width <= 0.0 || bar.height <= 0.0 {
                return Err(InvariantViolation::NonPositiveSize(bar.id.to_string()));
            }
            if bar.is_unit_bar != (self.unit_bar_id == Some(bar.id)) {
                return Err(InvariantViolation::UnitFlagMismatch(bar.id.to_string()));
            }
            if bar.is_selected != self.selected_bar_ids.contains(&bar.id) {
                return Err(InvariantViolation::SelectionMismatch(bar.id.to_string()));
            }
        }
        if let Some(stray) = self
            .selected_bar_ids
            .iter()
            .find(|id| self.bar(**id).is_none())
        {
            return Err(InvariantViolation::SelectionMismatch(stray.to_string()));
        }
        Ok(())
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;

    #[test]
    fn test_bar_at_prefers_topmost() {
        let mut state = AppState::new();
        let lower = Bar::new(Rect::new(0.0, 0.0, 100.0, 50.0), "#111111");
        let upper = Bar::new(Rect::new(50.0, 0.0, 100.0, 50.0), "#222222");
        let upper_id = upper.id;
        state.bars.push(lower);
        state.bars.push(upper);

        assert_eq!(state.bar_at(75.0, 25.0).map(|b| b.id), Some(upper_id));
        assert!(state.bar_at(500.0, 500.0).is_none());
    }

    #[test]
    fn test_validate_detects_multiple_unit_bars() {
        let mut state = AppState::new();
        for _ in 0..2 {
            let mut bar = Bar::new(Rect::new(0.0, 0.0, 10.0, 10.0), "#000");
            bar.is_unit_bar = true;
            state.bars.push(bar);
        }
        assert_eq!(
            state.validate(),
            Err(InvariantViolation::MultipleUnitBars(2))
        );
    }

    #[test]
    fn test_validate_detects_selection_mismatch() {
        let mut state = AppState::new();
        let mut bar = Bar::new(Rect::new(0.0, 0.0, 10.0, 10.0), "#000");
        bar.is_selected = true;
        state.bars.push(bar);
        assert!(matches!(
            state.validate(),
            Err(InvariantViolation::SelectionMismatch(_))
        ));
    }

    #[test]
    fn test_settings_patch_merges_shallowly() {
        let mut settings = Settings::default();
        let patch = SettingsPatch {
            snap_to_grid: Some(true),
            grid_size: Some(-1.0),
            ..SettingsPatch::default()
        };
        patch.apply_to(&mut settings);
        assert!(settings.snap_to_grid);
        assert!((settings.grid_size - 10.0).abs() < f32::EPSILON);
        assert!(settings.show_labels);
    }

    #[test]
    fn test_state_serializes_persisted_shape() {
        let json = serde_json::to_value(AppState::new()).expect("serialize");
        assert_eq!(json["version"], 1);
        assert_eq!(json["currentTool"], "bar");
        assert!(json["selectedBarIds"].as_array().is_some());
        assert!(json.get("unitBarId").is_none());
        assert_eq!(json["settings"]["gridSize"], 10.0);
    }

    #[test]
    fn test_tool_from_name() {
        assert_eq!(Tool::from_name("split"), Some(Tool::Split));
        assert_eq!(Tool::from_name("erase"), None);
    }
}

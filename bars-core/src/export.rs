//! Export and print boundary.
//!
//! The core only prepares an [`ExportScene`]; encoding it as SVG, PNG or a
//! paginated document is left to an [`Exporter`] implementation.

use serde::{Deserialize, Serialize};

use crate::bar::Bar;
use crate::error::ExportError;
use crate::geometry::Rect;
use crate::state::{AppState, Tool};

/// Output format requested from an exporter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Vector image (SVG).
    Vector,
    /// Raster image (PNG).
    Raster,
    /// Paginated document (PDF or a print job).
    Document,
}

impl ExportFormat {
    /// Format implied by a toolbar tool, if it is an output tool.
    #[must_use]
    pub const fn for_tool(tool: Tool) -> Option<Self> {
        match tool {
            Tool::Export => Some(Self::Vector),
            Tool::Print => Some(Self::Document),
            _ => None,
        }
    }
}

/// Page orientation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Taller than wide.
    #[default]
    Portrait,
    /// Wider than tall.
    Landscape,
}

/// Paper size for documents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaperSize {
    /// ISO A4.
    #[default]
    A4,
    /// US Letter.
    Letter,
    /// US Legal.
    Legal,
}

/// Free-form export options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportOptions {
    /// Document title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Document author.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Page orientation.
    #[serde(default)]
    pub orientation: Orientation,
    /// Paper size.
    #[serde(default)]
    pub paper_size: PaperSize,
}

/// The visual scene handed to an exporter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportScene {
    /// Bars in drawing order.
    pub bars: Vec<Bar>,
    /// Whether labels are drawn.
    pub show_labels: bool,
    /// Bounding box of all bars, `None` for an empty scene.
    pub bounds: Option<Rect>,
}

impl ExportScene {
    /// Capture the drawable part of `state`.
    #[must_use]
    pub fn from_state(state: &AppState) -> Self {
        let bounds = state
            .bars
            .iter()
            .map(Bar::rect)
            .reduce(|acc, rect| acc.union(&rect));
        Self {
            bars: state.bars.clone(),
            show_labels: state.settings.show_labels,
            bounds,
        }
    }

    /// Serialize the scene to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Produces files or print jobs from a scene.
pub trait Exporter {
    /// Encode `scene` in `format`.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Unsupported`] for formats the exporter cannot
    /// produce, or [`ExportError::Backend`] when encoding fails.
    fn export(
        &self,
        scene: &ExportScene,
        format: ExportFormat,
        options: &ExportOptions,
    ) -> Result<Vec<u8>, ExportError>;
}

/// Export the current state through `exporter`.
///
/// # Errors
///
/// Propagates the exporter's error.
pub fn export_state(
    exporter: &dyn Exporter,
    state: &AppState,
    format: ExportFormat,
    options: &ExportOptions,
) -> Result<Vec<u8>, ExportError> {
    let scene = ExportScene::from_state(state);
    tracing::debug!(?format, bars = scene.bars.len(), "Exporting scene");
    exporter.export(&scene, format, options)
}

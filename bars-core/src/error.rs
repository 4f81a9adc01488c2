//! Error types for fraction bar operations.
//!
//! Referencing a missing bar, an untracked pointer, or undoing with an empty
//! log are no-ops, not errors. The types here cover the remaining cases:
//! malformed input at the JSON boundary, storage failures, and broken state
//! invariants.

use thiserror::Error;

/// Result type for fraction bar operations.
pub type BarsResult<T> = Result<T, BarsError>;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur in fraction bar operations.
#[derive(Debug, Error)]
pub enum BarsError {
    /// A command arrived with a `type` this build does not know.
    ///
    /// This is a programming error on the sending side, distinct from a
    /// well-formed command that simply refers to a missing bar.
    #[error("Unknown command type: {0}")]
    UnknownCommand(String),

    /// Command or state serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Persistence failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// A state invariant does not hold.
    #[error("Invariant violated: {0}")]
    Invariant(#[from] InvariantViolation),
}

/// Errors that can occur while saving or loading a snapshot.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred during persistence.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// The storage backend rejected the request.
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// A broken [`AppState`](crate::AppState) invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    /// More than one bar carries `is_unit_bar`.
    #[error("{0} bars are marked as the unit bar")]
    MultipleUnitBars(usize),
    /// `unit_bar_id` names a bar that is not in the collection.
    #[error("Unit bar {0} is not in the bar list")]
    DanglingUnitBar(String),
    /// `unit_bar_id` and the bars' `is_unit_bar` flags disagree.
    #[error("Unit bar flag on {0} does not match unit_bar_id")]
    UnitFlagMismatch(String),
    /// A bar has a zero or negative width or height.
    #[error("Bar {0} has a non-positive size")]
    NonPositiveSize(String),
    /// `selected_bar_ids` and the bars' `is_selected` flags disagree.
    #[error("Selection of bar {0} is inconsistent")]
    SelectionMismatch(String),
}

/// Errors that can occur while exporting or printing a scene.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The exporter does not support the requested format.
    #[error("Unsupported export format: {0}")]
    Unsupported(String),
    /// The export backend failed.
    #[error("Export failed: {0}")]
    Backend(String),
}

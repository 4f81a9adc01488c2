//! Snapshot storage.
//!
//! A [`Storage`] backend saves and loads one [`PersistedState`] per session.
//! [`FileStorage`] writes pretty-printed JSON files into a data directory;
//! [`MemoryStorage`] keeps the last snapshot in memory for tests and hosts
//! without a filesystem.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::action::current_timestamp_ms;
use crate::error::{StorageError, StorageResult};
use crate::state::AppState;

/// Default session identifier.
pub const DEFAULT_SESSION: &str = "default";

/// The shape written to storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    /// When the snapshot was taken (Unix milliseconds).
    pub saved_at: u64,
    /// The snapshot itself.
    pub state: AppState,
}

impl PersistedState {
    /// Wrap `state` with the current time.
    #[must_use]
    pub fn now(state: AppState) -> Self {
        Self {
            saved_at: current_timestamp_ms(),
            state,
        }
    }

    /// Parse a persisted document.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Serialization`] if the JSON does not match.
    pub fn from_json(json: &str) -> StorageResult<Self> {
        serde_json::from_str(json).map_err(|e| StorageError::Serialization(e.to_string()))
    }

    /// Serialize as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Serialization`] if serialization fails.
    pub fn to_json_pretty(&self) -> StorageResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| StorageError::Serialization(e.to_string()))
    }
}

/// Saves and loads the serialized snapshot of one session.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Persist `snapshot`, replacing any earlier one.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the backend cannot write.
    async fn save(&self, snapshot: &PersistedState) -> StorageResult<()>;

    /// Load the last saved snapshot, or `None` if nothing was saved yet.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the backend cannot read or the stored
    /// document is malformed.
    async fn load(&self) -> StorageResult<Option<PersistedState>>;
}

/// JSON file storage: `<data_dir>/<session>.json`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    /// Storage for `session` under `data_dir`. The directory is created if
    /// it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the directory cannot be created.
    pub fn new(data_dir: impl AsRef<Path>, session: &str) -> StorageResult<Self> {
        let data_dir = data_dir.as_ref();
        std::fs::create_dir_all(data_dir)?;
        Ok(Self {
            path: data_dir.join(format!("{}.json", sanitize_filename(session))),
        })
    }

    /// Path of the session file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the session file. Returns `false` if there was nothing to
    /// remove.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the file exists but cannot be removed.
    pub fn delete(&self) -> StorageResult<bool> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl Storage for FileStorage {
    async fn save(&self, snapshot: &PersistedState) -> StorageResult<()> {
        let json = snapshot.to_json_pretty()?;
        std::fs::write(&self.path, json)?;
        tracing::debug!(path = %self.path.display(), bars = snapshot.state.bars.len(), "Saved snapshot");
        Ok(())
    }

    async fn load(&self) -> StorageResult<Option<PersistedState>> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        PersistedState::from_json(&contents).map(Some)
    }
}

/// In-memory storage.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    inner: Mutex<MemoryInner>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    snapshot: Option<PersistedState>,
    saves: usize,
    fail_saves: bool,
}

impl MemoryStorage {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `snapshot`.
    #[must_use]
    pub fn with_snapshot(snapshot: PersistedState) -> Self {
        Self {
            inner: Mutex::new(MemoryInner {
                snapshot: Some(snapshot),
                ..MemoryInner::default()
            }),
        }
    }

    /// Number of successful saves.
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.lock().saves
    }

    /// The last saved snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Option<PersistedState> {
        self.lock().snapshot.clone()
    }

    /// Make every following save fail with [`StorageError::Backend`].
    pub fn set_failing(&self, failing: bool) {
        self.lock().fail_saves = failing;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn save(&self, snapshot: &PersistedState) -> StorageResult<()> {
        let mut inner = self.lock();
        if inner.fail_saves {
            return Err(StorageError::Backend("memory storage is failing".into()));
        }
        inner.snapshot = Some(snapshot.clone());
        inner.saves += 1;
        Ok(())
    }

    async fn load(&self) -> StorageResult<Option<PersistedState>> {
        Ok(self.lock().snapshot.clone())
    }
}

/// Replace characters that are unsafe in file names.
fn sanitize_filename(session: &str) -> String {
    let name: String = session
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if name.is_empty() {
        DEFAULT_SESSION.to_string()
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{Action, Command};
    use crate::bar::BarDraft;
    use crate::reducer::reduce;

    fn sample_state() -> AppState {
        reduce(
            &AppState::new(),
            &Action::new(Command::AddBar(BarDraft::new().labeled("Whole")), 0),
        )
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("lesson-1_a"), "lesson-1_a");
        assert_eq!(sanitize_filename("../etc/passwd"), "___etc_passwd");
        assert_eq!(sanitize_filename(""), DEFAULT_SESSION);
    }

    #[test]
    fn test_persisted_shape_is_camel_case() {
        let doc = PersistedState {
            saved_at: 42,
            state: sample_state(),
        };
        let value = serde_json::to_value(&doc).expect("serialize");
        assert_eq!(value["savedAt"], 42);
        assert!(value["state"]["bars"].is_array());
        assert!(value["state"]["selectedBarIds"].is_array());
        assert_eq!(value["state"]["currentTool"], "bar");
    }

    #[test]
    fn test_malformed_document_is_serialization_error() {
        let err = PersistedState::from_json("{\"savedAt\": 1}");
        assert!(matches!(err, Err(StorageError::Serialization(_))));
    }

    #[tokio::test]
    async fn test_file_storage_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = FileStorage::new(dir.path(), "lesson").expect("storage");
        assert!(storage.load().await.expect("load").is_none());

        let doc = PersistedState::now(sample_state());
        storage.save(&doc).await.expect("save");
        assert!(storage.path().ends_with("lesson.json"));

        let loaded = storage.load().await.expect("load").expect("present");
        assert_eq!(loaded, doc);

        assert!(storage.delete().expect("delete"));
        assert!(!storage.delete().expect("delete again"));
    }

    #[tokio::test]
    async fn test_memory_storage_counts_and_fails() {
        let storage = MemoryStorage::new();
        let doc = PersistedState::now(sample_state());
        storage.save(&doc).await.expect("save");
        assert_eq!(storage.save_count(), 1);

        storage.set_failing(true);
        assert!(matches!(
            storage.save(&doc).await,
            Err(StorageError::Backend(_))
        ));
        assert_eq!(storage.save_count(), 1);
        assert_eq!(storage.load().await.expect("load"), Some(doc));
    }
}

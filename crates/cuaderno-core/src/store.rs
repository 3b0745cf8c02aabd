//! Local persistence: one serialized dataset document under a fixed key.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::clock::Clock;
use crate::error::PersistenceError;
use crate::model::Dataset;
use crate::normalize::{has_valid_shape, normalize};

/// Key under which the dataset document is stored unless configured otherwise.
pub const DEFAULT_STORAGE_KEY: &str = "crush_book_v1";

/// A durable key-value slot holding the serialized dataset.
pub trait DocumentStore: Send + Sync {
    /// Read the stored document, `None` if nothing was ever written.
    fn read(&self) -> Result<Option<String>, PersistenceError>;

    /// Replace the stored document.
    fn write(&self, document: &str) -> Result<(), PersistenceError>;

    /// Delete the stored document. Deleting a missing document succeeds.
    fn remove(&self) -> Result<(), PersistenceError>;
}

/// Store backed by `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl AsRef<Path>, key: &str) -> Self {
        Self {
            path: dir.as_ref().join(format!("{}.json", key)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DocumentStore for FileStore {
    fn read(&self) -> Result<Option<String>, PersistenceError> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Write to a temporary sibling, fsync, then rename over the document.
    fn write(&self, document: &str) -> Result<(), PersistenceError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }

        let tmp_path = self.path.with_extension("json.tmp");
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(document.as_bytes())?;
        file.sync_all()?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    fn remove(&self) -> Result<(), PersistenceError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory store for tests and ephemeral sessions.
///
/// `failing()` builds a store whose writes always fail, to exercise the
/// swallowed storage-failure path.
#[derive(Debug, Default)]
pub struct MemoryStore {
    document: Mutex<Option<String>>,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(document: impl Into<String>) -> Self {
        let store = Self::default();
        *store.document.lock().unwrap_or_else(|e| e.into_inner()) = Some(document.into());
        store
    }

    pub fn failing() -> Self {
        let store = Self::default();
        store.set_fail_writes(true);
        store
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// The currently stored document.
    pub fn document(&self) -> Option<String> {
        self.document.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl DocumentStore for MemoryStore {
    fn read(&self) -> Result<Option<String>, PersistenceError> {
        Ok(self.document())
    }

    fn write(&self, document: &str) -> Result<(), PersistenceError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PersistenceError::Io("storage quota exceeded".to_string()));
        }
        *self.document.lock().unwrap_or_else(|e| e.into_inner()) = Some(document.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn remove(&self) -> Result<(), PersistenceError> {
        *self.document.lock().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }
}

/// Load the local dataset. Unreadable, unparseable, or structurally invalid
/// documents are treated as absent.
pub fn load_local(store: &dyn DocumentStore, clock: &dyn Clock) -> Option<Dataset> {
    let text = match store.read() {
        Ok(Some(text)) => text,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!("Failed to read local document: {}", e);
            return None;
        }
    };

    let raw: serde_json::Value = match serde_json::from_str(&text) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!("Local document is not valid JSON, ignoring it: {}", e);
            return None;
        }
    };

    if !has_valid_shape(&raw) {
        tracing::warn!("Local document has no categories array, ignoring it");
        return None;
    }

    Some(normalize(&raw, clock))
}

/// Write the dataset to the local store. Failures are logged and reported
/// as `false`, never as an error.
pub fn save_local(store: &dyn DocumentStore, dataset: &Dataset) -> bool {
    let result = serde_json::to_string(dataset)
        .map_err(PersistenceError::from)
        .and_then(|document| store.write(&document));

    match result {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("Failed to save local document: {}", e);
            false
        }
    }
}

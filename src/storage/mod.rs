//! JSON file-backed registry of live records.
//!
//! The registry holds every record in memory, keyed by `"{Kind}.{id}"`, and
//! mirrors the whole map to one JSON file on [`FileStorage::save`]. Loading
//! happens once through [`FileStorage::reload`].

mod file;

use std::path::PathBuf;

use indexmap::IndexMap;
use thiserror::Error;

use crate::models::{storage_key, ModelKind, Record};

pub use file::DEFAULT_FILE_PATH;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a JSON object at the top level")]
    NotAnObject,
}

/// The live record registry.
///
/// Owns every record; callers reach records only through it. There is no
/// locking: one registry serves one single-threaded session.
pub struct FileStorage {
    path: PathBuf,
    objects: IndexMap<String, Record>,
}

impl FileStorage {
    /// Creates an empty registry bound to `path` without touching the disk.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            objects: IndexMap::new(),
        }
    }

    /// Creates a registry bound to `path` and loads whatever the file holds.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let mut storage = Self::new(path);
        storage.reload();
        storage
    }

    /// The live map of `"Kind.id"` to record.
    pub fn all(&self) -> &IndexMap<String, Record> {
        &self.objects
    }

    /// Records of one kind, in registration order.
    pub fn all_of(&self, kind: ModelKind) -> impl Iterator<Item = &Record> + '_ {
        self.objects.values().filter(move |r| r.kind() == kind)
    }

    pub fn count(&self, kind: ModelKind) -> usize {
        self.all_of(kind).count()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn get(&self, kind: ModelKind, id: &str) -> Option<&Record> {
        self.objects.get(&storage_key(kind, id))
    }

    pub fn get_mut(&mut self, kind: ModelKind, id: &str) -> Option<&mut Record> {
        self.objects.get_mut(&storage_key(kind, id))
    }

    /// Inserts or overwrites the entry keyed by the record's kind and id.
    pub fn new_record(&mut self, record: Record) {
        tracing::debug!(key = %record.key(), "registering record");
        self.objects.insert(record.key(), record);
    }

    /// Removes a record, handing ownership back to the caller.
    ///
    /// Order of the remaining entries is preserved.
    pub fn remove(&mut self, kind: ModelKind, id: &str) -> Option<Record> {
        self.objects.shift_remove(&storage_key(kind, id))
    }

    /// Writes the whole registry to the backing file.
    ///
    /// Failures are logged and swallowed: the session keeps going even when
    /// the disk does not cooperate. Use [`FileStorage::try_save`] to observe them.
    pub fn save(&self) {
        if let Err(e) = self.try_save() {
            tracing::warn!(path = %self.path.display(), "failed to persist registry: {}", e);
        }
    }

    /// Writes the whole registry to the backing file, reporting failures.
    pub fn try_save(&self) -> Result<(), StorageError> {
        file::write_objects(&self.path, &self.objects)?;
        tracing::debug!(path = %self.path.display(), count = self.objects.len(), "registry persisted");
        Ok(())
    }

    /// Populates the registry from the backing file.
    ///
    /// A missing or malformed file leaves the registry as it was. Entries
    /// whose kind is not recognized, or that cannot be rebuilt, are skipped.
    pub fn reload(&mut self) {
        let entries = match file::read_entries(&self.path) {
            Ok(Some(entries)) => entries,
            Ok(None) => {
                tracing::debug!(path = %self.path.display(), "no backing file, starting empty");
                return;
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "ignoring unreadable backing file: {}", e);
                return;
            }
        };

        let mut loaded = 0;
        for (key, entry) in entries {
            match file::decode_entry(&key, &entry) {
                Ok(record) => {
                    self.objects.insert(record.key(), record);
                    loaded += 1;
                }
                Err(e) => tracing::warn!(key = %key, "skipping persisted entry: {}", e),
            }
        }
        tracing::debug!(path = %self.path.display(), loaded, "registry reloaded");
    }
}

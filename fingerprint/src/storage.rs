//! Persistent client-side key/value storage.
//!
//! Interaction counters, the session start time and the session id live
//! here under fixed string keys. Implementations must be safe to share
//! between threads; callers treat every failure as "storage unavailable"
//! and fall back to in-memory defaults.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, warn};

use crate::FingerprintError;

/// String key/value storage with browser local-storage semantics.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, FingerprintError>;

    fn set(&self, key: &str, value: &str) -> Result<(), FingerprintError>;

    fn remove(&self, key: &str) -> Result<(), FingerprintError>;

    /// Drop every key. Counters restart and a new session id is minted on
    /// the next load.
    fn clear(&self) -> Result<(), FingerprintError>;
}

/// Read a non-negative integer, treating absent, unparsable, zero or
/// unreadable values as `default`.
pub fn read_u64(store: &dyn KeyValueStore, key: &str, default: u64) -> u64 {
    match store.get(key) {
        Ok(Some(raw)) => match raw.trim().parse::<u64>() {
            Ok(0) | Err(_) => default,
            Ok(v) => v,
        },
        Ok(None) => default,
        Err(e) => {
            debug!(key, "storage read failed, using default: {e}");
            default
        }
    }
}

/// A JSON file holding a flat string map.
///
/// The whole map is rewritten on every mutation through a temporary file
/// and a rename, so a crash never leaves a half-written store behind.
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open (or lazily create) the store at `path`.
    ///
    /// A file that exists but does not parse is treated as empty and will be
    /// overwritten on the next write.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, FingerprintError> {
        let path = path.as_ref().to_path_buf();
        let entries = match std::fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<BTreeMap<String, String>>(&contents) {
                Ok(map) => map,
                Err(e) => {
                    warn!(path = %path.display(), "discarding unreadable store: {e}");
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, String>>, FingerprintError> {
        self.entries
            .lock()
            .map_err(|_| FingerprintError::StorageUnavailable("store lock poisoned".into()))
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), FingerprintError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| FingerprintError::Serialization(e.to_string()))?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Apply `change` to a copy, write the copy, and only then make it
    /// visible. A failed write leaves memory matching the file.
    fn update(
        &self,
        change: impl FnOnce(&mut BTreeMap<String, String>) -> bool,
    ) -> Result<(), FingerprintError> {
        let mut entries = self.lock()?;
        let mut next = entries.clone();
        if change(&mut next) {
            self.persist(&next)?;
            *entries = next;
        }
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, FingerprintError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), FingerprintError> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
            true
        })
    }

    fn remove(&self, key: &str) -> Result<(), FingerprintError> {
        self.update(|entries| entries.remove(key).is_some())
    }

    fn clear(&self) -> Result<(), FingerprintError> {
        self.update(|entries| {
            entries.clear();
            true
        })
    }
}

//! Nullable storage: in-memory key/value store with failure injection.

use fraudgate_fingerprint::{FingerprintError, KeyValueStore};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// An in-memory [`KeyValueStore`].
///
/// [`NullStorage::set_available`] simulates disabled storage, quota errors
/// or private browsing: while unavailable every call fails.
pub struct NullStorage {
    entries: Mutex<HashMap<String, String>>,
    available: AtomicBool,
}

impl NullStorage {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            available: AtomicBool::new(true),
        }
    }

    /// A store that rejects every operation.
    pub fn unavailable() -> Self {
        let store = Self::new();
        store.set_available(false);
        store
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Peek at a value regardless of availability.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    fn check(&self) -> Result<(), FingerprintError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(FingerprintError::StorageUnavailable(
                "null storage disabled".into(),
            ))
        }
    }
}

impl Default for NullStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for NullStorage {
    fn get(&self, key: &str) -> Result<Option<String>, FingerprintError> {
        self.check()?;
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), FingerprintError> {
        self.check()?;
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), FingerprintError> {
        self.check()?;
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<(), FingerprintError> {
        self.check()?;
        self.entries.lock().unwrap().clear();
        Ok(())
    }
}

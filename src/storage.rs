//! Session-scoped key-value storage for persisted identity.
//!
//! SYSTEM CONTEXT
//! ==============
//! The manager persists the identity record, its role, and the chosen
//! network so a restart can restore the session without re-running the login
//! provider flow. Storage has no failure mode visible to the manager; write
//! failures in the file backend are logged and dropped.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::warn;

use crate::error::SessionError;

/// Serialized identity record.
pub const USER_KEY: &str = "user";
/// Role string of the persisted identity.
pub const USER_ROLE_KEY: &str = "userRole";
/// Network chosen for the last authorization redirect.
pub const NETWORK_KEY: &str = "network";

/// Key-value storage scoped to one browsing/app session.
pub trait SessionStorage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
    /// Remove every key.
    fn clear(&self);
}

// =============================================================================
// MEMORY
// =============================================================================

/// Process-local storage. Contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries().insert(key.to_owned(), value.to_owned());
    }

    fn remove(&self, key: &str) {
        self.entries().remove(key);
    }

    fn clear(&self) {
        self.entries().clear();
    }
}

// =============================================================================
// FILE
// =============================================================================

/// Storage backed by a single JSON object on disk, rewritten on every change.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl FileStorage {
    /// Open `path`, loading existing entries. A missing file starts empty.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Storage`] if the file exists but cannot be read
    /// or does not hold a JSON object of strings.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SessionError> {
        let path = path.as_ref().to_path_buf();
        let entries = match std::fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => HashMap::new(),
            Ok(raw) => serde_json::from_str(&raw)
                .map_err(|e| SessionError::Storage(format!("{}: {e}", path.display())))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(SessionError::Storage(format!("{}: {e}", path.display()))),
        };
        Ok(Self { path, entries: Mutex::new(entries) })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn with_entries<R>(&self, f: impl FnOnce(&mut HashMap<String, String>) -> R) -> R {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        f(&mut entries)
    }

    fn flush(&self, entries: &HashMap<String, String>) {
        let raw = match serde_json::to_string_pretty(entries) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "session storage encode failed");
                return;
            }
        };
        if let Err(e) = std::fs::write(&self.path, raw) {
            warn!(error = %e, path = %self.path.display(), "session storage write failed");
        }
    }
}

impl SessionStorage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.with_entries(|entries| entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) {
        self.with_entries(|entries| {
            entries.insert(key.to_owned(), value.to_owned());
            self.flush(entries);
        });
    }

    fn remove(&self, key: &str) {
        self.with_entries(|entries| {
            if entries.remove(key).is_some() {
                self.flush(entries);
            }
        });
    }

    fn clear(&self) {
        self.with_entries(|entries| {
            entries.clear();
            self.flush(entries);
        });
    }
}

#[cfg(test)]
#[path = "storage_test.rs"]
mod tests;

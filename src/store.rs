//! Durable storage for the identity cache.
//!
//! [`SessionStore`] replaces ambient browser-style local storage with an
//! explicit, injectable interface.  Two implementations are provided: an
//! in-memory store for tests and embedding, and a JSON file store.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde_json::{from_reader, to_writer_pretty};

use crate::error::{Error, Result};
use crate::types::PersistedSession;

/// Persistence for the `token`, `user` and `accounts` keys.
pub trait SessionStore: Send + Sync {
    /// Returns the stored session, or `None` if nothing was ever saved.
    fn load(&self) -> Result<Option<PersistedSession>>;

    /// Replaces the stored session.
    fn save(&self, session: &PersistedSession) -> Result<()>;

    /// Removes everything the store holds.
    fn clear(&self) -> Result<()>;
}

/// A store that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    session: Mutex<Option<PersistedSession>>,
}

impl MemorySessionStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `session`.
    pub fn with_session(session: PersistedSession) -> Self {
        Self {
            session: Mutex::new(Some(session)),
        }
    }

    /// Returns a copy of what is currently stored.
    pub fn snapshot(&self) -> Option<PersistedSession> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<PersistedSession>> {
        // A poisoned lock still holds a complete value; keep using it.
        self.session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<PersistedSession>> {
        Ok(self.lock().clone())
    }

    fn save(&self, session: &PersistedSession) -> Result<()> {
        *self.lock() = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.lock() = None;
        Ok(())
    }
}

/// A store backed by a single JSON file.
///
/// Writes go to a sibling temporary file that is renamed over the target, so
/// a crash never leaves a half-written session behind.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    /// Creates a store that reads and writes `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The file this store uses.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<PersistedSession>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(Error::io("failed to open session file", err)),
        };
        let session = from_reader(BufReader::new(file)).map_err(|err| {
            Error::serialization("failed to parse session file", Some(Box::new(err)))
        })?;
        Ok(Some(session))
    }

    fn save(&self, session: &PersistedSession) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|err| Error::io("failed to create session directory", err))?;
        }
        let temp = self.temp_path();
        let file =
            File::create(&temp).map_err(|err| Error::io("failed to create session file", err))?;
        let mut writer = BufWriter::new(file);
        to_writer_pretty(&mut writer, session).map_err(|err| {
            Error::serialization("failed to serialize session", Some(Box::new(err)))
        })?;
        writer
            .flush()
            .map_err(|err| Error::io("failed to write session file", err))?;
        fs::rename(&temp, &self.path)
            .map_err(|err| Error::io("failed to replace session file", err))
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(Error::io("failed to remove session file", err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Account;

    fn sample() -> PersistedSession {
        let a = Account::new("a@x", "A", "tok-a");
        let b = Account::new("b@x", "B", "tok-b");
        PersistedSession::new(vec![a, b.clone()], Some(b))
    }

    #[test]
    fn memory_store_round_trip() {
        let store = MemorySessionStore::new();
        assert_eq!(store.load().unwrap(), None);
        store.save(&sample()).unwrap();
        assert_eq!(store.load().unwrap(), Some(sample()));
        store.clear().unwrap();
        assert_eq!(store.snapshot(), None);
    }

    #[test]
    fn file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("nested").join("session.json"));
        assert_eq!(store.load().unwrap(), None);

        store.save(&sample()).unwrap();
        assert_eq!(store.load().unwrap(), Some(sample()));
        assert!(!store.temp_path().exists());

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw["token"], "tok-b");
        assert_eq!(raw["user"]["email"], "b@x");
        assert_eq!(raw["accounts"].as_array().unwrap().len(), 2);

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
        store.clear().unwrap();
    }

    #[test]
    fn file_store_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "not json").unwrap();
        let store = FileSessionStore::new(path);
        assert!(matches!(store.load(), Err(Error::Serialization { .. })));
    }
}

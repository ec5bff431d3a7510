//! JSON-file backed store for native clients.

use crate::error::StorageError;
use crate::storage::KeyValueStore;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Stores all entries in one JSON object on disk, rewritten on every change.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open (or lazily create) the store at `path`.
    ///
    /// A missing file is an empty store; an unreadable or corrupt file is an error.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => BTreeMap::new(),
            Ok(text) => serde_json::from_str(&text)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        tracing::debug!("Opened key-value store at {} ({} entries)", path.display(), entries.len());
        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.write();
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.write();
        if entries.remove(key).is_some() {
            self.flush(&entries)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::TOKEN_KEY;

    fn scratch_path(name: &str) -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!(
            "cex-sdk-{}-{}-{}.json",
            name,
            std::process::id(),
            nanos
        ))
    }

    #[test]
    fn test_missing_file_is_empty_store() {
        let path = scratch_path("missing");
        let store = FileStore::open(&path).unwrap();
        assert!(store.get(TOKEN_KEY).is_none());
        assert!(!path.exists());
    }

    #[test]
    fn test_values_survive_reopen() {
        let path = scratch_path("reopen");
        {
            let store = FileStore::open(&path).unwrap();
            store.set(TOKEN_KEY, "jwt-1").unwrap();
        }
        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get(TOKEN_KEY).as_deref(), Some("jwt-1"));

        reopened.remove(TOKEN_KEY).unwrap();
        let again = FileStore::open(&path).unwrap();
        assert!(again.get(TOKEN_KEY).is_none());

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let path = scratch_path("corrupt");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            FileStore::open(&path),
            Err(StorageError::Serde(_))
        ));
        std::fs::remove_file(&path).ok();
    }
}

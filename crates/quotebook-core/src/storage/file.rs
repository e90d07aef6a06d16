//! File-backed key-value store
//!
//! The whole store is one JSON object of string entries. Every mutation
//! rewrites the file with an atomic write (temp file, sync, rename) so the
//! file is never left half-written.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::error::{StorageError, StorageResult};
use super::kv::KeyValueStore;

/// Key-value store persisted as a JSON object on disk
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    /// Open a store, loading existing entries if the file exists
    pub fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();
        let entries = if path.exists() {
            let content = fs::read_to_string(&path).map_err(|source| StorageError::ReadError {
                path: path.clone(),
                source,
            })?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&content).map_err(|e| StorageError::InvalidFormat {
                    path: path.clone(),
                    details: e.to_string(),
                })?
            }
        } else {
            BTreeMap::new()
        };

        debug!("Opened store {:?} with {} entries", path, entries.len());
        Ok(Self { path, entries })
    }

    /// Location of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> StorageResult<()> {
        let json = serde_json::to_vec_pretty(&self.entries).map_err(|e| {
            StorageError::InvalidFormat {
                path: self.path.clone(),
                details: e.to_string(),
            }
        })?;
        atomic_write(&self.path, &json)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> StorageResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn remove(&mut self, key: &str) -> StorageResult<()> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }

    fn clear(&mut self) -> StorageResult<()> {
        self.entries.clear();
        self.flush()
    }
}

/// Write data to a file atomically
///
/// 1. Write to a temporary file in the same directory
/// 2. Sync the file to disk
/// 3. Rename the temp file to the target path
fn atomic_write(path: &Path, data: &[u8]) -> StorageResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| StorageError::from_io(e, parent.to_path_buf()))?;
    }

    let temp_path = path.with_extension("tmp");

    let mut file =
        File::create(&temp_path).map_err(|e| StorageError::from_io(e, temp_path.clone()))?;
    file.write_all(data)
        .map_err(|e| StorageError::from_io(e, temp_path.clone()))?;
    file.sync_all()
        .map_err(|e| StorageError::from_io(e, temp_path.clone()))?;

    fs::rename(&temp_path, path).map_err(|source| StorageError::AtomicWriteFailed {
        from: temp_path.clone(),
        to: path.to_path_buf(),
        source,
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::open(temp_dir.path().join("store.json")).unwrap();
        assert!(store.get("quotes").is_none());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_entries_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.json");

        {
            let mut store = FileStore::open(&path).unwrap();
            store.set("deviceId", "device-1234abcd").unwrap();
            store.set("lastFilter", "Life").unwrap();
        }

        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.get("deviceId").as_deref(), Some("device-1234abcd"));
        assert_eq!(store.get("lastFilter").as_deref(), Some("Life"));
    }

    #[test]
    fn test_no_temp_file_left_behind() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.json");

        let mut store = FileStore::open(&path).unwrap();
        store.set("quotes", "[]").unwrap();

        assert!(path.exists());
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_creates_parent_directories() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("dir").join("store.json");

        let mut store = FileStore::open(&path).unwrap();
        store.set("k", "v").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_corrupt_file_is_invalid_format() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.json");
        fs::write(&path, "[1, 2, 3]").unwrap();

        let err = FileStore::open(&path).unwrap_err();
        assert!(matches!(err, StorageError::InvalidFormat { .. }));
    }

    #[test]
    fn test_remove_and_clear() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("session.json");

        let mut store = FileStore::open(&path).unwrap();
        store.set("lastQuote", "{}").unwrap();
        store.remove("lastQuote").unwrap();
        assert!(FileStore::open(&path).unwrap().get("lastQuote").is_none());

        store.set("lastQuote", "{}").unwrap();
        store.clear().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap().trim(), "{}");
    }
}

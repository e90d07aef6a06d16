//! Key-value store abstraction
//!
//! Everything the application persists (quote set, sync metadata, last
//! filter, last viewed quote) goes through a flat string-to-string store
//! with get/set semantics.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::error::StorageResult;

/// Flat string key-value storage
pub trait KeyValueStore: Send {
    /// Read a value
    fn get(&self, key: &str) -> Option<String>;

    /// Write a value, replacing any previous one
    fn set(&mut self, key: &str, value: &str) -> StorageResult<()>;

    /// Remove a value (no-op when absent)
    fn remove(&mut self, key: &str) -> StorageResult<()>;

    /// Remove every value
    fn clear(&mut self) -> StorageResult<()>;
}

/// In-memory store, used for tests and throwaway sessions
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> StorageResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StorageResult<()> {
        self.entries.remove(key);
        Ok(())
    }

    fn clear(&mut self) -> StorageResult<()> {
        self.entries.clear();
        Ok(())
    }
}

/// Read a JSON-encoded value
///
/// Returns `Ok(None)` when the key is absent.
pub fn read_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> serde_json::Result<Option<T>> {
    match store.get(key) {
        Some(raw) => serde_json::from_str(&raw).map(Some),
        None => Ok(None),
    }
}

/// Write a value as compact JSON
pub fn write_json<T: Serialize + ?Sized>(
    store: &mut dyn KeyValueStore,
    key: &str,
    value: &T,
) -> crate::error::Result<()> {
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw)?;
    Ok(())
}

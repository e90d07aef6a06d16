//! Storage layer
//!
//! Opaque key-value persistence behind the `KeyValueStore` trait.
//!
//! - **FileStore**: JSON object on disk, atomic rewrite on every change
//! - **MemoryStore**: in-process map for tests and throwaway sessions
//!
//! Two stores are used at runtime: a persistent one (`store.json`) for the
//! quote set and sync metadata, and a session one (`session.json`) for the
//! last viewed quote, cleared when the interactive session ends.

pub mod error;
pub mod file;
pub mod kv;

pub use error::{StorageError, StorageResult};
pub use file::FileStore;
pub use kv::{read_json, write_json, KeyValueStore, MemoryStore};

/// Key of the persisted quote set
pub const QUOTES_KEY: &str = "quotes";
/// Key of the last viewed quote (session store)
pub const LAST_QUOTE_KEY: &str = "lastQuote";
/// Key of the last selected category filter
pub const LAST_FILTER_KEY: &str = "lastFilter";
/// Key of the last successful sync time
pub const LAST_SYNC_KEY: &str = "lastSyncTimestamp";
/// Key of the stable device identifier
pub const DEVICE_ID_KEY: &str = "deviceId";

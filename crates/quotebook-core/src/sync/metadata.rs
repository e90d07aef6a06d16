//! Sync metadata persistence
//!
//! Stores the last successful sync time and the device identifier as
//! independent entries of the persistent key-value store.

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::info;
use uuid::Uuid;

use crate::error::Result;
use crate::storage::{KeyValueStore, DEVICE_ID_KEY, LAST_SYNC_KEY};

/// Process-wide sync state kept across sessions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncMetadata {
    /// ISO 8601 time of the last completed sync, if any
    pub last_sync_timestamp: Option<String>,
    /// Stable identifier of this installation
    pub device_id: String,
}

impl SyncMetadata {
    /// Load metadata, generating and persisting a device id on first use
    pub fn load_or_init(kv: &mut dyn KeyValueStore) -> Result<Self> {
        let device_id = match kv.get(DEVICE_ID_KEY) {
            Some(id) if !id.trim().is_empty() => id,
            _ => {
                let id = generate_device_id();
                kv.set(DEVICE_ID_KEY, &id)?;
                info!("Generated device id {}", id);
                id
            }
        };

        Ok(Self {
            last_sync_timestamp: kv.get(LAST_SYNC_KEY),
            device_id,
        })
    }

    /// Record a completed sync at `at`
    pub fn record_sync(&mut self, kv: &mut dyn KeyValueStore, at: DateTime<Utc>) -> Result<()> {
        let stamp = at.to_rfc3339_opts(SecondsFormat::Millis, true);
        kv.set(LAST_SYNC_KEY, &stamp)?;
        self.last_sync_timestamp = Some(stamp);
        Ok(())
    }

    /// Parsed last sync time
    pub fn last_sync(&self) -> Option<DateTime<Utc>> {
        self.last_sync_timestamp
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }
}

fn generate_device_id() -> String {
    format!("device-{}", &Uuid::new_v4().simple().to_string()[..8])
}

//! JSON snapshots of property stores.
//!
//! A [`StoreSnapshot`] is the persistable form of a store's contents: a
//! format version plus the list of entries, each carrying its kind. Only
//! serializable values can be captured; a live OBJECT payload makes the
//! capture fail with [`StoreError::IllegalValue`].
//!
//! On-disk format:
//! ```text
//! {
//!   "version": 1,
//!   "entries": [
//!     { "key": "db.port", "kind": "int", "value": 5432 },
//!     ...
//!   ]
//! }
//! ```

use std::fs;
use std::path::Path;

use propset_types::PropertyEntry;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::memory::MemoryPropertyStore;
use crate::traits::PropertyStore;
use crate::transfer::collect_entries;

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Serializable copy of a store's entries.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub version: u32,
    pub entries: Vec<PropertyEntry>,
}

impl StoreSnapshot {
    /// Capture every readable entry of `store`.
    pub fn capture<S: PropertyStore + ?Sized>(store: &S) -> StoreResult<Self> {
        let entries = collect_entries(store)?;
        for entry in &entries {
            entry
                .value
                .check_serializable()
                .map_err(|e| StoreError::illegal(&entry.key, e))?;
        }
        Ok(Self {
            version: SNAPSHOT_VERSION,
            entries,
        })
    }

    /// Rebuild a serializable memory store from the snapshot.
    pub fn restore(&self) -> StoreResult<MemoryPropertyStore> {
        let store = MemoryPropertyStore::serializable();
        for entry in &self.entries {
            store.set_typed(&entry.key, entry.value.clone())?;
        }
        Ok(store)
    }

    pub fn to_json(&self) -> StoreResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> StoreResult<Self> {
        let snapshot: Self = serde_json::from_str(json)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(StoreError::Serialization(format!(
                "unsupported snapshot version {} (expected {SNAPSHOT_VERSION})",
                snapshot.version
            )));
        }
        Ok(snapshot)
    }

    /// Write the snapshot to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> StoreResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_json()?)?;
        debug!(path = %path.display(), entries = self.entries.len(), "saved snapshot");
        Ok(())
    }

    pub fn load(path: &Path) -> StoreResult<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

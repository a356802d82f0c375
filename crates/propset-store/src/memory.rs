use std::collections::HashMap;
use std::sync::RwLock;

use propset_types::{Kind, PropertyEntry, Value};

use crate::error::{StoreError, StoreResult};
use crate::traits::PropertyStore;

/// In-memory, HashMap-based property store.
///
/// The reference backend. Entries live in a map behind a `RwLock`; every
/// write takes the lock exclusively, so readers never observe a half-applied
/// update. Values are cloned on read and write.
///
/// A store created with [`MemoryPropertyStore::serializable`] additionally
/// rejects OBJECT values that cannot be persisted, so its contents can
/// always be written out as a [`StoreSnapshot`](crate::StoreSnapshot).
pub struct MemoryPropertyStore {
    entries: RwLock<HashMap<String, Value>>,
    serializable: bool,
}

impl MemoryPropertyStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            serializable: false,
        }
    }

    /// Create a new empty store that only accepts persistable values.
    pub fn serializable() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            serializable: true,
        }
    }

    /// Create a store pre-populated with `entries`.
    ///
    /// Entries are applied in order through the normal write path, so kind
    /// stability and value constraints hold for them too.
    pub fn from_entries<I>(entries: I) -> StoreResult<Self>
    where
        I: IntoIterator<Item = PropertyEntry>,
    {
        let store = Self::new();
        for entry in entries {
            store.set_typed(&entry.key, entry.value)?;
        }
        Ok(store)
    }

    /// Returns `true` if the store rejects non-serializable objects.
    pub fn is_serializable(&self) -> bool {
        self.serializable
    }

    /// Number of stored keys.
    pub fn len(&self) -> StoreResult<usize> {
        let map = self.entries.read().map_err(StoreError::poisoned)?;
        Ok(map.len())
    }

    /// Returns `true` if the store holds no keys.
    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    /// All entries, sorted by key.
    pub fn entries(&self) -> StoreResult<Vec<PropertyEntry>> {
        let map = self.entries.read().map_err(StoreError::poisoned)?;
        let mut entries: Vec<PropertyEntry> = map
            .iter()
            .map(|(k, v)| PropertyEntry::new(k.clone(), v.clone()))
            .collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(entries)
    }

    fn validate(&self, key: &str, value: &Value) -> StoreResult<()> {
        value
            .check_constraints()
            .map_err(|e| StoreError::illegal(key, e))?;
        if self.serializable {
            value
                .check_serializable()
                .map_err(|e| StoreError::illegal(key, e))?;
        }
        Ok(())
    }
}

impl Default for MemoryPropertyStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PropertyStore for MemoryPropertyStore {
    fn get_typed(&self, kind: Kind, key: &str) -> StoreResult<Option<Value>> {
        let map = self.entries.read().map_err(StoreError::poisoned)?;
        match map.get(key) {
            None => Ok(None),
            Some(value) if value.kind() != kind => Err(StoreError::KindMismatch {
                key: key.to_string(),
                expected: kind,
                actual: value.kind(),
            }),
            Some(value) => Ok(Some(value.clone())),
        }
    }

    fn set_typed(&self, key: &str, value: Value) -> StoreResult<()> {
        self.validate(key, &value)?;
        let mut map = self.entries.write().map_err(StoreError::poisoned)?;
        if let Some(existing) = map.get_mut(key) {
            if existing.kind() != value.kind() {
                return Err(StoreError::DuplicateKey {
                    key: key.to_string(),
                    existing: existing.kind(),
                    requested: value.kind(),
                });
            }
            *existing = value;
        } else {
            map.insert(key.to_string(), value);
        }
        Ok(())
    }

    fn get_kind(&self, key: &str) -> StoreResult<Option<Kind>> {
        let map = self.entries.read().map_err(StoreError::poisoned)?;
        Ok(map.get(key).map(Value::kind))
    }

    fn keys(&self, prefix: Option<&str>, kind: Option<Kind>) -> StoreResult<Vec<String>> {
        let map = self.entries.read().map_err(StoreError::poisoned)?;
        let mut keys: Vec<String> = map
            .iter()
            .filter(|(k, _)| prefix.map_or(true, |p| k.starts_with(p)))
            .filter(|(_, v)| kind.map_or(true, |kind| v.kind() == kind))
            .map(|(k, _)| k.clone())
            .collect();
        keys.sort();
        Ok(keys)
    }

    fn exists(&self, key: &str) -> StoreResult<bool> {
        let map = self.entries.read().map_err(StoreError::poisoned)?;
        Ok(map.contains_key(key))
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        let mut map = self.entries.write().map_err(StoreError::poisoned)?;
        map.remove(key);
        Ok(())
    }

    fn remove_all(&self) -> StoreResult<()> {
        let mut map = self.entries.write().map_err(StoreError::poisoned)?;
        map.clear();
        Ok(())
    }
}

impl std::fmt::Debug for MemoryPropertyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.entries.read().map(|m| m.len()).unwrap_or(0);
        f.debug_struct("MemoryPropertyStore")
            .field("entry_count", &count)
            .field("serializable", &self.serializable)
            .finish()
    }
}

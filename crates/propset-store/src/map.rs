use std::collections::HashMap;
use std::sync::RwLock;

use propset_types::{Kind, Value};

use crate::error::{StoreError, StoreResult};
use crate::traits::PropertyStore;

/// Untyped property store wrapping a plain map.
///
/// The map remembers values but not the kind they were written under, so
/// this store does not enforce kind stability: a write replaces whatever
/// was there. `get_kind` is unsupported, the kind filter of `keys` is
/// ignored, and `supports_kind` reports `false` for every kind.
///
/// Reads still return a value of the requested kind. STRING and TEXT are
/// interchangeable; any other mismatch is a [`StoreError::KindMismatch`].
#[derive(Debug, Default)]
pub struct MapPropertyStore {
    map: RwLock<HashMap<String, Value>>,
}

impl MapPropertyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing map.
    pub fn from_map(map: HashMap<String, Value>) -> Self {
        Self {
            map: RwLock::new(map),
        }
    }

    /// Take the underlying map back out.
    pub fn into_map(self) -> StoreResult<HashMap<String, Value>> {
        self.map.into_inner().map_err(StoreError::poisoned)
    }
}

impl PropertyStore for MapPropertyStore {
    fn get_typed(&self, kind: Kind, key: &str) -> StoreResult<Option<Value>> {
        let map = self.map.read().map_err(StoreError::poisoned)?;
        let Some(value) = map.get(key) else {
            return Ok(None);
        };
        let value = value.clone().coerce_textual(kind);
        if value.kind() != kind {
            return Err(StoreError::KindMismatch {
                key: key.to_string(),
                expected: kind,
                actual: value.kind(),
            });
        }
        Ok(Some(value))
    }

    fn set_typed(&self, key: &str, value: Value) -> StoreResult<()> {
        value
            .check_constraints()
            .map_err(|e| StoreError::illegal(key, e))?;
        let mut map = self.map.write().map_err(StoreError::poisoned)?;
        map.insert(key.to_string(), value);
        Ok(())
    }

    fn get_kind(&self, _key: &str) -> StoreResult<Option<Kind>> {
        Err(StoreError::Unsupported(
            "map-backed store does not track kinds".into(),
        ))
    }

    /// The kind filter is ignored.
    fn keys(&self, prefix: Option<&str>, _kind: Option<Kind>) -> StoreResult<Vec<String>> {
        let map = self.map.read().map_err(StoreError::poisoned)?;
        let mut keys: Vec<String> = map
            .keys()
            .filter(|k| prefix.map_or(true, |p| k.starts_with(p)))
            .cloned()
            .collect();
        keys.sort();
        Ok(keys)
    }

    fn exists(&self, key: &str) -> StoreResult<bool> {
        let map = self.map.read().map_err(StoreError::poisoned)?;
        Ok(map.contains_key(key))
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        let mut map = self.map.write().map_err(StoreError::poisoned)?;
        map.remove(key);
        Ok(())
    }

    fn remove_all(&self) -> StoreResult<()> {
        let mut map = self.map.write().map_err(StoreError::poisoned)?;
        map.clear();
        Ok(())
    }

    fn supports_kind(&self, _kind: Kind) -> bool {
        false
    }

    fn supports_any_kind(&self) -> bool {
        false
    }
}

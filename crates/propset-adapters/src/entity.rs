//! Entity-scoped persistence adapter.
//!
//! An [`EntityRepository`] stores property rows keyed by
//! `(entity name, entity id, key)`. [`EntityPropertyStore`] binds one
//! `(entity name, entity id)` pair and serves the typed store contract over
//! that slice of the repository, so every entity gets its own property set.
//!
//! Repository rules:
//!
//! - a key keeps the kind it was first written with; a write of another kind
//!   fails with [`StoreError::DuplicateKey`]
//! - STRING and TEXT share one column, so either kind reads a string row
//! - OBJECT values are not persisted ([`StoreError::UnsupportedKind`])

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::{Arc, RwLock};

use propset_store::{PropertyStore, StoreError, StoreResult};
use propset_types::{Kind, Value};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Composite identity of one persisted property.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityKey {
    pub entity_name: String,
    pub entity_id: i64,
    pub key: String,
}

impl EntityKey {
    pub fn new(entity_name: impl Into<String>, entity_id: i64, key: impl Into<String>) -> Self {
        Self {
            entity_name: entity_name.into(),
            entity_id,
            key: key.into(),
        }
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}/{}", self.entity_name, self.entity_id, self.key)
    }
}

/// Persistence backend for entity-scoped properties.
pub trait EntityRepository: Send + Sync {
    /// Read `key` of the entity as `expected`.
    ///
    /// Returns `Ok(None)` if the row does not exist, and
    /// [`StoreError::KindMismatch`] if it holds an incompatible kind.
    fn get(
        &self,
        entity_name: &str,
        entity_id: i64,
        key: &str,
        expected: Kind,
    ) -> StoreResult<Option<Value>>;

    /// Create or update the row for `key`.
    fn set(&self, entity_name: &str, entity_id: i64, key: &str, value: Value) -> StoreResult<()>;

    /// Kind of the stored row, or `None` if absent.
    fn kind_of(&self, entity_name: &str, entity_id: i64, key: &str) -> StoreResult<Option<Kind>>;

    /// Keys of the entity, sorted, filtered by prefix and exact kind.
    fn keys(
        &self,
        entity_name: &str,
        entity_id: i64,
        prefix: Option<&str>,
        kind: Option<Kind>,
    ) -> StoreResult<Vec<String>>;

    /// Delete one row. Deleting an absent row is not an error.
    fn remove(&self, entity_name: &str, entity_id: i64, key: &str) -> StoreResult<()>;

    /// Delete every row of the entity, returning how many were removed.
    fn remove_entity(&self, entity_name: &str, entity_id: i64) -> StoreResult<usize>;
}

/// One persisted row in the JSON form of [`InMemoryEntityRepository`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct EntityRow {
    entity_name: String,
    entity_id: i64,
    key: String,
    #[serde(flatten)]
    value: Value,
}

/// Repository held in a sorted map, optionally saved to a JSON file.
#[derive(Default)]
pub struct InMemoryEntityRepository {
    rows: RwLock<BTreeMap<EntityKey, Value>>,
}

impl InMemoryEntityRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of rows across all entities.
    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.rows.read().map_err(StoreError::poisoned)?.len())
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Write every row to `path` as a JSON array.
    pub fn save(&self, path: &Path) -> StoreResult<()> {
        let rows: Vec<EntityRow> = {
            let guard = self.rows.read().map_err(StoreError::poisoned)?;
            guard
                .iter()
                .map(|(id, value)| EntityRow {
                    entity_name: id.entity_name.clone(),
                    entity_id: id.entity_id,
                    key: id.key.clone(),
                    value: value.clone(),
                })
                .collect()
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(&rows)?)?;
        debug!(path = %path.display(), rows = rows.len(), "saved entity rows");
        Ok(())
    }

    /// Load a repository previously written with [`save`](Self::save).
    pub fn load(path: &Path) -> StoreResult<Self> {
        let rows: Vec<EntityRow> = serde_json::from_str(&fs::read_to_string(path)?)?;
        let repo = Self::new();
        for row in rows {
            repo.set(&row.entity_name, row.entity_id, &row.key, row.value)?;
        }
        Ok(repo)
    }
}

impl EntityRepository for InMemoryEntityRepository {
    fn get(
        &self,
        entity_name: &str,
        entity_id: i64,
        key: &str,
        expected: Kind,
    ) -> StoreResult<Option<Value>> {
        if expected == Kind::Object {
            return Err(StoreError::UnsupportedKind { kind: expected });
        }
        let rows = self.rows.read().map_err(StoreError::poisoned)?;
        let Some(value) = rows.get(&EntityKey::new(entity_name, entity_id, key)) else {
            return Ok(None);
        };
        let actual = value.kind();
        if actual == expected || (actual.is_textual() && expected.is_textual()) {
            Ok(Some(value.clone().coerce_textual(expected)))
        } else {
            Err(StoreError::KindMismatch {
                key: key.to_string(),
                expected,
                actual,
            })
        }
    }

    fn set(&self, entity_name: &str, entity_id: i64, key: &str, value: Value) -> StoreResult<()> {
        let requested = value.kind();
        if requested == Kind::Object {
            return Err(StoreError::UnsupportedKind { kind: requested });
        }
        value
            .check_constraints()
            .map_err(|e| StoreError::illegal(key, e))?;

        let id = EntityKey::new(entity_name, entity_id, key);
        let mut rows = self.rows.write().map_err(StoreError::poisoned)?;
        if let Some(existing) = rows.get(&id) {
            if existing.kind() != requested {
                return Err(StoreError::DuplicateKey {
                    key: key.to_string(),
                    existing: existing.kind(),
                    requested,
                });
            }
        }
        debug!(%id, kind = %requested, "entity property written");
        rows.insert(id, value);
        Ok(())
    }

    fn kind_of(&self, entity_name: &str, entity_id: i64, key: &str) -> StoreResult<Option<Kind>> {
        let rows = self.rows.read().map_err(StoreError::poisoned)?;
        Ok(rows
            .get(&EntityKey::new(entity_name, entity_id, key))
            .map(Value::kind))
    }

    fn keys(
        &self,
        entity_name: &str,
        entity_id: i64,
        prefix: Option<&str>,
        kind: Option<Kind>,
    ) -> StoreResult<Vec<String>> {
        let rows = self.rows.read().map_err(StoreError::poisoned)?;
        Ok(rows
            .iter()
            .filter(|(id, _)| id.entity_name == entity_name && id.entity_id == entity_id)
            .filter(|(id, _)| prefix.map_or(true, |p| id.key.starts_with(p)))
            .filter(|(_, value)| kind.map_or(true, |k| value.kind() == k))
            .map(|(id, _)| id.key.clone())
            .collect())
    }

    fn remove(&self, entity_name: &str, entity_id: i64, key: &str) -> StoreResult<()> {
        self.rows
            .write()
            .map_err(StoreError::poisoned)?
            .remove(&EntityKey::new(entity_name, entity_id, key));
        Ok(())
    }

    fn remove_entity(&self, entity_name: &str, entity_id: i64) -> StoreResult<usize> {
        let mut rows = self.rows.write().map_err(StoreError::poisoned)?;
        let before = rows.len();
        rows.retain(|id, _| !(id.entity_name == entity_name && id.entity_id == entity_id));
        let removed = before - rows.len();
        debug!(entity_name, entity_id, removed, "entity properties removed");
        Ok(removed)
    }
}

impl fmt::Debug for InMemoryEntityRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.rows.read().map(|r| r.len()).unwrap_or(0);
        f.debug_struct("InMemoryEntityRepository")
            .field("row_count", &count)
            .finish()
    }
}

/// Property store for a single entity of an [`EntityRepository`].
#[derive(Clone)]
pub struct EntityPropertyStore {
    repo: Arc<dyn EntityRepository>,
    entity_name: String,
    entity_id: i64,
}

impl EntityPropertyStore {
    pub fn new(repo: Arc<dyn EntityRepository>, entity_name: impl Into<String>, entity_id: i64) -> Self {
        Self {
            repo,
            entity_name: entity_name.into(),
            entity_id,
        }
    }

    pub fn entity_name(&self) -> &str {
        &self.entity_name
    }

    pub fn entity_id(&self) -> i64 {
        self.entity_id
    }
}

impl PropertyStore for EntityPropertyStore {
    fn get_typed(&self, kind: Kind, key: &str) -> StoreResult<Option<Value>> {
        self.repo.get(&self.entity_name, self.entity_id, key, kind)
    }

    fn set_typed(&self, key: &str, value: Value) -> StoreResult<()> {
        self.repo.set(&self.entity_name, self.entity_id, key, value)
    }

    fn get_kind(&self, key: &str) -> StoreResult<Option<Kind>> {
        self.repo.kind_of(&self.entity_name, self.entity_id, key)
    }

    fn keys(&self, prefix: Option<&str>, kind: Option<Kind>) -> StoreResult<Vec<String>> {
        self.repo.keys(&self.entity_name, self.entity_id, prefix, kind)
    }

    fn exists(&self, key: &str) -> StoreResult<bool> {
        Ok(self.get_kind(key)?.is_some())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        self.repo.remove(&self.entity_name, self.entity_id, key)
    }

    fn remove_all(&self) -> StoreResult<()> {
        self.repo
            .remove_entity(&self.entity_name, self.entity_id)
            .map(|_| ())
    }

    fn supports_kind(&self, kind: Kind) -> bool {
        kind != Kind::Object
    }
}

impl fmt::Debug for EntityPropertyStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityPropertyStore")
            .field("entity_name", &self.entity_name)
            .field("entity_id", &self.entity_id)
            .finish()
    }
}

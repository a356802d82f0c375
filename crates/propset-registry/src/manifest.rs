//! TOML description of a graph of named stores.
//!
//! Stores are declared in order; a store may use any store declared before
//! it as a fallback member or as the backing store of a cache.
//!
//! ```toml
//! [[store]]
//! name = "defaults"
//! backend = "memory"
//! [store.values]
//! "db.port" = 5432
//! "db.host" = "localhost"
//!
//! [[store]]
//! name = "overrides"
//! backend = "serializable"
//!
//! [[store]]
//! name = "app"
//! backend = "aggregate"
//! members = ["overrides", "defaults"]
//!
//! [[store]]
//! name = "fast"
//! backend = "cached"
//! backing = "app"
//! preload = true
//! ```
//!
//! Seeded values take their kind from the TOML type: booleans are BOOLEAN,
//! integers are INT when they fit in 32 bits and LONG otherwise, floats are
//! DOUBLE, strings are STRING or TEXT by length, offset date-times are DATE,
//! and arrays or tables become JSON OBJECT values.

use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use propset_store::PropertyStore;
use propset_types::{Kind, PropertyObject, Value};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::args::{StoreArg, StoreArgs, BULKLOAD, ENTITY_ID, ENTITY_NAME, PROPERTY_SET, PROPERTY_SETS};
use crate::config::StoreConfig;
use crate::error::{RegistryError, RegistryResult};
use crate::registry::StoreRegistry;

/// Parsed manifest: the ordered store declarations.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreManifest {
    #[serde(default, rename = "store")]
    pub stores: Vec<StoreDecl>,
}

/// One `[[store]]` entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoreDecl {
    pub name: String,
    pub backend: String,
    /// Earlier stores used as fallback members, in precedence order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<String>,
    /// Earlier store wrapped by a cache.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backing: Option<String>,
    #[serde(default)]
    pub preload: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<i64>,
    #[serde(default, skip_serializing_if = "StoreConfig::is_empty")]
    pub config: StoreConfig,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub values: BTreeMap<String, toml::Value>,
}

/// Stores built from a manifest, by name.
#[derive(Clone, Default)]
pub struct StoreGraph {
    stores: BTreeMap<String, Arc<dyn PropertyStore>>,
    order: Vec<String>,
}

impl StoreGraph {
    pub fn get(&self, name: &str) -> Option<Arc<dyn PropertyStore>> {
        self.stores.get(name).cloned()
    }

    /// Like [`get`](Self::get), failing with [`RegistryError::UnknownStore`].
    pub fn require(&self, name: &str) -> RegistryResult<Arc<dyn PropertyStore>> {
        self.get(name)
            .ok_or_else(|| RegistryError::UnknownStore(name.to_string()))
    }

    /// Store names in declaration order.
    pub fn names(&self) -> &[String] {
        &self.order
    }

    /// The last declared store, usually the one applications read from.
    pub fn last(&self) -> Option<Arc<dyn PropertyStore>> {
        self.order.last().and_then(|name| self.get(name))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    fn insert(&mut self, name: String, store: Arc<dyn PropertyStore>) {
        if self.stores.insert(name.clone(), store).is_some() {
            warn!(store = %name, "store redeclared; later declaration wins");
            self.order.retain(|n| n != &name);
        }
        self.order.push(name);
    }
}

impl std::fmt::Debug for StoreGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreGraph").field("stores", &self.order).finish()
    }
}

impl StoreManifest {
    pub fn load(path: &Path) -> RegistryResult<Self> {
        std::fs::read_to_string(path)?.parse()
    }

    pub fn to_toml(&self) -> RegistryResult<String> {
        toml::to_string_pretty(self).map_err(|e| RegistryError::Config {
            key: "manifest".into(),
            reason: e.to_string(),
        })
    }

    /// Build every declared store with `registry`.
    ///
    /// `external` supplies arguments the manifest cannot express, such as a
    /// bean or an entity repository; they are passed to every factory, and
    /// arguments derived from the declaration take precedence over them.
    pub fn build(&self, registry: &StoreRegistry, external: &StoreArgs) -> RegistryResult<StoreGraph> {
        let mut graph = StoreGraph::default();
        for decl in &self.stores {
            let mut args = external.clone();
            args.extend(&decl.args(&graph)?);
            let store = registry.create(&decl.backend, &decl.config, &args)?;
            for (key, raw) in &decl.values {
                store.set_as_actual_kind(key, toml_to_value(key, raw)?)?;
            }
            graph.insert(decl.name.clone(), store);
        }
        info!(stores = graph.len(), "built store manifest");
        Ok(graph)
    }
}

impl FromStr for StoreManifest {
    type Err = RegistryError;

    fn from_str(s: &str) -> RegistryResult<Self> {
        Ok(toml::from_str(s)?)
    }
}

impl StoreDecl {
    /// Construction arguments derived from the declaration.
    fn args(&self, graph: &StoreGraph) -> RegistryResult<StoreArgs> {
        let mut args = StoreArgs::new();
        if !self.members.is_empty() {
            let members = self
                .members
                .iter()
                .map(|m| graph.require(m))
                .collect::<RegistryResult<Vec<_>>>()?;
            args.insert(PROPERTY_SETS, StoreArg::Stores(members));
        }
        if let Some(backing) = &self.backing {
            args.insert(PROPERTY_SET, StoreArg::Store(graph.require(backing)?));
        }
        args.insert(BULKLOAD, StoreArg::Flag(self.preload));
        if let Some(name) = &self.entity_name {
            args.insert(ENTITY_NAME, StoreArg::Text(name.clone()));
        }
        if let Some(id) = self.entity_id {
            args.insert(ENTITY_ID, StoreArg::Integer(id));
        }
        Ok(args)
    }
}

/// Convert a TOML value into the property value it seeds.
pub fn toml_to_value(key: &str, raw: &toml::Value) -> RegistryResult<Value> {
    let value = match raw {
        toml::Value::Boolean(b) => Value::Boolean(*b),
        toml::Value::Integer(n) => i32::try_from(*n).map_or(Value::Long(*n), Value::Int),
        toml::Value::Float(x) => Value::Double(*x),
        toml::Value::String(s) => Value::from(s.as_str()),
        toml::Value::Datetime(dt) => {
            Value::parse_as(Kind::Date, &dt.to_string()).map_err(|e| RegistryError::Value {
                key: key.to_string(),
                reason: e.to_string(),
            })?
        }
        toml::Value::Array(_) | toml::Value::Table(_) => {
            let json = serde_json::to_value(raw).map_err(|e| RegistryError::Value {
                key: key.to_string(),
                reason: e.to_string(),
            })?;
            Value::Object(PropertyObject::Json(json))
        }
    };
    Ok(value)
}

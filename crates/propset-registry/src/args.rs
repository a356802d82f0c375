//! Named construction arguments.
//!
//! Factories receive live objects (other stores, a bean, a repository) next
//! to plain flags and text. Each is stored under a well-known name; the
//! typed accessors report [`RegistryError::MissingArgument`] or
//! [`RegistryError::InvalidArgument`] instead of panicking.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use propset_adapters::{EntityRepository, Introspect};
use propset_store::PropertyStore;
use propset_types::Value;

use crate::error::{RegistryError, RegistryResult};

/// Ordered member stores of an `aggregate`.
pub const PROPERTY_SETS: &str = "PropertySets";
/// Backing store of a `cached` store.
pub const PROPERTY_SET: &str = "PropertySet";
/// Preload flag of a `cached` store.
pub const BULKLOAD: &str = "bulkload";
/// Initial contents of a `map` store.
pub const MAP: &str = "map";
/// Bound object of a `bean` store.
pub const BEAN: &str = "bean";
/// Repository of an `entity` store.
pub const REPOSITORY: &str = "repository";
/// Entity name of an `entity` store.
pub const ENTITY_NAME: &str = "entityName";
/// Entity id of an `entity` store.
pub const ENTITY_ID: &str = "entityId";

/// A single construction argument.
#[derive(Clone)]
pub enum StoreArg {
    Store(Arc<dyn PropertyStore>),
    Stores(Vec<Arc<dyn PropertyStore>>),
    Flag(bool),
    Map(HashMap<String, Value>),
    Bean(Arc<dyn Introspect>),
    Repository(Arc<dyn EntityRepository>),
    Text(String),
    Integer(i64),
}

impl StoreArg {
    fn type_name(&self) -> &'static str {
        match self {
            Self::Store(_) => "a store",
            Self::Stores(_) => "a list of stores",
            Self::Flag(_) => "a flag",
            Self::Map(_) => "a map",
            Self::Bean(_) => "a bean",
            Self::Repository(_) => "an entity repository",
            Self::Text(_) => "text",
            Self::Integer(_) => "an integer",
        }
    }
}

impl fmt::Debug for StoreArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag(b) => write!(f, "Flag({b})"),
            Self::Text(s) => write!(f, "Text({s:?})"),
            Self::Integer(n) => write!(f, "Integer({n})"),
            Self::Stores(v) => write!(f, "Stores(len={})", v.len()),
            Self::Map(m) => write!(f, "Map(len={})", m.len()),
            other => f.write_str(other.type_name()),
        }
    }
}

/// Named arguments for one store construction.
#[derive(Clone, Debug, Default)]
pub struct StoreArgs {
    args: BTreeMap<String, StoreArg>,
}

impl StoreArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, arg: StoreArg) -> Self {
        self.insert(name, arg);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, arg: StoreArg) {
        self.args.insert(name.into(), arg);
    }

    pub fn get(&self, name: &str) -> Option<&StoreArg> {
        self.args.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.args.contains_key(name)
    }

    /// Add every argument of `other`, replacing same-named ones.
    pub fn extend(&mut self, other: &StoreArgs) {
        for (name, arg) in &other.args {
            self.args.insert(name.clone(), arg.clone());
        }
    }

    pub fn store(&self, name: &str) -> RegistryResult<Arc<dyn PropertyStore>> {
        match self.required(name)? {
            StoreArg::Store(s) => Ok(s.clone()),
            other => Err(invalid(name, "a store", other)),
        }
    }

    /// Member list; absent means no members.
    pub fn stores(&self, name: &str) -> RegistryResult<Vec<Arc<dyn PropertyStore>>> {
        match self.get(name) {
            None => Ok(Vec::new()),
            Some(StoreArg::Stores(v)) => Ok(v.clone()),
            Some(StoreArg::Store(s)) => Ok(vec![s.clone()]),
            Some(other) => Err(invalid(name, "a list of stores", other)),
        }
    }

    pub fn flag(&self, name: &str) -> RegistryResult<Option<bool>> {
        match self.get(name) {
            None => Ok(None),
            Some(StoreArg::Flag(b)) => Ok(Some(*b)),
            Some(other) => Err(invalid(name, "a flag", other)),
        }
    }

    pub fn map(&self, name: &str) -> RegistryResult<Option<HashMap<String, Value>>> {
        match self.get(name) {
            None => Ok(None),
            Some(StoreArg::Map(m)) => Ok(Some(m.clone())),
            Some(other) => Err(invalid(name, "a map", other)),
        }
    }

    pub fn bean(&self, name: &str) -> RegistryResult<Arc<dyn Introspect>> {
        match self.required(name)? {
            StoreArg::Bean(b) => Ok(b.clone()),
            other => Err(invalid(name, "a bean", other)),
        }
    }

    pub fn repository(&self, name: &str) -> RegistryResult<Arc<dyn EntityRepository>> {
        match self.required(name)? {
            StoreArg::Repository(r) => Ok(r.clone()),
            other => Err(invalid(name, "an entity repository", other)),
        }
    }

    pub fn text(&self, name: &str) -> RegistryResult<&str> {
        match self.required(name)? {
            StoreArg::Text(s) => Ok(s.as_str()),
            other => Err(invalid(name, "text", other)),
        }
    }

    /// Integer argument; text holding an integer is accepted too.
    pub fn integer(&self, name: &str) -> RegistryResult<i64> {
        match self.required(name)? {
            StoreArg::Integer(n) => Ok(*n),
            StoreArg::Text(s) => s.trim().parse().map_err(|_| RegistryError::InvalidArgument {
                name: name.to_string(),
                expected: "an integer",
                found: "non-numeric text",
            }),
            other => Err(invalid(name, "an integer", other)),
        }
    }

    fn required(&self, name: &str) -> RegistryResult<&StoreArg> {
        self.get(name).ok_or_else(|| RegistryError::MissingArgument {
            name: name.to_string(),
        })
    }
}

fn invalid(name: &str, expected: &'static str, found: &StoreArg) -> RegistryError {
    RegistryError::InvalidArgument {
        name: name.to_string(),
        expected,
        found: found.type_name(),
    }
}

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, RegistryResult};

/// Config key naming the backend used as the cache of a `cached` store.
pub const SERIALIZABLE_NAME: &str = "serializableName";

/// String options passed to a store factory.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoreConfig {
    options: BTreeMap<String, String>,
}

impl StoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.options.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    /// Parse a boolean option (`true`/`false`, `yes`/`no`, `1`/`0`).
    pub fn get_bool(&self, key: &str) -> RegistryResult<Option<bool>> {
        let Some(raw) = self.get(key) else {
            return Ok(None);
        };
        match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Ok(Some(true)),
            "false" | "no" | "0" => Ok(Some(false)),
            _ => Err(RegistryError::Config {
                key: key.to_string(),
                reason: format!("expected a boolean, got {raw:?}"),
            }),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.options.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}

impl From<BTreeMap<String, String>> for StoreConfig {
    fn from(options: BTreeMap<String, String>) -> Self {
        Self { options }
    }
}

use serde::{Deserialize, Serialize};

use crate::kind::Kind;
use crate::value::Value;

/// A key together with its tagged value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PropertyEntry {
    pub key: String,
    #[serde(flatten)]
    pub value: Value,
}

impl PropertyEntry {
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }

    /// Kind of the stored value.
    pub fn kind(&self) -> Kind {
        self.value.kind()
    }
}

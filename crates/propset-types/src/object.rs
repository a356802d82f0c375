use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Payload of an OBJECT value.
///
/// Objects are opaque to every store. Two representations exist:
///
/// - [`PropertyObject::Json`] holds a serialized form and can be persisted
///   by any backend.
/// - [`PropertyObject::Opaque`] holds a live in-process value. It is shared,
///   never copied, and backends that persist their contents reject it.
#[derive(Clone)]
pub enum PropertyObject {
    Json(serde_json::Value),
    Opaque(Arc<dyn Any + Send + Sync>),
}

impl PropertyObject {
    /// Serialize `value` into a persistable object.
    pub fn from_serializable<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_value(value).map(Self::Json)
    }

    /// Wrap a live value that will never leave the process.
    pub fn opaque<T: Any + Send + Sync>(value: T) -> Self {
        Self::Opaque(Arc::new(value))
    }

    /// Returns `true` if the object can be persisted.
    pub fn is_serializable(&self) -> bool {
        matches!(self, Self::Json(_))
    }

    /// The serialized form, if any.
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Json(v) => Some(v),
            Self::Opaque(_) => None,
        }
    }

    /// Borrow a live value as `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Self::Opaque(any) => any.downcast_ref::<T>(),
            Self::Json(_) => None,
        }
    }

    /// Rebuild a `T` from the serialized form.
    pub fn deserialize_into<T: DeserializeOwned>(&self) -> Option<T> {
        self.as_json()
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

impl PartialEq for PropertyObject {
    /// Serialized objects compare by content, live objects by identity.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Json(a), Self::Json(b)) => a == b,
            (Self::Opaque(a), Self::Opaque(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for PropertyObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(v) => write!(f, "PropertyObject::Json({v})"),
            Self::Opaque(_) => f.write_str("PropertyObject::Opaque(..)"),
        }
    }
}

impl fmt::Display for PropertyObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(v) => write!(f, "{v}"),
            Self::Opaque(_) => f.write_str("<opaque>"),
        }
    }
}

impl From<serde_json::Value> for PropertyObject {
    fn from(value: serde_json::Value) -> Self {
        Self::Json(value)
    }
}

impl Serialize for PropertyObject {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Json(v) => v.serialize(serializer),
            Self::Opaque(_) => Err(serde::ser::Error::custom(
                "opaque object is not serializable",
            )),
        }
    }
}

impl<'de> Deserialize<'de> for PropertyObject {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Self::Json)
    }
}

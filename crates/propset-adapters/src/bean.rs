//! Property store over an object's declared properties.
//!
//! Rust has no runtime reflection, so an object opts in by implementing
//! [`Introspect`]: it lists its properties once (name, kind, and whether
//! each is readable and writable) and reads or writes them by name.
//! [`BeanPropertyStore`] then serves the typed store contract on top.
//!
//! The property set is fixed by the object: keys cannot be created or
//! removed through the store, only read and written.

use std::collections::BTreeMap;
use std::sync::Arc;

use propset_store::{PropertyStore, StoreError, StoreResult};
use propset_types::{Kind, Value};

/// Description of one property exposed by an [`Introspect`] implementer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BeanProperty {
    pub name: String,
    pub kind: Kind,
    pub readable: bool,
    pub writable: bool,
}

impl BeanProperty {
    /// A readable and writable property.
    pub fn read_write(name: impl Into<String>, kind: Kind) -> Self {
        Self {
            name: name.into(),
            kind,
            readable: true,
            writable: true,
        }
    }

    /// A property without a setter.
    pub fn read_only(name: impl Into<String>, kind: Kind) -> Self {
        Self {
            writable: false,
            ..Self::read_write(name, kind)
        }
    }

    /// A property without a getter.
    pub fn write_only(name: impl Into<String>, kind: Kind) -> Self {
        Self {
            readable: false,
            ..Self::read_write(name, kind)
        }
    }
}

/// An object whose properties can be listed and accessed by name.
///
/// `read_property` and `write_property` are only called for names listed by
/// `properties`, with values already checked against the declared kind.
pub trait Introspect: Send + Sync {
    fn properties(&self) -> Vec<BeanProperty>;

    fn read_property(&self, name: &str) -> StoreResult<Option<Value>>;

    fn write_property(&self, name: &str, value: Value) -> StoreResult<()>;
}

/// Typed store bound to one [`Introspect`] object.
pub struct BeanPropertyStore {
    bean: Arc<dyn Introspect>,
    descriptors: BTreeMap<String, BeanProperty>,
}

impl BeanPropertyStore {
    /// Bind to `bean`, reading its property list once.
    pub fn new(bean: Arc<dyn Introspect>) -> Self {
        let descriptors = bean
            .properties()
            .into_iter()
            .map(|p| (p.name.clone(), p))
            .collect();
        Self { bean, descriptors }
    }

    pub fn bean(&self) -> &Arc<dyn Introspect> {
        &self.bean
    }

    fn descriptor(&self, key: &str) -> StoreResult<&BeanProperty> {
        self.descriptors.get(key).ok_or_else(|| StoreError::KeyNotFound {
            key: key.to_string(),
        })
    }

    /// Look up `key` and check that it is declared with `kind`.
    fn typed_descriptor(&self, kind: Kind, key: &str) -> StoreResult<&BeanProperty> {
        let descriptor = self.descriptor(key)?;
        if descriptor.kind != kind {
            return Err(StoreError::KindMismatch {
                key: key.to_string(),
                expected: kind,
                actual: descriptor.kind,
            });
        }
        Ok(descriptor)
    }
}

impl PropertyStore for BeanPropertyStore {
    fn get_typed(&self, kind: Kind, key: &str) -> StoreResult<Option<Value>> {
        let descriptor = self.typed_descriptor(kind, key)?;
        if !descriptor.readable {
            return Err(StoreError::Backend(format!("property {key} is write-only")));
        }
        self.bean.read_property(key)
    }

    fn set_typed(&self, key: &str, value: Value) -> StoreResult<()> {
        let descriptor = self.typed_descriptor(value.kind(), key)?;
        if !descriptor.writable {
            return Err(StoreError::Backend(format!("property {key} is read-only")));
        }
        value
            .check_constraints()
            .map_err(|e| StoreError::illegal(key, e))?;
        self.bean.write_property(key, value)
    }

    /// Declared kind; unknown names fail with [`StoreError::KeyNotFound`].
    fn get_kind(&self, key: &str) -> StoreResult<Option<Kind>> {
        Ok(Some(self.descriptor(key)?.kind))
    }

    fn keys(&self, prefix: Option<&str>, kind: Option<Kind>) -> StoreResult<Vec<String>> {
        Ok(self
            .descriptors
            .values()
            .filter(|d| prefix.map_or(true, |p| d.name.starts_with(p)))
            .filter(|d| kind.map_or(true, |k| d.kind == k))
            .map(|d| d.name.clone())
            .collect())
    }

    fn exists(&self, key: &str) -> StoreResult<bool> {
        Ok(self.descriptors.contains_key(key))
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        Err(StoreError::Unsupported(format!(
            "cannot remove bean property {key}; write a new value instead"
        )))
    }

    /// Bean properties cannot be removed; clearing the store does nothing.
    fn remove_all(&self) -> StoreResult<()> {
        Ok(())
    }

    fn is_settable(&self, key: &str) -> bool {
        self.descriptors.get(key).is_some_and(|d| d.writable)
    }
}

impl std::fmt::Debug for BeanPropertyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BeanPropertyStore")
            .field("properties", &self.descriptors.keys().collect::<Vec<_>>())
            .finish()
    }
}

//! The [`PropertyStore`] trait: the typed store contract.
//!
//! Every backend and decorator implements the same small set of required
//! methods. Per-kind getters and setters, kind inference, and key listing
//! shortcuts are provided on top of them and behave identically everywhere.

use chrono::{DateTime, Utc};
use propset_types::{Kind, PropertyObject, Value};

use crate::error::{StoreError, StoreResult};

/// A mapping from key to typed value.
///
/// Implementations must satisfy these invariants:
/// - Within one store a key has exactly one kind for its entire lifetime.
///   Writing a different kind under an existing key fails with
///   [`StoreError::DuplicateKey`] and leaves the old value in place.
/// - `get_typed` distinguishes "absent" (`Ok(None)`) from a stored value,
///   including a stored zero or `false`.
/// - No operation other than `remove`/`remove_all` deletes a key.
/// - Each instance is independently thread-safe; no update is observable
///   half-applied.
pub trait PropertyStore: Send + Sync {
    /// Read the value stored under `key` as `kind`.
    ///
    /// Returns `Ok(None)` if the key does not exist and
    /// [`StoreError::KindMismatch`] if it exists under another kind.
    fn get_typed(&self, kind: Kind, key: &str) -> StoreResult<Option<Value>>;

    /// Store `value` under `key`, tagged with `value.kind()`.
    ///
    /// Fails with [`StoreError::UnsupportedKind`] if the store cannot hold
    /// the kind, [`StoreError::DuplicateKey`] if the key exists under another
    /// kind, and [`StoreError::IllegalValue`] if the value breaks a kind
    /// constraint (a STRING over 255 code units, or a backend-specific rule).
    fn set_typed(&self, key: &str, value: Value) -> StoreResult<()>;

    /// Kind of the value stored under `key`, or `None` if absent.
    fn get_kind(&self, key: &str) -> StoreResult<Option<Kind>>;

    /// Keys filtered by prefix and/or exact kind. `None` means no filter.
    fn keys(&self, prefix: Option<&str>, kind: Option<Kind>) -> StoreResult<Vec<String>>;

    fn exists(&self, key: &str) -> StoreResult<bool>;

    /// Remove one key. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> StoreResult<()>;

    /// Remove every key.
    fn remove_all(&self) -> StoreResult<()>;

    /// Whether a write to `key` would be accepted.
    fn is_settable(&self, _key: &str) -> bool {
        true
    }

    /// Whether values of `kind` can be stored at all.
    fn supports_kind(&self, _kind: Kind) -> bool {
        true
    }

    /// Whether the store tracks kinds. Untyped stores return `false`.
    fn supports_any_kind(&self) -> bool {
        true
    }

    // -------------------------------------------------------------------
    // Kind inference
    // -------------------------------------------------------------------

    /// Store `value` under the kind inferred from its payload.
    ///
    /// Strings of up to 255 code units become STRING, longer ones TEXT;
    /// every other payload keeps its own kind.
    fn set_as_actual_kind(&self, key: &str, value: Value) -> StoreResult<()> {
        self.set_typed(key, value.into_actual())
    }

    /// Look up the stored kind, then read through the matching getter.
    ///
    /// Returns `Ok(None)` for an absent key. Scalar kinds come back with
    /// their defaults applied, exactly as the per-kind getters return them.
    fn get_as_actual_kind(&self, key: &str) -> StoreResult<Option<Value>> {
        let Some(kind) = self.get_kind(key)? else {
            return Ok(None);
        };
        let value = match kind {
            Kind::Boolean => Some(Value::Boolean(self.get_bool(key)?)),
            Kind::Int => Some(Value::Int(self.get_int(key)?)),
            Kind::Long => Some(Value::Long(self.get_long(key)?)),
            Kind::Double => Some(Value::Double(self.get_double(key)?)),
            Kind::String => self.get_string(key)?.map(Value::String),
            Kind::Text => self.get_text(key)?.map(Value::Text),
            Kind::Date => self.get_date(key)?.map(Value::Date),
            Kind::Object => self.get_object(key)?.map(Value::Object),
        };
        Ok(value)
    }

    // -------------------------------------------------------------------
    // Key listing shortcuts
    // -------------------------------------------------------------------

    fn all_keys(&self) -> StoreResult<Vec<String>> {
        self.keys(None, None)
    }

    fn keys_with_prefix(&self, prefix: &str) -> StoreResult<Vec<String>> {
        self.keys(Some(prefix), None)
    }

    fn keys_of_kind(&self, kind: Kind) -> StoreResult<Vec<String>> {
        self.keys(None, Some(kind))
    }

    // -------------------------------------------------------------------
    // Per-kind getters. Absent keys and kind mismatches yield defaults.
    // -------------------------------------------------------------------

    /// `false` when absent.
    fn get_bool(&self, key: &str) -> StoreResult<bool> {
        Ok(lookup(self, Kind::Boolean, key)?
            .and_then(|v| v.as_bool())
            .unwrap_or(false))
    }

    /// `0` when absent.
    fn get_int(&self, key: &str) -> StoreResult<i32> {
        Ok(lookup(self, Kind::Int, key)?
            .and_then(|v| v.as_int())
            .unwrap_or(0))
    }

    /// `0` when absent.
    fn get_long(&self, key: &str) -> StoreResult<i64> {
        Ok(lookup(self, Kind::Long, key)?
            .and_then(|v| v.as_long())
            .unwrap_or(0))
    }

    /// `0.0` when absent.
    fn get_double(&self, key: &str) -> StoreResult<f64> {
        Ok(lookup(self, Kind::Double, key)?
            .and_then(|v| v.as_double())
            .unwrap_or(0.0))
    }

    fn get_string(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(lookup(self, Kind::String, key)?.and_then(into_string))
    }

    fn get_text(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(lookup(self, Kind::Text, key)?.and_then(into_string))
    }

    fn get_date(&self, key: &str) -> StoreResult<Option<DateTime<Utc>>> {
        Ok(lookup(self, Kind::Date, key)?.and_then(|v| v.as_date()))
    }

    fn get_object(&self, key: &str) -> StoreResult<Option<PropertyObject>> {
        Ok(lookup(self, Kind::Object, key)?.and_then(|v| match v {
            Value::Object(o) => Some(o),
            _ => None,
        }))
    }

    // -------------------------------------------------------------------
    // Per-kind setters
    // -------------------------------------------------------------------

    fn set_bool(&self, key: &str, value: bool) -> StoreResult<()> {
        self.set_typed(key, Value::Boolean(value))
    }

    fn set_int(&self, key: &str, value: i32) -> StoreResult<()> {
        self.set_typed(key, Value::Int(value))
    }

    fn set_long(&self, key: &str, value: i64) -> StoreResult<()> {
        self.set_typed(key, Value::Long(value))
    }

    fn set_double(&self, key: &str, value: f64) -> StoreResult<()> {
        self.set_typed(key, Value::Double(value))
    }

    /// Rejects strings over 255 code units; use [`set_text`](Self::set_text).
    fn set_string(&self, key: &str, value: &str) -> StoreResult<()> {
        let value = Value::String(value.to_string());
        value
            .check_constraints()
            .map_err(|e| StoreError::illegal(key, e))?;
        self.set_typed(key, value)
    }

    fn set_text(&self, key: &str, value: &str) -> StoreResult<()> {
        self.set_typed(key, Value::Text(value.to_string()))
    }

    fn set_date(&self, key: &str, value: DateTime<Utc>) -> StoreResult<()> {
        self.set_typed(key, Value::Date(value))
    }

    fn set_object(&self, key: &str, value: PropertyObject) -> StoreResult<()> {
        self.set_typed(key, Value::Object(value))
    }
}

/// Typed read that folds "absent" and "stored under another kind" into
/// `None`. Every other failure propagates.
fn lookup<S: PropertyStore + ?Sized>(
    store: &S,
    kind: Kind,
    key: &str,
) -> StoreResult<Option<Value>> {
    match store.get_typed(kind, key) {
        Ok(value) => Ok(value),
        Err(StoreError::KindMismatch { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

fn into_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) | Value::Text(s) => Some(s),
        _ => None,
    }
}

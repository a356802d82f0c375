use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValueError;
use crate::kind::Kind;
use crate::object::PropertyObject;

/// Longest STRING value, in UTF-16 code units. Longer strings are TEXT.
pub const MAX_STRING_LEN: usize = 255;

/// Length of `s` in UTF-16 code units, the unit the STRING limit is stated in.
pub fn code_units(s: &str) -> usize {
    s.encode_utf16().count()
}

/// A property payload tagged with its [`Kind`].
///
/// The tag is the kind the value is stored under. `Value::String` and
/// `Value::Text` carry the same Rust type and differ only in their tag.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Value {
    Boolean(bool),
    Int(i32),
    Long(i64),
    Double(f64),
    String(String),
    Text(String),
    Date(DateTime<Utc>),
    Object(PropertyObject),
}

impl Value {
    /// The kind this value is tagged with.
    pub fn kind(&self) -> Kind {
        match self {
            Self::Boolean(_) => Kind::Boolean,
            Self::Int(_) => Kind::Int,
            Self::Long(_) => Kind::Long,
            Self::Double(_) => Kind::Double,
            Self::String(_) => Kind::String,
            Self::Text(_) => Kind::Text,
            Self::Date(_) => Kind::Date,
            Self::Object(_) => Kind::Object,
        }
    }

    /// The kind inferred from the payload alone.
    ///
    /// Identical to [`Value::kind`] except for strings, where the length
    /// decides: up to [`MAX_STRING_LEN`] code units is STRING, longer is TEXT.
    pub fn actual_kind(&self) -> Kind {
        match self {
            Self::String(s) | Self::Text(s) => {
                if code_units(s) > MAX_STRING_LEN {
                    Kind::Text
                } else {
                    Kind::String
                }
            }
            other => other.kind(),
        }
    }

    /// Re-tag the value with [`Value::actual_kind`].
    pub fn into_actual(self) -> Self {
        match self {
            Self::String(s) | Self::Text(s) => Self::from(s),
            other => other,
        }
    }

    /// Re-tag a string payload as `target` when both are textual kinds.
    ///
    /// Non-textual values, or a non-textual target, are returned unchanged.
    pub fn coerce_textual(self, target: Kind) -> Self {
        match (self, target) {
            (Self::String(s) | Self::Text(s), Kind::String) => Self::String(s),
            (Self::String(s) | Self::Text(s), Kind::Text) => Self::Text(s),
            (other, _) => other,
        }
    }

    /// Check the constraints every store enforces for this kind.
    pub fn check_constraints(&self) -> Result<(), ValueError> {
        if let Self::String(s) = self {
            let len = code_units(s);
            if len > MAX_STRING_LEN {
                return Err(ValueError::StringTooLong {
                    len,
                    max: MAX_STRING_LEN,
                });
            }
        }
        Ok(())
    }

    /// Check that the value can be persisted.
    pub fn check_serializable(&self) -> Result<(), ValueError> {
        match self {
            Self::Object(obj) if !obj.is_serializable() => Err(ValueError::NotSerializable),
            _ => Ok(()),
        }
    }

    /// Returns `true` for a numeric value equal to zero.
    ///
    /// Fallback lookups treat such values as indistinguishable from "absent".
    pub fn is_zero_numeric(&self) -> bool {
        match self {
            Self::Int(v) => *v == 0,
            Self::Long(v) => *v == 0,
            Self::Double(v) => *v == 0.0,
            _ => false,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_long(&self) -> Option<i64> {
        match self {
            Self::Long(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            Self::Double(v) => Some(*v),
            _ => None,
        }
    }

    /// String payload of a STRING or TEXT value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) | Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&PropertyObject> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Long(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::String(s) | Self::Text(s) => f.write_str(s),
            Self::Date(d) => write!(f, "{}", d.to_rfc3339()),
            Self::Object(o) => write!(f, "{o}"),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Long(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

/// Strings pick STRING or TEXT by length.
impl From<String> for Value {
    fn from(s: String) -> Self {
        if code_units(&s) > MAX_STRING_LEN {
            Self::Text(s)
        } else {
            Self::String(s)
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(d: DateTime<Utc>) -> Self {
        Self::Date(d)
    }
}

impl From<PropertyObject> for Value {
    fn from(o: PropertyObject) -> Self {
        Self::Object(o)
    }
}

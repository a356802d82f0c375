use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseKindError;

/// The kind of a stored property value.
///
/// A closed set of eight tags. Within one store a key keeps the kind it was
/// first written with for its whole lifetime.
///
/// Numeric codes start at 1; code `0` is reserved for "no kind" (the key is
/// not present) and never maps to a `Kind`. APIs that accept "any kind"
/// take `Option<Kind>` and use `None` for it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Boolean,
    Int,
    Long,
    Double,
    /// Short string, at most 255 UTF-16 code units.
    String,
    /// Unbounded string.
    Text,
    Date,
    /// Opaque object payload.
    Object,
}

impl Kind {
    /// All kinds in code order.
    pub const ALL: [Kind; 8] = [
        Kind::Boolean,
        Kind::Int,
        Kind::Long,
        Kind::Double,
        Kind::String,
        Kind::Text,
        Kind::Date,
        Kind::Object,
    ];

    /// Stable numeric code (1..=8).
    pub const fn code(self) -> u8 {
        match self {
            Self::Boolean => 1,
            Self::Int => 2,
            Self::Long => 3,
            Self::Double => 4,
            Self::String => 5,
            Self::Text => 6,
            Self::Date => 7,
            Self::Object => 8,
        }
    }

    /// Resolve a numeric code. `0` means "no kind" and yields `Ok(None)`.
    pub fn from_code(code: u8) -> Result<Option<Self>, ParseKindError> {
        if code == 0 {
            return Ok(None);
        }
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.code() == code)
            .map(Some)
            .ok_or_else(|| ParseKindError(code.to_string()))
    }

    /// Lowercase name (`"boolean"`, `"int"`, ...).
    pub const fn name(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Int => "int",
            Self::Long => "long",
            Self::Double => "double",
            Self::String => "string",
            Self::Text => "text",
            Self::Date => "date",
            Self::Object => "object",
        }
    }

    /// Returns `true` for INT, LONG and DOUBLE.
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Int | Self::Long | Self::Double)
    }

    /// Returns `true` for STRING and TEXT.
    pub fn is_textual(self) -> bool {
        matches!(self, Self::String | Self::Text)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Kind {
    type Err = ParseKindError;

    /// Case-insensitive name lookup.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.name() == lower)
            .ok_or_else(|| ParseKindError(s.to_string()))
    }
}

use thiserror::Error;

use crate::kind::Kind;

/// A value violates a constraint of its kind.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// STRING values are limited to 255 UTF-16 code units; use TEXT instead.
    #[error("string exceeds {max} characters ({len}); use text instead")]
    StringTooLong { len: usize, max: usize },

    /// The OBJECT payload cannot be serialized.
    #[error("object value is not serializable")]
    NotSerializable,

    /// Text could not be parsed as the requested kind.
    #[error("cannot parse {input:?} as {kind}: {reason}")]
    Unparseable {
        kind: Kind,
        input: String,
        reason: String,
    },
}

/// A kind name or code did not match any known kind.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown property kind: {0}")]
pub struct ParseKindError(pub String);

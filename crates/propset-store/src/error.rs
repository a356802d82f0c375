use propset_types::{Kind, ValueError};

/// Errors from property store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The key is absent and the operation requires it.
    #[error("property not found: {key}")]
    KeyNotFound { key: String },

    /// The key is stored under a different kind than the one requested.
    #[error("property {key} is {actual}, not {expected}")]
    KindMismatch {
        key: String,
        expected: Kind,
        actual: Kind,
    },

    /// A write tried to change the kind of an existing key.
    #[error("property {key} already exists as {existing}; cannot store {requested}")]
    DuplicateKey {
        key: String,
        existing: Kind,
        requested: Kind,
    },

    /// The value violates a constraint of its kind or of the backend.
    #[error("illegal value for {key}: {source}")]
    IllegalValue {
        key: String,
        #[source]
        source: ValueError,
    },

    /// The store does not handle values of this kind.
    #[error("kind {kind} is not supported by this store")]
    UnsupportedKind { kind: Kind },

    /// The store does not implement this operation.
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// No store accepted a write for the key.
    #[error("property {key} is not settable")]
    NotSettable { key: String },

    /// Failure inside a backend or external collaborator.
    #[error("backend failure: {0}")]
    Backend(String),

    /// I/O error from a persisting backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    /// Wrap a constraint violation for `key`.
    pub fn illegal(key: &str, source: ValueError) -> Self {
        Self::IllegalValue {
            key: key.to_string(),
            source,
        }
    }

    /// Map a poisoned lock into a backend failure.
    pub fn poisoned<E: std::fmt::Display>(e: E) -> Self {
        Self::Backend(format!("lock poisoned: {e}"))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

//! Error types for store construction.

use propset_store::StoreError;
use thiserror::Error;

/// Errors from building stores through the registry or a manifest.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// No factory is registered under this backend name.
    #[error("unknown store backend: {0}")]
    UnknownBackend(String),

    /// A manifest refers to a store it has not declared (yet).
    #[error("unknown store: {0}")]
    UnknownStore(String),

    /// A required construction argument was not supplied.
    #[error("missing argument: {name}")]
    MissingArgument { name: String },

    /// A construction argument has the wrong shape.
    #[error("argument {name} must be {expected}, got {found}")]
    InvalidArgument {
        name: String,
        expected: &'static str,
        found: &'static str,
    },

    /// A configuration option is malformed.
    #[error("invalid config option {key}: {reason}")]
    Config { key: String, reason: String },

    /// A seeded value cannot be represented as a property value.
    #[error("invalid value for {key}: {reason}")]
    Value { key: String, reason: String },

    /// The constructed store rejected an operation.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The manifest is not valid TOML for the expected layout.
    #[error("manifest parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// I/O error reading a manifest.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for registry operations.
pub type RegistryResult<T> = std::result::Result<T, RegistryError>;

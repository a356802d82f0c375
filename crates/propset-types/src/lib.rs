//! Foundation types for PropSet.
//!
//! PropSet stores named, typed values against pluggable backends. This crate
//! holds the vocabulary shared by every backend and decorator: the closed set
//! of value kinds and the tagged value that carries one of them.
//!
//! # Key Types
//!
//! - [`Kind`] -- the eight value kinds (`boolean` through `object`)
//! - [`Value`] -- a payload tagged with exactly one [`Kind`]
//! - [`PropertyObject`] -- the opaque payload of an OBJECT value
//! - [`PropertyEntry`] -- a key paired with its value

pub mod entry;
pub mod error;
pub mod kind;
pub mod object;
pub mod parse;
pub mod value;

pub use entry::PropertyEntry;
pub use error::{ParseKindError, ValueError};
pub use kind::Kind;
pub use object::PropertyObject;
pub use value::{code_units, Value, MAX_STRING_LEN};

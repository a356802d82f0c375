//! Construction of PropSet stores by logical name.
//!
//! Every store is built from two inputs: a [`StoreConfig`] of string options
//! and a set of named [`StoreArgs`] (member stores, a backing store, a
//! preload flag, a bean or entity handle). The [`StoreRegistry`] maps a
//! backend name to the factory that performs that construction, and a
//! [`StoreManifest`] describes a whole graph of named stores in TOML.
//!
//! # Modules
//!
//! - [`args`] -- [`StoreArg`] / [`StoreArgs`] and the argument names
//! - [`config`] -- [`StoreConfig`] string options
//! - [`error`] -- [`RegistryError`] and [`RegistryResult`]
//! - [`manifest`] -- [`StoreManifest`] / [`StoreDecl`] / [`StoreGraph`]
//! - [`registry`] -- [`StoreRegistry`] and the built-in backends

pub mod args;
pub mod config;
pub mod error;
pub mod manifest;
pub mod registry;

pub use args::{StoreArg, StoreArgs};
pub use config::StoreConfig;
pub use error::{RegistryError, RegistryResult};
pub use manifest::{StoreDecl, StoreGraph, StoreManifest};
pub use registry::{StoreFactory, StoreRegistry};

//! Adapters that expose external state as PropSet stores.
//!
//! Both adapters implement [`PropertyStore`](propset_store::PropertyStore),
//! so they can be placed in fallback chains or behind caches like any other
//! backend.
//!
//! # Modules
//!
//! - [`bean`] -- [`BeanPropertyStore`] over the declared properties of an
//!   [`Introspect`] implementer
//! - [`entity`] -- [`EntityPropertyStore`] over an [`EntityRepository`],
//!   which persists properties keyed by entity name, entity id, and key

pub mod bean;
pub mod entity;

pub use bean::{BeanProperty, BeanPropertyStore, Introspect};
pub use entity::{
    EntityKey, EntityPropertyStore, EntityRepository, InMemoryEntityRepository,
};

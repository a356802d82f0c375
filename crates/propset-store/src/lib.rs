//! Typed property stores for PropSet.
//!
//! A property store maps string keys to values of one of eight kinds. This
//! crate defines the contract every store satisfies and the stores that make
//! up the core: a reference in-memory backend, an untyped map wrapper, a
//! fallback composite, and a caching decorator. Composites and decorators
//! implement the same trait as the backends they wrap, so they nest freely.
//!
//! # Stores
//!
//! All stores implement the [`PropertyStore`] trait:
//!
//! - [`MemoryPropertyStore`] -- `HashMap`-based reference backend
//! - [`MapPropertyStore`] -- untyped wrapper around a plain map
//! - [`AggregatePropertyStore`] -- ordered fallback chain over other stores
//! - [`CachingPropertyStore`] -- read-through/write-through cache over one store
//!
//! # Design Rules
//!
//! 1. A key keeps its kind for its whole lifetime within one store.
//! 2. Reading an absent key is not an error; per-kind getters return
//!    `false`, `0` or `None`.
//! 3. Each store instance is independently thread-safe. Composites and
//!    decorators add no locking of their own.
//! 4. All operations are synchronous and bounded only by the backend.
//! 5. Durability belongs to whichever backend is plugged in.

pub mod aggregate;
pub mod cached;
pub mod error;
pub mod map;
pub mod memory;
pub mod snapshot;
pub mod traits;
pub mod transfer;

#[cfg(test)]
mod test_support;

// Re-export primary types at crate root for ergonomic imports.
pub use aggregate::AggregatePropertyStore;
pub use cached::CachingPropertyStore;
pub use error::{StoreError, StoreResult};
pub use map::MapPropertyStore;
pub use memory::MemoryPropertyStore;
pub use snapshot::{StoreSnapshot, SNAPSHOT_VERSION};
pub use traits::PropertyStore;
pub use transfer::{collect_entries, copy_properties};

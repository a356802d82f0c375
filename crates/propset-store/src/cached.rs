//! Read-through, write-through caching decorator.
//!
//! [`CachingPropertyStore`] memoizes payload reads from a backing store in
//! an owned [`MemoryPropertyStore`]. It is only correct while this
//! decorator is the sole writer of the backing store: there is no
//! invalidation, so a value changed behind its back keeps being served from
//! the cache. Key enumeration, existence and kind queries always go to the
//! backing store and therefore never go stale.
//!
//! Preload copies each entry under the kind the backing store reports, not
//! the kind inferred from its payload: a short TEXT re-tagged as STRING
//! would make every later `get_text` of that key a kind mismatch in the cache.

use std::sync::Arc;

use propset_types::{Kind, Value};
use tracing::{debug, info};

use crate::error::StoreResult;
use crate::memory::MemoryPropertyStore;
use crate::traits::PropertyStore;
use crate::transfer::copy_properties;

/// Store that caches reads from a backing store.
///
/// The backing store is shared (it may be referenced elsewhere); the cache
/// is owned and lives exactly as long as the decorator. The decorator adds
/// no fault tolerance: every backing-store and cache error propagates.
pub struct CachingPropertyStore {
    backing: Arc<dyn PropertyStore>,
    cache: MemoryPropertyStore,
}

impl CachingPropertyStore {
    /// Wrap `backing` with an empty cache, or a fully loaded one when
    /// `preload` is set.
    pub fn new(backing: Arc<dyn PropertyStore>, preload: bool) -> StoreResult<Self> {
        Self::with_cache(backing, MemoryPropertyStore::new(), preload)
    }

    /// Wrap `backing` using `cache` as the cache store.
    ///
    /// With `preload`, every property of the backing store is copied into
    /// the cache before the decorator is returned; afterwards reads of those
    /// keys never reach the backing store.
    pub fn with_cache(
        backing: Arc<dyn PropertyStore>,
        cache: MemoryPropertyStore,
        preload: bool,
    ) -> StoreResult<Self> {
        if preload {
            let copied = copy_properties(backing.as_ref(), &cache)?;
            info!(entries = copied, "preloaded property cache");
        }
        Ok(Self { backing, cache })
    }

    /// The store of record.
    pub fn backing(&self) -> &Arc<dyn PropertyStore> {
        &self.backing
    }

    /// Number of cached entries.
    pub fn cached_len(&self) -> StoreResult<usize> {
        self.cache.len()
    }
}

impl PropertyStore for CachingPropertyStore {
    /// Cache first. On a miss the backing store is read and a present value
    /// is cached before being returned; an absent value is not cached.
    fn get_typed(&self, kind: Kind, key: &str) -> StoreResult<Option<Value>> {
        if let Some(value) = self.cache.get_typed(kind, key)? {
            return Ok(Some(value));
        }
        debug!(key, %kind, "cache miss");
        let value = self.backing.get_typed(kind, key)?;
        if let Some(ref v) = value {
            self.cache.set_typed(key, v.clone())?;
        }
        Ok(value)
    }

    /// Backing store first, then cache. A backing failure leaves the cache
    /// untouched; a cache failure after a successful backing write is
    /// reported too.
    fn set_typed(&self, key: &str, value: Value) -> StoreResult<()> {
        self.backing.set_typed(key, value.clone())?;
        self.cache.set_typed(key, value)
    }

    fn get_kind(&self, key: &str) -> StoreResult<Option<Kind>> {
        self.backing.get_kind(key)
    }

    fn keys(&self, prefix: Option<&str>, kind: Option<Kind>) -> StoreResult<Vec<String>> {
        self.backing.keys(prefix, kind)
    }

    fn exists(&self, key: &str) -> StoreResult<bool> {
        self.backing.exists(key)
    }

    /// Drops the cached entry, then removes from the backing store.
    fn remove(&self, key: &str) -> StoreResult<()> {
        self.cache.remove(key)?;
        self.backing.remove(key)
    }

    fn remove_all(&self) -> StoreResult<()> {
        self.cache.remove_all()?;
        self.backing.remove_all()
    }

    fn is_settable(&self, key: &str) -> bool {
        self.backing.is_settable(key)
    }

    fn supports_kind(&self, kind: Kind) -> bool {
        self.backing.supports_kind(kind)
    }

    fn supports_any_kind(&self) -> bool {
        self.backing.supports_any_kind()
    }
}

impl std::fmt::Debug for CachingPropertyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachingPropertyStore")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

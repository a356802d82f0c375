//! Stub stores shared by the decorator and composite tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use propset_types::{Kind, Value};

use crate::error::{StoreError, StoreResult};
use crate::memory::MemoryPropertyStore;
use crate::traits::PropertyStore;

/// Memory store that counts every call made into it.
#[derive(Default)]
pub struct CountingStore {
    pub inner: MemoryPropertyStore,
    calls: AtomicUsize,
    reads: AtomicUsize,
    remove_all_calls: AtomicUsize,
}

impl CountingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every trait call.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// `get_typed` calls only.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn remove_all_calls(&self) -> usize {
        self.remove_all_calls.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.calls.store(0, Ordering::SeqCst);
        self.reads.store(0, Ordering::SeqCst);
        self.remove_all_calls.store(0, Ordering::SeqCst);
    }

    fn tick(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

impl PropertyStore for CountingStore {
    fn get_typed(&self, kind: Kind, key: &str) -> StoreResult<Option<Value>> {
        self.tick();
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.get_typed(kind, key)
    }

    fn set_typed(&self, key: &str, value: Value) -> StoreResult<()> {
        self.tick();
        self.inner.set_typed(key, value)
    }

    fn get_kind(&self, key: &str) -> StoreResult<Option<Kind>> {
        self.tick();
        self.inner.get_kind(key)
    }

    fn keys(&self, prefix: Option<&str>, kind: Option<Kind>) -> StoreResult<Vec<String>> {
        self.tick();
        self.inner.keys(prefix, kind)
    }

    fn exists(&self, key: &str) -> StoreResult<bool> {
        self.tick();
        self.inner.exists(key)
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        self.tick();
        self.inner.remove(key)
    }

    fn remove_all(&self) -> StoreResult<()> {
        self.tick();
        self.remove_all_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.remove_all()
    }
}

/// How a [`FailingStore`] fails.
#[derive(Clone, Copy, Debug)]
pub enum Failure {
    Backend,
    KeyNotFound,
}

/// Store whose every operation fails.
pub struct FailingStore {
    failure: Failure,
    settable: bool,
    pub remove_all_calls: AtomicUsize,
}

impl FailingStore {
    pub fn new(failure: Failure) -> Self {
        Self {
            failure,
            settable: false,
            remove_all_calls: AtomicUsize::new(0),
        }
    }

    /// Report keys as settable so writes are attempted (and fail).
    pub fn settable(mut self) -> Self {
        self.settable = true;
        self
    }

    fn error(&self, key: &str) -> StoreError {
        match self.failure {
            Failure::Backend => StoreError::Backend("backend unavailable".into()),
            Failure::KeyNotFound => StoreError::KeyNotFound {
                key: key.to_string(),
            },
        }
    }
}

impl PropertyStore for FailingStore {
    fn get_typed(&self, _kind: Kind, key: &str) -> StoreResult<Option<Value>> {
        Err(self.error(key))
    }

    fn set_typed(&self, key: &str, _value: Value) -> StoreResult<()> {
        Err(self.error(key))
    }

    fn get_kind(&self, key: &str) -> StoreResult<Option<Kind>> {
        Err(self.error(key))
    }

    fn keys(&self, _prefix: Option<&str>, _kind: Option<Kind>) -> StoreResult<Vec<String>> {
        Err(self.error(""))
    }

    fn exists(&self, key: &str) -> StoreResult<bool> {
        Err(self.error(key))
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        Err(self.error(key))
    }

    fn remove_all(&self) -> StoreResult<()> {
        self.remove_all_calls.fetch_add(1, Ordering::SeqCst);
        Err(self.error(""))
    }

    fn is_settable(&self, _key: &str) -> bool {
        self.settable
    }
}

//! Store Backends Module
//!
//! The persistent key-value byte store the cache sits on, plus the in-memory
//! and "no store here" implementations.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::error::StoreError;

// == KvStore Trait ==
/// A client-scoped key-value store holding UTF-8 text.
///
/// Implementations report failures honestly; deciding what a failure means
/// for a cached read or write is the cache's job.
pub trait KvStore: Send + Sync {
    /// Returns the text stored under `key`, or `None` if nothing is stored.
    fn read(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Stores `value` under `key`, replacing any previous value.
    fn write(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Removes `key`. Removing an absent key succeeds.
    fn delete(&self, key: &str) -> Result<(), StoreError>;
}

impl<S: KvStore + ?Sized> KvStore for Arc<S> {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).read(key)
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).write(key, value)
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        (**self).delete(key)
    }
}

impl<S: KvStore + ?Sized> KvStore for Box<S> {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).read(key)
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).write(key, value)
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        (**self).delete(key)
    }
}

// == Memory Store ==
/// In-process store with an optional byte quota.
///
/// Usage is the sum of `key.len() + value.len()` over all entries. A write
/// that would take usage past the quota is rejected and changes nothing.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryInner>,
    quota_bytes: Option<usize>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    entries: HashMap<String, String>,
    used_bytes: usize,
}

impl MemoryStore {
    // == Constructor ==
    /// Creates an unbounded store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that refuses writes beyond `quota_bytes`.
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            inner: RwLock::new(MemoryInner::default()),
            quota_bytes: Some(quota_bytes),
        }
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.inner.read().map(|inner| inner.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes currently counted against the quota.
    pub fn used_bytes(&self) -> usize {
        self.inner.read().map(|inner| inner.used_bytes).unwrap_or(0)
    }
}

impl KvStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        let inner = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(inner.entries.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.write().map_err(|_| StoreError::Poisoned)?;

        let replaced = inner
            .entries
            .get(key)
            .map(|old| key.len() + old.len())
            .unwrap_or(0);
        let needed = inner.used_bytes - replaced + key.len() + value.len();

        if let Some(quota) = self.quota_bytes {
            if needed > quota {
                return Err(StoreError::QuotaExceeded { needed, quota });
            }
        }

        inner.entries.insert(key.to_string(), value.to_string());
        inner.used_bytes = needed;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        if let Some(old) = inner.entries.remove(key) {
            inner.used_bytes -= key.len() + old.len();
        }
        Ok(())
    }
}

// == Null Store ==
/// Stand-in for an execution context with no persistent store at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullStore;

impl KvStore for NullStore {
    fn read(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Err(StoreError::Unavailable)
    }

    fn write(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable)
    }

    fn delete(&self, _key: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable)
    }
}

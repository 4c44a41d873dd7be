//! TTL Cache Module
//!
//! Read-through cache of JSON values over a `KvStore`, with a fixed TTL and
//! lazy expiry.
//!
//! # Failure policy
//! The cache never reports a store failure to its caller. An unavailable
//! store, an unreadable entry or a refused write all degrade to "nothing is
//! cached": reads return `None`, writes return normally without persisting.
//! The only error that crosses the cache is the one returned by a
//! `get_or_compute` compute function, untouched.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::cache::{
    CacheEntry, CacheStats, Clock, KvStore, NullStore, SystemClock, CACHE_TTL_MS, MAX_KEY_LENGTH,
};
use crate::error::StoreError;

// == TTL Cache ==
/// Keyed cache of JSON-serializable values that expire `CACHE_TTL_MS` after
/// being written.
///
/// Build one per process and share it behind an `Arc`.
pub struct TtlCache {
    store: Box<dyn KvStore>,
    clock: Arc<dyn Clock>,
    ttl_ms: u64,
    stats: Mutex<CacheStats>,
}

impl TtlCache {
    // == Constructors ==
    /// Creates a cache over `store` using the system clock.
    pub fn new(store: impl KvStore + 'static) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    /// Creates a cache over `store` reading time from `clock`.
    pub fn with_clock(store: impl KvStore + 'static, clock: Arc<dyn Clock>) -> Self {
        Self {
            store: Box::new(store),
            clock,
            ttl_ms: CACHE_TTL_MS,
            stats: Mutex::new(CacheStats::new()),
        }
    }

    /// Creates a cache for a context with no persistent store: every read
    /// misses and every write is dropped.
    pub fn detached() -> Self {
        Self::new(NullStore)
    }

    pub fn ttl_ms(&self) -> u64 {
        self.ttl_ms
    }

    /// Snapshot of the counters.
    pub fn stats(&self) -> CacheStats {
        self.stats
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    // == Get ==
    /// Returns the value stored under `key` if it was written at most one TTL ago.
    ///
    /// An expired entry is deleted from the store as part of the read. An entry
    /// that cannot be parsed, or whose payload is not a `T`, is a miss and is
    /// left where it is.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        if !is_valid_key(key) {
            debug!(key_len = key.len(), "cache read with invalid key");
            self.record(CacheStats::record_miss);
            return None;
        }

        let raw = match self.store.read(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                self.record(CacheStats::record_miss);
                return None;
            }
            Err(err) => {
                log_store_error("read", key, &err);
                self.record(CacheStats::record_miss);
                return None;
            }
        };

        // Envelope first so expiry does not depend on the caller's type
        let entry: CacheEntry<Value> = match CacheEntry::decode(&raw) {
            Ok(entry) => entry,
            Err(err) => {
                warn!(key, error = %err, "unreadable cache entry");
                self.record(CacheStats::record_decode_failure);
                return None;
            }
        };

        let now = self.clock.now_ms();
        if entry.is_expired(now, self.ttl_ms) {
            debug!(key, age_ms = entry.age_ms(now), "cache entry expired");
            if let Err(err) = self.store.delete(key) {
                log_store_error("delete", key, &err);
            }
            self.record(CacheStats::record_expiration);
            return None;
        }

        match serde_json::from_value(entry.into_data()) {
            Ok(value) => {
                self.record(CacheStats::record_hit);
                Some(value)
            }
            Err(err) => {
                warn!(key, error = %err, "cached payload has unexpected shape");
                self.record(CacheStats::record_decode_failure);
                None
            }
        }
    }

    // == Set ==
    /// Stores `value` under `key` stamped with the current time, replacing any
    /// previous entry.
    ///
    /// If the store refuses the write, the previous entry under `key` is
    /// removed as well so that it cannot be served in place of `value`.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        if !is_valid_key(key) {
            debug!(key_len = key.len(), "cache write with invalid key dropped");
            return;
        }

        let encoded = match CacheEntry::new(value, self.clock.now_ms()).encode() {
            Ok(encoded) => encoded,
            Err(err) => {
                warn!(key, error = %err, "value could not be serialized for caching");
                self.record(CacheStats::record_write_failure);
                return;
            }
        };

        if let Err(err) = self.store.write(key, &encoded) {
            log_store_error("write", key, &err);
            self.record(CacheStats::record_write_failure);
            if !matches!(err, StoreError::Unavailable) {
                if let Err(err) = self.store.delete(key) {
                    log_store_error("delete", key, &err);
                }
            }
        }
    }

    // == Invalidate ==
    /// Removes any entry under `key`, expired or not. Absent keys are fine.
    pub fn invalidate(&self, key: &str) {
        if !is_valid_key(key) {
            return;
        }
        if let Err(err) = self.store.delete(key) {
            log_store_error("delete", key, &err);
        }
    }

    // == Get Or Compute ==
    /// Returns the cached value for `key`, or runs `compute`, caches its
    /// output and returns it.
    ///
    /// `compute` is not called on a hit. If it fails, its error is returned
    /// as-is and nothing is written.
    ///
    /// Concurrent calls for the same cold key are not coalesced: each one
    /// runs its own `compute` and writes the cache, and the last write wins.
    pub async fn get_or_compute<T, E, F, Fut>(&self, key: &str, compute: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(cached) = self.get(key) {
            return Ok(cached);
        }

        self.record(CacheStats::record_compute);
        let fresh = compute().await?;
        self.set(key, &fresh);
        Ok(fresh)
    }

    fn record(&self, update: impl FnOnce(&mut CacheStats)) {
        let mut stats = self.stats.lock().unwrap_or_else(PoisonError::into_inner);
        update(&mut *stats);
    }
}

impl std::fmt::Debug for TtlCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlCache")
            .field("ttl_ms", &self.ttl_ms)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

fn is_valid_key(key: &str) -> bool {
    !key.is_empty() && key.len() <= MAX_KEY_LENGTH
}

fn log_store_error(op: &str, key: &str, err: &StoreError) {
    match err {
        StoreError::Unavailable => debug!(op, key, "no persistent store, cache bypassed"),
        _ => warn!(op, key, error = %err, "cache store operation failed"),
    }
}

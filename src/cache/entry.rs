//! Cache Entry Module
//!
//! Defines the envelope persisted for every cached value.
//!
//! The serialized shape is fixed: `{"data": <value>, "timestamp": <ms>}`.
//! Other readers of the same store depend on it, so field names must not change.

use serde::{de::DeserializeOwned, Deserialize, Serialize};

// == Cache Entry ==
/// A cached payload and the wall-clock millisecond at which it was written.
///
/// Entries are never mutated; an overwrite replaces the whole envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    /// The cached payload
    pub data: T,
    /// Write timestamp (Unix milliseconds)
    pub timestamp: u64,
}

impl<T> CacheEntry<T> {
    // == Constructor ==
    /// Creates an entry stamped with `now_ms`.
    pub fn new(data: T, now_ms: u64) -> Self {
        Self {
            data,
            timestamp: now_ms,
        }
    }

    // == Age ==
    /// Milliseconds elapsed since the entry was written.
    ///
    /// A timestamp ahead of `now_ms` (clock moved backwards) counts as age 0.
    pub fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.timestamp)
    }

    // == Is Expired ==
    /// Checks if the entry is older than `ttl_ms`.
    ///
    /// Boundary condition: an entry whose age equals the TTL exactly is still
    /// valid; it expires one millisecond later.
    pub fn is_expired(&self, now_ms: u64, ttl_ms: u64) -> bool {
        self.age_ms(now_ms) > ttl_ms
    }

    /// Consumes the entry and returns the payload.
    pub fn into_data(self) -> T {
        self.data
    }
}

impl<T: Serialize> CacheEntry<T> {
    /// Serializes the envelope to its JSON text form.
    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl<T: DeserializeOwned> CacheEntry<T> {
    /// Parses an envelope previously produced by [`CacheEntry::encode`].
    pub fn decode(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}

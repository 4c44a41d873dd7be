//! Cache Statistics Module
//!
//! Tracks cache performance metrics including hits, misses, and expirations.

use serde::Serialize;

// == Cache Stats ==
/// Tracks cache performance metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Number of reads that returned a value
    pub hits: u64,
    /// Number of reads that returned nothing (absent, expired, unreadable)
    pub misses: u64,
    /// Number of reads that found and removed an expired entry
    pub expirations: u64,
    /// Number of stored entries that could not be decoded
    pub decode_failures: u64,
    /// Number of writes the store refused
    pub write_failures: u64,
    /// Number of times a read-through miss ran its compute function
    pub computes: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    // == Hit / Miss ==
    /// Counts a read that returned a value.
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    /// Counts a read that returned nothing.
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    // == Expiration ==
    /// Counts an expired entry; the read also counts as a miss.
    pub fn record_expiration(&mut self) {
        self.expirations += 1;
        self.misses += 1;
    }

    // == Decode Failure ==
    /// Counts an undecodable entry; the read also counts as a miss.
    pub fn record_decode_failure(&mut self) {
        self.decode_failures += 1;
        self.misses += 1;
    }

    // == Write Failure ==
    /// Counts a write the store refused or that could not be serialized.
    pub fn record_write_failure(&mut self) {
        self.write_failures += 1;
    }

    // == Compute ==
    /// Counts a read-through miss that ran its compute function.
    pub fn record_compute(&mut self) {
        self.computes += 1;
    }
}

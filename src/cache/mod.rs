//! Cache Module
//!
//! Read-through TTL cache over a persistent key-value store with lazy expiry.

mod backend;
mod clock;
mod entry;
mod file;
mod stats;
mod ttl;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use backend::{KvStore, MemoryStore, NullStore};
pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::CacheEntry;
pub use file::FileStore;
pub use stats::CacheStats;
pub use ttl::TtlCache;

// == Public Constants ==
/// Time-to-live of every cache entry in milliseconds (1 hour)
pub const CACHE_TTL_MS: u64 = 3_600_000;

/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Default store quota in bytes, sized like browser local storage
pub const DEFAULT_QUOTA_BYTES: usize = 5 * 1024 * 1024; // 5 MiB

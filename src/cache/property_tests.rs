//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check freshness, expiry, invalidation and degradation
//! over arbitrary keys, payloads and operation sequences.

use proptest::prelude::*;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

use crate::cache::{
    Clock, KvStore, ManualClock, MemoryStore, NullStore, TtlCache, CACHE_TTL_MS, MAX_KEY_LENGTH,
};

const T0: u64 = 1_700_000_000_000;

// == Strategies ==
/// Generates valid cache keys (non-empty, within length limit)
fn valid_key_strategy() -> impl Strategy<Value = String> {
    "[a-z]{1,12}(_[a-z0-9]{1,8})?".prop_map(|s| s)
}

/// Generates JSON payloads shaped like site content listings
fn payload_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| json!(n)),
        "[a-zA-Z0-9 ]{0,32}".prop_map(Value::String),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::hash_map("[a-z_]{1,8}", inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: Value },
    Get { key: String },
    Invalidate { key: String },
    Advance { ms: u64 },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    // Small key space so operations collide
    let key = "[abc]";
    prop_oneof![
        (key, payload_strategy()).prop_map(|(key, value)| CacheOp::Set { key, value }),
        key.prop_map(|key| CacheOp::Get { key }),
        key.prop_map(|key| CacheOp::Invalidate { key }),
        (0u64..CACHE_TTL_MS / 2).prop_map(|ms| CacheOp::Advance { ms }),
    ]
}

fn fixture() -> (TtlCache, Arc<MemoryStore>, Arc<ManualClock>) {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::new(T0));
    let cache = TtlCache::with_clock(Arc::clone(&store), clock.clone());
    (cache, store, clock)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // A value is readable immediately after it is written.
    #[test]
    fn prop_fresh_after_set(key in valid_key_strategy(), value in payload_strategy()) {
        let (cache, _, _) = fixture();

        cache.set(&key, &value);

        prop_assert_eq!(cache.get::<Value>(&key), Some(value));
    }

    // Within the TTL the value is a hit, one millisecond past it a miss.
    #[test]
    fn prop_expiry_window(
        key in valid_key_strategy(),
        value in payload_strategy(),
        elapsed in 0u64..=CACHE_TTL_MS
    ) {
        let (cache, _, clock) = fixture();
        cache.set(&key, &value);

        clock.set(T0 + elapsed);
        prop_assert_eq!(cache.get::<Value>(&key), Some(value));

        clock.set(T0 + CACHE_TTL_MS + 1);
        prop_assert_eq!(cache.get::<Value>(&key), None);
    }

    // Invalidation wins over freshness.
    #[test]
    fn prop_invalidate_removes(
        key in valid_key_strategy(),
        value in payload_strategy(),
        elapsed in 0u64..CACHE_TTL_MS
    ) {
        let (cache, store, clock) = fixture();
        cache.set(&key, &value);
        clock.advance(elapsed);

        cache.invalidate(&key);

        prop_assert_eq!(cache.get::<Value>(&key), None);
        prop_assert_eq!(store.read(&key).unwrap(), None);
    }

    // The last write to a key is the one read back.
    #[test]
    fn prop_overwrite_semantics(
        key in valid_key_strategy(),
        first in payload_strategy(),
        second in payload_strategy()
    ) {
        let (cache, store, _) = fixture();

        cache.set(&key, &first);
        cache.set(&key, &second);

        prop_assert_eq!(cache.get::<Value>(&key), Some(second));
        prop_assert_eq!(store.len(), 1);
    }

    // Random operation sequences agree with a simple model.
    #[test]
    fn prop_matches_model(ops in prop::collection::vec(cache_op_strategy(), 1..60)) {
        let (cache, _, clock) = fixture();
        let mut model: HashMap<String, (Value, u64)> = HashMap::new();

        for op in ops {
            match op {
                CacheOp::Set { key, value } => {
                    cache.set(&key, &value);
                    model.insert(key, (value, clock.now_ms()));
                }
                CacheOp::Get { key } => {
                    let now = clock.now_ms();
                    let expected = model
                        .get(&key)
                        .filter(|(_, at)| now - *at <= CACHE_TTL_MS)
                        .map(|(value, _)| value.clone());
                    if expected.is_none() {
                        model.remove(&key);
                    }
                    prop_assert_eq!(cache.get::<Value>(&key), expected);
                }
                CacheOp::Invalidate { key } => {
                    cache.invalidate(&key);
                    model.remove(&key);
                }
                CacheOp::Advance { ms } => clock.advance(ms),
            }
        }

        let stats = cache.stats();
        prop_assert!(stats.hit_rate() >= 0.0 && stats.hit_rate() <= 1.0);
    }

    // With no persistent store everything misses and nothing panics.
    #[test]
    fn prop_detached_always_misses(key in valid_key_strategy(), value in payload_strategy()) {
        let cache = TtlCache::with_clock(NullStore, Arc::new(ManualClock::new(T0)));

        cache.set(&key, &value);
        prop_assert_eq!(cache.get::<Value>(&key), None);
        cache.invalidate(&key);
        prop_assert_eq!(cache.get::<Value>(&key), None);
    }

    // A write the store refuses never leaves an old value readable.
    #[test]
    fn prop_quota_failure_never_serves_stale(
        key in valid_key_strategy(),
        small in "[a-z]{1,8}",
        big_len in 200usize..2000
    ) {
        let store = Arc::new(MemoryStore::with_quota(128));
        let cache = TtlCache::with_clock(Arc::clone(&store), Arc::new(ManualClock::new(T0)));

        cache.set(&key, &small);
        prop_assert_eq!(cache.get::<String>(&key), Some(small));

        cache.set(&key, &"x".repeat(big_len));
        prop_assert_eq!(cache.get::<String>(&key), None);
        prop_assert_eq!(cache.stats().write_failures, 1);
    }
}

// == Additional Unit Tests for Edge Cases ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_length_limit() {
        let (cache, store, _) = fixture();
        let at_limit = "k".repeat(MAX_KEY_LENGTH);
        let over_limit = "k".repeat(MAX_KEY_LENGTH + 1);

        cache.set(&at_limit, &1);
        cache.set(&over_limit, &2);

        assert_eq!(cache.get::<i32>(&at_limit), Some(1));
        assert_eq!(cache.get::<i32>(&over_limit), None);
        assert_eq!(store.len(), 1);
    }
}

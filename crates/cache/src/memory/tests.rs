//! Tests for the memory tier

use super::*;
use crate::clock::{Clock, ManualClock};
use crate::serialization::default_codec;
use proptest::prelude::*;
use std::sync::Arc;

fn tier(
    max_entries: usize,
    max_bytes: u64,
    strategy: EvictionStrategy,
) -> (MemoryTier<String>, ManualClock) {
    let clock = ManualClock::default();
    let tier = MemoryTier::new(
        MemoryTierConfig {
            max_entries,
            max_bytes,
            strategy,
        },
        default_codec(),
        Arc::new(clock.clone()),
    );
    (tier, clock)
}

fn put(tier: &MemoryTier<String>, key: &str, value: &str) -> bool {
    tier.put(key, value.to_string(), None, Metadata::new())
}

#[test]
fn test_basic_operations() {
    let (tier, _) = tier(10, 1024, EvictionStrategy::Lru);

    assert!(put(&tier, "key1", "value1"));
    assert_eq!(tier.get("key1"), Some("value1".to_string()));
    assert_eq!(tier.get("key2"), None);

    let stats = tier.stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.entry_count, 1);
    // bincode: 8-byte length prefix plus the bytes
    assert_eq!(stats.size_bytes, 8 + 6);
    assert!((stats.hit_rate - 0.5).abs() < f64::EPSILON);
}

#[test]
fn test_access_count_increments_on_hit() {
    let (tier, _) = tier(10, 1024, EvictionStrategy::Lru);
    put(&tier, "k", "v");
    tier.get("k");
    tier.get("k");
    assert_eq!(tier.peek("k").unwrap().access_count, 2);
    // peek leaves stats alone
    assert_eq!(tier.stats().hits, 2);
}

#[test]
fn test_lru_evicts_first_inserted() {
    let (tier, _) = tier(3, 1024, EvictionStrategy::Lru);
    for key in ["a", "b", "c", "d"] {
        assert!(put(&tier, key, key));
    }

    assert!(!tier.contains("a"));
    for key in ["b", "c", "d"] {
        assert!(tier.contains(key));
    }
    assert_eq!(tier.stats().evictions, 1);
}

#[test]
fn test_lru_respects_reads() {
    let (tier, _) = tier(3, 1024, EvictionStrategy::Lru);
    put(&tier, "a", "1");
    put(&tier, "b", "2");
    put(&tier, "c", "3");
    tier.get("a");
    put(&tier, "d", "4");

    assert!(tier.contains("a"));
    assert!(!tier.contains("b"));
}

#[test]
fn test_lfu_evicts_lowest_count() {
    let (tier, _) = tier(3, 1024, EvictionStrategy::Lfu);
    put(&tier, "a", "1");
    put(&tier, "b", "2");
    put(&tier, "c", "3");
    for _ in 0..3 {
        tier.get("a");
    }
    tier.get("b");
    tier.get("b");
    tier.get("c");

    put(&tier, "d", "4");
    assert!(!tier.contains("c"));
    assert!(tier.contains("a") && tier.contains("b") && tier.contains("d"));
}

#[test]
fn test_fifo_ignores_reads() {
    let (tier, _) = tier(2, 1024, EvictionStrategy::Fifo);
    put(&tier, "a", "1");
    put(&tier, "b", "2");
    tier.get("a");
    put(&tier, "c", "3");

    assert!(!tier.contains("a"));
    assert!(tier.contains("b"));
}

#[test]
fn test_ttl_strategy_prefers_expired() {
    let (tier, clock) = tier(3, 1024, EvictionStrategy::Ttl);
    put(&tier, "stable", "1");
    tier.put("brief", "2".to_string(), Some(Duration::from_secs(1)), Metadata::new());
    put(&tier, "other", "3");

    clock.advance(Duration::from_secs(2));
    put(&tier, "new", "4");

    // "stable" is least recently used, but "brief" has already expired
    assert!(tier.contains("stable"));
    assert!(tier.peek("brief").is_none());
    assert_eq!(tier.len(), 3);
}

#[test]
fn test_ttl_expiry_on_read() {
    let (tier, clock) = tier(10, 1024, EvictionStrategy::Lru);
    assert!(tier.put("k", "v".to_string(), Some(Duration::from_secs(1)), Metadata::new()));

    assert_eq!(tier.get("k"), Some("v".to_string()));
    clock.advance(Duration::from_millis(1100));
    assert_eq!(tier.get("k"), None);

    let stats = tier.stats();
    assert_eq!(stats.entry_count, 0);
    assert_eq!(stats.size_bytes, 0);
    assert_eq!(stats.expirations, 1);
    assert_eq!(stats.misses, 1);
}

#[test]
fn test_entry_larger_than_capacity_is_rejected() {
    let (tier, _) = tier(10, 16, EvictionStrategy::Lru);
    put(&tier, "small", "x");

    assert!(!put(&tier, "big", &"y".repeat(64)));
    // Nothing was flushed to make room for an entry that could never fit
    assert!(tier.contains("small"));
    assert_eq!(tier.stats().evictions, 0);
    assert_eq!(tier.stats().errors, 0);

    let err = tier
        .try_put("big", "y".repeat(64), None, Metadata::new())
        .unwrap_err();
    assert!(err.is_capacity());
}

#[test]
fn test_zero_capacity_tier_stores_nothing() {
    let (tier, _) = tier(0, 1024, EvictionStrategy::Lru);
    assert!(!put(&tier, "k", "v"));
    assert!(tier.is_empty());
}

#[test]
fn test_overwrite_replaces_without_eviction() {
    let (tier, _) = tier(2, 1024, EvictionStrategy::Lru);
    put(&tier, "a", "1");
    put(&tier, "b", "2");
    assert!(put(&tier, "a", "longer value"));

    assert_eq!(tier.len(), 2);
    assert_eq!(tier.stats().evictions, 0);
    assert_eq!(tier.stats().size_bytes, (8 + 12) + (8 + 1));
    assert_eq!(tier.get("a"), Some("longer value".to_string()));
}

#[test]
fn test_byte_budget_evicts_multiple() {
    // Each "xxxxxxxx" value is 16 bytes encoded
    let (tier, _) = tier(100, 48, EvictionStrategy::Lru);
    for key in ["a", "b", "c"] {
        put(&tier, key, "xxxxxxxx");
    }
    assert!(put(&tier, "d", &"z".repeat(24)));

    let stats = tier.stats();
    assert_eq!(stats.evictions, 2);
    assert!(stats.size_bytes <= 48);
    assert!(tier.contains("c") && tier.contains("d"));
}

#[test]
fn test_metadata_is_kept() {
    let (tier, _) = tier(10, 1024, EvictionStrategy::Lru);
    let metadata: Metadata = [("origin".to_string(), "report".to_string())].into();
    tier.put("k", "v".to_string(), None, metadata.clone());
    assert_eq!(tier.peek("k").unwrap().metadata, metadata);
}

#[test]
fn test_purge_expired_and_clear() {
    let (tier, clock) = tier(10, 1024, EvictionStrategy::Lru);
    tier.put("a", "1".to_string(), Some(Duration::from_secs(1)), Metadata::new());
    tier.put("b", "2".to_string(), Some(Duration::from_secs(10)), Metadata::new());
    put(&tier, "c", "3");

    clock.advance(Duration::from_secs(5));
    assert_eq!(tier.purge_expired(), 1);
    assert_eq!(tier.len(), 2);

    tier.get("b");
    tier.clear();
    assert_eq!(tier.stats(), TierStats::default());
    assert!(!tier.contains("c"));
}

#[test]
fn test_remove_is_not_an_eviction() {
    let (tier, _) = tier(10, 1024, EvictionStrategy::Lfu);
    put(&tier, "a", "1");
    assert!(tier.remove("a"));
    assert!(!tier.remove("a"));
    assert_eq!(tier.stats().evictions, 0);
    assert_eq!(tier.stats().size_bytes, 0);
}

#[test]
fn test_created_at_uses_injected_clock() {
    let (tier, clock) = tier(10, 1024, EvictionStrategy::Lru);
    let start = clock.now();
    put(&tier, "k", "v");
    assert_eq!(tier.peek("k").unwrap().created_at, start);
}

fn any_strategy() -> impl Strategy<Value = EvictionStrategy> {
    prop_oneof![
        Just(EvictionStrategy::Lru),
        Just(EvictionStrategy::Lfu),
        Just(EvictionStrategy::Fifo),
        Just(EvictionStrategy::Ttl),
    ]
}

proptest! {
    #[test]
    fn proptest_bounds_hold_after_every_put(
        strategy in any_strategy(),
        max_entries in 0usize..8,
        max_bytes in 0u64..200,
        ops in prop::collection::vec((0u8..12, 0usize..40, any::<bool>()), 1..80)
    ) {
        let (tier, _) = tier(max_entries, max_bytes, strategy);

        for (key, len, read) in ops {
            let key = format!("k{key}");
            tier.put(&key, "v".repeat(len), None, Metadata::new());
            if read {
                tier.get(&key);
            }

            let stats = tier.stats();
            prop_assert!(stats.entry_count as usize <= max_entries);
            prop_assert!(stats.size_bytes <= max_bytes);
        }
    }
}

#[test]
fn test_unrepresentable_ttl_is_accepted_by_every_strategy() {
    for strategy in [
        EvictionStrategy::Lru,
        EvictionStrategy::Lfu,
        EvictionStrategy::Fifo,
        EvictionStrategy::Ttl,
    ] {
        let (tier, clock) = tier(2, 1024, strategy);

        assert!(tier.put("k", "v".to_string(), Some(Duration::MAX), Metadata::new()));
        clock.advance(Duration::from_secs(86_400 * 365));
        assert_eq!(tier.get("k"), Some("v".to_string()), "{strategy:?}");

        // Still evictable when capacity runs out
        put(&tier, "a", "1");
        put(&tier, "b", "2");
        assert_eq!(tier.stats().entry_count, 2, "{strategy:?}");
    }
}

//! Tests for the orchestrator

use super::*;
use crate::clock::{Clock, ManualClock, SharedClock};
use crate::config::{CacheConfig, DiskTierConfig, MemoryTierConfig};
use crate::entry::Metadata;
use crate::warming::{ProducerError, SharedProducer};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn config(dir: &Path) -> CacheConfig {
    CacheConfig {
        memory: MemoryTierConfig {
            max_entries: 100,
            max_bytes: 1024 * 1024,
            ..Default::default()
        },
        disk: Some(DiskTierConfig::new(dir)),
        ..Default::default()
    }
}

fn open(config: CacheConfig, clock: &ManualClock) -> CacheOrchestrator<String> {
    let shared: SharedClock = Arc::new(clock.clone());
    CacheOrchestrator::builder(config)
        .with_clock(shared)
        .build()
        .unwrap()
}

fn put(cache: &CacheOrchestrator<String>, key: &str, value: &str) -> bool {
    cache.put(key, value.to_string(), None, Metadata::new())
}

#[test]
fn test_memory_hit_is_counted() {
    let temp_dir = TempDir::new().unwrap();
    let cache = open(config(temp_dir.path()), &ManualClock::default());

    assert!(put(&cache, "k", "v"));
    assert_eq!(cache.get("k"), Some("v".to_string()));
    assert_eq!(cache.get("missing"), None);

    let stats = cache.stats();
    assert_eq!(stats.overall.total_requests, 2);
    assert_eq!(stats.overall.memory_hits, 1);
    assert_eq!(stats.overall.misses, 1);
    assert_eq!(stats.overall.hit_rate, 0.5);
    assert!(stats.overall.avg_latency_us >= 0.0);
    assert_eq!(stats.disk.unwrap().entry_count, 1);
}

#[test]
fn test_disk_hit_is_promoted() {
    let temp_dir = TempDir::new().unwrap();
    let cache = open(config(temp_dir.path()), &ManualClock::default());

    assert!(put(&cache, "k", "v"));
    cache.memory().remove("k");

    assert_eq!(cache.get("k"), Some("v".to_string()));
    assert!(cache.memory().contains("k"));

    // With disk out of the path the value must now come from memory
    cache.set_disk_enabled(false);
    assert!(!cache.is_disk_enabled());
    assert_eq!(cache.get("k"), Some("v".to_string()));

    let overall = cache.stats().overall;
    assert_eq!(overall.disk_hits, 1);
    assert_eq!(overall.memory_hits, 1);
}

#[test]
fn test_promotion_keeps_remaining_ttl_and_metadata() {
    let temp_dir = TempDir::new().unwrap();
    let clock = ManualClock::default();
    let cache = open(config(temp_dir.path()), &clock);

    let mut metadata = Metadata::new();
    metadata.insert("tag".to_string(), "x".to_string());
    cache.put("k", "v".to_string(), Some(Duration::from_secs(100)), metadata.clone());
    cache.memory().remove("k");

    clock.advance(Duration::from_secs(40));
    assert_eq!(cache.get("k"), Some("v".to_string()));

    let promoted = cache.memory().peek("k").unwrap();
    assert_eq!(promoted.remaining_ttl(clock.now()), Some(Duration::from_secs(60)));
    assert_eq!(promoted.metadata, metadata);

    clock.advance(Duration::from_secs(60));
    assert_eq!(cache.get("k"), None);
}

#[test]
fn test_put_succeeds_when_only_disk_accepts() {
    let temp_dir = TempDir::new().unwrap();
    let mut cfg = config(temp_dir.path());
    cfg.memory.max_entries = 0;
    let cache = open(cfg, &ManualClock::default());

    let outcome = cache.put_detailed("k", "v".to_string(), None, Metadata::new());
    assert_eq!(outcome, PutOutcome { memory: false, disk: true });
    assert!(outcome.any());
    assert!(!outcome.all());

    assert_eq!(cache.get("k"), Some("v".to_string()));
    assert_eq!(cache.stats().overall.disk_hits, 1);
}

#[test]
fn test_put_succeeds_when_only_memory_accepts() {
    let temp_dir = TempDir::new().unwrap();
    let mut cfg = config(temp_dir.path());
    if let Some(disk) = cfg.disk.as_mut() {
        disk.max_bytes = 16;
    }
    let cache = open(cfg, &ManualClock::default());

    let outcome = cache.put_detailed("k", "value".to_string(), None, Metadata::new());
    assert_eq!(outcome, PutOutcome { memory: true, disk: false });
    assert!(put(&cache, "k2", "value"));
}

#[test]
fn test_memory_only_configuration() {
    let cfg = CacheConfig {
        disk: None,
        ..Default::default()
    };
    let cache = open(cfg, &ManualClock::default());

    assert!(put(&cache, "k", "v"));
    assert_eq!(cache.get("k"), Some("v".to_string()));
    assert!(cache.disk().is_none());
    assert!(cache.stats().disk.is_none());
    assert_eq!(cache.reconcile().unwrap(), crate::storage::ReconcileReport::default());
}

#[test]
fn test_clear_empties_tiers_and_counters() {
    let temp_dir = TempDir::new().unwrap();
    let cache = open(config(temp_dir.path()), &ManualClock::default());

    put(&cache, "a", "1");
    put(&cache, "b", "2");
    cache.get("a");
    cache.get("zzz");

    cache.clear();

    let stats = cache.stats();
    assert_eq!(stats.overall, OverallStats::default());
    assert_eq!(stats.memory.entry_count, 0);
    assert_eq!(stats.disk.unwrap().entry_count, 0);
    assert_eq!(cache.get("a"), None);
}

#[test]
fn test_remove_and_purge() {
    let temp_dir = TempDir::new().unwrap();
    let clock = ManualClock::default();
    let cache = open(config(temp_dir.path()), &clock);

    put(&cache, "keep", "1");
    cache.put("short", "2".to_string(), Some(Duration::from_secs(5)), Metadata::new());

    assert!(cache.remove("keep"));
    assert!(!cache.remove("keep"));

    clock.advance(Duration::from_secs(5));
    // One entry in each tier
    assert_eq!(cache.purge_expired(), 2);
}

#[test]
fn test_warm_now_uses_producer() {
    let temp_dir = TempDir::new().unwrap();
    let clock = ManualClock::default();
    let producer: SharedProducer<String> =
        Arc::new(|key: &str| -> Result<Option<String>, ProducerError> {
            Ok(Some(format!("warm:{key}")))
        });
    let shared: SharedClock = Arc::new(clock.clone());
    let cache: CacheOrchestrator<String> = CacheOrchestrator::builder(config(temp_dir.path()))
        .with_clock(shared)
        .with_producer(producer)
        .build()
        .unwrap();

    for _ in 0..3 {
        assert_eq!(cache.get("hot"), None);
        clock.advance(Duration::from_secs(30));
    }

    assert_eq!(cache.warm_now(), 1);
    let entry = cache.memory().peek("hot").unwrap();
    assert_eq!(entry.value, "warm:hot");
    assert_eq!(entry.ttl, Some(Duration::from_secs(3600)));
    assert!(cache.disk().unwrap().contains("hot"));
    assert_eq!(cache.stats().warming.total_warmed, 1);
}

#[test]
fn test_start_stop_and_drop_stop_warming() {
    let temp_dir = TempDir::new().unwrap();
    let cache = open(config(temp_dir.path()), &ManualClock::default());

    assert!(cache.start_warming());
    assert!(cache.stats().warming.active);
    assert!(cache.stop_warming());
    assert!(!cache.stats().warming.active);

    assert!(cache.start_warming());
    drop(cache);
}

#[test]
fn test_invalid_config_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let mut cfg = config(temp_dir.path());
    cfg.warming.top_n_candidates = 0;

    let err = CacheOrchestrator::<String>::new(cfg).unwrap_err();
    assert!(matches!(err, crate::errors::CacheError::Configuration { .. }));
}

#[test]
fn test_unrepresentable_ttl_survives_promotion() {
    let temp_dir = TempDir::new().unwrap();
    let clock = ManualClock::default();
    let cache = open(config(temp_dir.path()), &clock);

    let outcome = cache.put_detailed("k", "v".to_string(), Some(Duration::MAX), Metadata::new());
    assert!(outcome.all());

    cache.memory().clear();
    clock.advance(Duration::from_secs(86_400 * 365));
    assert_eq!(cache.get("k"), Some("v".to_string()));
    assert_eq!(cache.stats().overall.disk_hits, 1);
    assert_eq!(cache.get("k"), Some("v".to_string()));
    assert_eq!(cache.stats().overall.memory_hits, 1);
}

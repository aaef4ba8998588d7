//! Tests for cache warming

use super::core::{CacheWarmer, ProducerError, SharedProducer, WarmTarget};
use super::types::WarmingConfig;
use crate::clock::{ManualClock, SharedClock};
use crossbeam::channel;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Default)]
struct RecordingTarget {
    stored: Mutex<HashMap<String, (String, Duration)>>,
}

impl WarmTarget<String> for RecordingTarget {
    fn contains_in_memory(&self, key: &str) -> bool {
        self.stored.lock().contains_key(key)
    }

    fn put_warm(&self, key: &str, value: String, ttl: Duration) -> bool {
        self.stored.lock().insert(key.to_string(), (value, ttl));
        true
    }
}

fn echo_producer() -> SharedProducer<String> {
    Arc::new(|key: &str| -> Result<Option<String>, ProducerError> {
        Ok(Some(format!("value-of-{key}")))
    })
}

fn warmer_with(
    config: WarmingConfig,
    producer: Option<SharedProducer<String>>,
) -> (CacheWarmer<String>, ManualClock) {
    let clock = ManualClock::default();
    let shared: SharedClock = Arc::new(clock.clone());
    (CacheWarmer::new(config, shared, producer), clock)
}

fn hammer(warmer: &CacheWarmer<String>, clock: &ManualClock, key: &str, times: usize) {
    for _ in 0..times {
        warmer.record_access(key);
        clock.advance(Duration::from_secs(60));
    }
}

#[test]
fn test_hot_absent_key_is_warmed_with_default_ttl() {
    let (warmer, clock) = warmer_with(WarmingConfig::default(), Some(echo_producer()));
    let target = RecordingTarget::default();

    hammer(&warmer, &clock, "hot", 5);
    assert_eq!(warmer.analyze_and_warm(&target), 1);

    let stored = target.stored.lock();
    let (value, ttl) = stored.get("hot").unwrap();
    assert_eq!(value, "value-of-hot");
    assert_eq!(*ttl, Duration::from_secs(3600));

    let stats = warmer.stats();
    assert_eq!(stats.total_warmed, 1);
    assert_eq!(stats.warming_cycles, 1);
    assert_eq!(stats.patterns_tracked, 1);
    assert_eq!(stats.warming_candidates, 1);
}

#[test]
fn test_present_keys_are_not_rewarmed() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counted = Arc::clone(&calls);
    let producer: SharedProducer<String> =
        Arc::new(move |key: &str| -> Result<Option<String>, ProducerError> {
            counted.fetch_add(1, Ordering::SeqCst);
            Ok(Some(key.to_string()))
        });
    let (warmer, clock) = warmer_with(WarmingConfig::default(), Some(producer));
    let target = RecordingTarget::default();

    hammer(&warmer, &clock, "hot", 5);
    assert_eq!(warmer.analyze_and_warm(&target), 1);
    assert_eq!(warmer.analyze_and_warm(&target), 0);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_top_n_limits_producer_calls() {
    let config = WarmingConfig {
        top_n_candidates: 2,
        ..Default::default()
    };
    let (warmer, clock) = warmer_with(config, Some(echo_producer()));
    let target = RecordingTarget::default();

    for key in ["a", "b", "c", "d"] {
        warmer.record_access(key);
        warmer.record_access(key);
    }
    clock.advance(Duration::from_secs(1));

    assert_eq!(warmer.analyze_and_warm(&target), 2);
    assert_eq!(target.stored.lock().len(), 2);
    assert_eq!(warmer.stats().warming_candidates, 4);
}

#[test]
fn test_cold_keys_are_ignored() {
    let (warmer, clock) = warmer_with(WarmingConfig::default(), Some(echo_producer()));
    let target = RecordingTarget::default();

    warmer.record_access("once");
    hammer(&warmer, &clock, "stale", 5);
    clock.advance(Duration::from_secs(2 * 3600));

    assert_eq!(warmer.analyze_and_warm(&target), 0);
    assert!(target.stored.lock().is_empty());
}

#[test]
fn test_old_samples_are_pruned() {
    let (warmer, clock) = warmer_with(WarmingConfig::default(), None);
    let target = RecordingTarget::default();

    hammer(&warmer, &clock, "k", 3);
    clock.advance(Duration::from_secs(25 * 3600));
    warmer.analyze_and_warm(&target);

    assert_eq!(warmer.stats().patterns_tracked, 0);
}

#[test]
fn test_idle_keys_age_out_without_analysis() {
    let (warmer, clock) = warmer_with(WarmingConfig::default(), None);

    for i in 0..50_000 {
        warmer.record_access(&format!("key-{i}"));
    }
    assert_eq!(warmer.stats().patterns_tracked, 50_000);

    clock.advance(Duration::from_secs(48 * 3600));
    warmer.record_access("fresh");

    assert_eq!(warmer.stats().patterns_tracked, 1);
    assert_eq!(warmer.stats().warming_cycles, 0);
}

#[test]
fn test_recording_drops_stale_samples_of_the_key() {
    let (warmer, clock) = warmer_with(WarmingConfig::default(), None);

    hammer(&warmer, &clock, "k", 3);
    clock.advance(Duration::from_secs(25 * 3600));
    warmer.record_access("k");

    assert_eq!(warmer.tracked_samples("k"), 1);
}

#[test]
fn test_samples_per_key_are_bounded() {
    let config = WarmingConfig {
        max_samples_per_key: 3,
        ..Default::default()
    };
    let (warmer, _clock) = warmer_with(config, None);
    for _ in 0..10 {
        warmer.record_access("k");
    }
    assert_eq!(warmer.tracked_samples("k"), 3);
}

#[test]
fn test_producer_failures_are_skipped() {
    let producer: SharedProducer<String> =
        Arc::new(|key: &str| -> Result<Option<String>, ProducerError> {
            match key {
                "broken" => Err("backend unavailable".into()),
                "declined" => Ok(None),
                _ => Ok(Some(key.to_string())),
            }
        });
    let (warmer, clock) = warmer_with(WarmingConfig::default(), Some(producer));
    let target = RecordingTarget::default();

    for key in ["broken", "declined", "fine"] {
        warmer.record_access(key);
        warmer.record_access(key);
    }
    clock.advance(Duration::from_secs(1));

    assert_eq!(warmer.analyze_and_warm(&target), 1);
    assert!(target.stored.lock().contains_key("fine"));
    assert_eq!(warmer.stats().producer_failures, 2);
}

#[test]
fn test_without_producer_nothing_is_written() {
    let (warmer, clock) = warmer_with(WarmingConfig::default(), None);
    let target = RecordingTarget::default();

    hammer(&warmer, &clock, "hot", 5);
    assert_eq!(warmer.analyze_and_warm(&target), 0);
    assert!(target.stored.lock().is_empty());
    assert_eq!(warmer.stats().warming_cycles, 1);
}

#[test]
fn test_start_and_stop_background_loop() {
    let config = WarmingConfig {
        interval_secs: 3600,
        ..Default::default()
    };
    let (warmer, _clock) = warmer_with(config, Some(echo_producer()));
    let warmer = Arc::new(warmer);
    let target = Arc::new(RecordingTarget::default());

    assert!(warmer.start(Arc::clone(&target)));
    assert!(!warmer.start(Arc::clone(&target)));
    assert!(warmer.stats().active);

    // Stop interrupts the sleep rather than waiting out the interval
    assert!(warmer.stop());
    assert!(!warmer.stop());
    assert!(!warmer.stats().active);
    assert_eq!(warmer.stats().warming_cycles, 0);
}

#[test]
fn test_disabled_warmer_does_not_start() {
    let config = WarmingConfig {
        enabled: false,
        ..Default::default()
    };
    let (warmer, _clock) = warmer_with(config, Some(echo_producer()));
    let warmer = Arc::new(warmer);

    assert!(!warmer.start(Arc::new(RecordingTarget::default())));
    assert!(!warmer.is_active());
}

/// Counts warming writes landing before and after `stop` returned
#[derive(Default)]
struct StopAwareTarget {
    stop_returned: AtomicBool,
    before_stop: AtomicUsize,
    after_stop: AtomicUsize,
}

impl WarmTarget<String> for StopAwareTarget {
    fn contains_in_memory(&self, _key: &str) -> bool {
        false
    }

    fn put_warm(&self, _key: &str, _value: String, _ttl: Duration) -> bool {
        if self.stop_returned.load(Ordering::SeqCst) {
            self.after_stop.fetch_add(1, Ordering::SeqCst);
        } else {
            self.before_stop.fetch_add(1, Ordering::SeqCst);
        }
        true
    }
}

#[test]
fn test_stop_waits_for_in_flight_pass() {
    let (entered_tx, entered_rx) = channel::unbounded::<()>();
    let (release_tx, release_rx) = channel::unbounded::<()>();
    let producer: SharedProducer<String> =
        Arc::new(move |key: &str| -> Result<Option<String>, ProducerError> {
            let _ = entered_tx.send(());
            // Blocks until released; once the sender is dropped this returns at once
            let _ = release_rx.recv();
            Ok(Some(key.to_string()))
        });

    let config = WarmingConfig {
        interval_secs: 1,
        ..Default::default()
    };
    let (warmer, _clock) = warmer_with(config, Some(producer));
    let warmer = Arc::new(warmer);
    let target = Arc::new(StopAwareTarget::default());

    warmer.record_access("hot");
    warmer.record_access("hot");
    assert!(warmer.start(Arc::clone(&target)));

    // The background pass is now parked inside the producer
    entered_rx
        .recv_timeout(Duration::from_secs(10))
        .expect("background pass never reached the producer");

    let stopper = {
        let warmer = Arc::clone(&warmer);
        let target = Arc::clone(&target);
        thread::spawn(move || {
            assert!(warmer.stop());
            target.stop_returned.store(true, Ordering::SeqCst);
        })
    };

    thread::sleep(Duration::from_millis(200));
    assert!(!stopper.is_finished(), "stop returned while a pass was in flight");
    assert!(!target.stop_returned.load(Ordering::SeqCst));

    drop(release_tx);
    stopper.join().unwrap();

    assert_eq!(target.before_stop.load(Ordering::SeqCst), 1);
    assert_eq!(warmer.stats().warming_cycles, 1);
    assert!(!warmer.is_active());

    // Several intervals later nothing else has been written
    thread::sleep(Duration::from_millis(2500));
    assert_eq!(target.after_stop.load(Ordering::SeqCst), 0);
    assert_eq!(target.before_stop.load(Ordering::SeqCst), 1);
    assert_eq!(warmer.stats().warming_cycles, 1);
}

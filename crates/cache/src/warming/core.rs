//! Core cache warming engine

use super::candidates::select;
use super::tracker::AccessTracker;
use super::types::{WarmingConfig, WarmingStats};
use crate::clock::SharedClock;
use crossbeam::channel::{self, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Error type a [`ValueProducer`] may fail with
pub type ProducerError = Box<dyn std::error::Error + Send + Sync>;

/// Host-supplied source of values for predicted keys
///
/// `Ok(None)` declines the key. Errors are logged and the key is skipped
/// for this pass; neither outcome is surfaced to cache callers.
pub trait ValueProducer<V>: Send + Sync {
    fn produce(&self, key: &str) -> Result<Option<V>, ProducerError>;
}

impl<V, F> ValueProducer<V> for F
where
    F: Fn(&str) -> Result<Option<V>, ProducerError> + Send + Sync,
{
    fn produce(&self, key: &str) -> Result<Option<V>, ProducerError> {
        self(key)
    }
}

/// Shared producer handle
pub type SharedProducer<V> = Arc<dyn ValueProducer<V>>;

/// Where warmed values are written
pub trait WarmTarget<V>: Send + Sync {
    /// Whether `key` is already live in the fast tier
    fn contains_in_memory(&self, key: &str) -> bool;

    /// Store a warmed value; `false` if no tier accepted it
    fn put_warm(&self, key: &str, value: V, ttl: Duration) -> bool;
}

struct WarmingWorker {
    stop: Sender<()>,
    handle: JoinHandle<()>,
}

#[derive(Debug, Default)]
struct WarmingCounters {
    warming_candidates: u64,
    total_warmed: u64,
    warming_cycles: u64,
    producer_failures: u64,
    last_warming: Option<std::time::SystemTime>,
}

/// Cache warming engine
pub struct CacheWarmer<V> {
    config: WarmingConfig,
    clock: SharedClock,
    producer: Option<SharedProducer<V>>,
    tracker: Mutex<AccessTracker>,
    counters: Mutex<WarmingCounters>,
    // Serialises passes so a manual pass never interleaves with the loop
    pass: Mutex<()>,
    worker: Mutex<Option<WarmingWorker>>,
}

impl<V> CacheWarmer<V>
where
    V: Send + 'static,
{
    pub fn new(config: WarmingConfig, clock: SharedClock, producer: Option<SharedProducer<V>>) -> Self {
        Self {
            tracker: Mutex::new(AccessTracker::new(config.max_samples_per_key)),
            config,
            clock,
            producer,
            counters: Mutex::new(WarmingCounters::default()),
            pass: Mutex::new(()),
            worker: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &WarmingConfig {
        &self.config
    }

    pub fn has_producer(&self) -> bool {
        self.producer.is_some()
    }

    /// Record an access for tracking
    pub fn record_access(&self, key: &str) {
        let now = self.clock.now();
        self.tracker.lock().record_access(key, now);
    }

    /// Run one analysis pass and warm the selected keys; returns how many were stored
    pub fn analyze_and_warm(&self, target: &dyn WarmTarget<V>) -> usize {
        let _pass = self.pass.lock();
        let now = self.clock.now();

        let candidates = {
            let mut tracker = self.tracker.lock();
            tracker.prune(now);
            tracker.candidates(now)
        };
        let found = candidates.len() as u64;
        let selected = select(candidates, self.config.top_n_candidates, |key| {
            target.contains_in_memory(key)
        });

        let mut warmed = 0;
        let mut failures = 0;

        match &self.producer {
            Some(producer) => {
                let ttl = self.config.default_ttl();
                for candidate in &selected {
                    match producer.produce(&candidate.key) {
                        Ok(Some(value)) => {
                            if target.put_warm(&candidate.key, value, ttl) {
                                warmed += 1;
                                tracing::debug!(
                                    key = %candidate.key,
                                    priority = candidate.priority,
                                    "warmed cache entry"
                                );
                            }
                        }
                        Ok(None) => {
                            failures += 1;
                            tracing::debug!(key = %candidate.key, "value producer declined key");
                        }
                        Err(e) => {
                            failures += 1;
                            tracing::debug!(key = %candidate.key, error = %e, "value producer failed");
                        }
                    }
                }
            }
            None if !selected.is_empty() => {
                tracing::debug!(
                    candidates = selected.len(),
                    "no value producer configured, skipping warming"
                );
            }
            None => {}
        }

        let mut counters = self.counters.lock();
        counters.warming_candidates = found;
        counters.total_warmed += warmed as u64;
        counters.warming_cycles += 1;
        counters.producer_failures += failures;
        counters.last_warming = Some(now);

        if warmed > 0 {
            tracing::info!("Warmed {} cache entries", warmed);
        }
        warmed
    }

    /// Start the background loop; `false` if it is already running or disabled
    pub fn start<T>(self: &Arc<Self>, target: Arc<T>) -> bool
    where
        T: WarmTarget<V> + 'static,
    {
        if !self.config.enabled {
            tracing::debug!("cache warming disabled by configuration");
            return false;
        }

        let mut worker = self.worker.lock();
        if worker.is_some() {
            return false;
        }

        let (stop, stopped) = channel::bounded::<()>(1);
        let interval = self.config.interval();
        let warmer = Arc::clone(self);

        let spawned = thread::Builder::new()
            .name("tiercache-warmer".to_string())
            .spawn(move || loop {
                match stopped.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        warmer.analyze_and_warm(target.as_ref());
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            });

        match spawned {
            Ok(handle) => {
                *worker = Some(WarmingWorker { stop, handle });
                tracing::info!(interval_secs = self.config.interval_secs, "Started cache warming");
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to spawn warming thread");
                false
            }
        }
    }

    /// Stop the background loop, waiting for an in-flight pass to finish
    ///
    /// No warming write happens after this returns.
    pub fn stop(&self) -> bool {
        let Some(worker) = self.worker.lock().take() else {
            return false;
        };

        let _ = worker.stop.send(());
        if worker.handle.thread().id() == thread::current().id() {
            // Called from inside a pass; the loop exits once it returns
            return true;
        }
        if worker.handle.join().is_err() {
            tracing::warn!("warming thread panicked");
        }
        tracing::info!("Stopped cache warming");
        true
    }

    pub fn is_active(&self) -> bool {
        self.worker.lock().is_some()
    }

    #[cfg(test)]
    pub(crate) fn tracked_samples(&self, key: &str) -> usize {
        self.tracker.lock().samples(key)
    }

    /// Forget all recorded accesses
    pub fn reset(&self) {
        self.tracker.lock().clear();
    }

    pub fn stats(&self) -> WarmingStats {
        let patterns_tracked = self.tracker.lock().len() as u64;
        let counters = self.counters.lock();
        WarmingStats {
            active: self.is_active(),
            patterns_tracked,
            warming_candidates: counters.warming_candidates,
            total_warmed: counters.total_warmed,
            warming_cycles: counters.warming_cycles,
            producer_failures: counters.producer_failures,
            last_warming: counters.last_warming,
        }
    }
}

impl<V> std::fmt::Debug for CacheWarmer<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheWarmer")
            .field("config", &self.config)
            .field("has_producer", &self.producer.is_some())
            .field("active", &self.worker.lock().is_some())
            .finish()
    }
}

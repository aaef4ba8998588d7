//! Lookup, store and maintenance operations

use super::types::{CacheOrchestrator, OrchestratorInner, PutOutcome};
use crate::config::CacheConfig;
use crate::entry::Metadata;
use crate::errors::Result;
use crate::memory::MemoryTier;
use crate::storage::{DiskTier, ReconcileReport};
use crate::warming::WarmTarget;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

impl<V> OrchestratorInner<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// The disk tier, unless absent or switched off
    fn active_disk(&self) -> Option<&DiskTier<V>> {
        self.disk
            .as_ref()
            .filter(|_| self.disk_enabled.load(Ordering::Acquire))
    }

    fn get(&self, key: &str) -> Option<V> {
        let started = Instant::now();

        if self.config.warming.enabled {
            self.warmer.record_access(key);
        }

        let found = self.lookup(key);
        self.stats.record_latency(started.elapsed());
        found
    }

    fn lookup(&self, key: &str) -> Option<V> {
        if let Some(value) = self.memory.get(key) {
            self.stats.record_memory_hit();
            return Some(value);
        }

        let Some(entry) = self.active_disk().and_then(|disk| disk.get_entry(key)) else {
            self.stats.record_miss();
            return None;
        };

        self.stats.record_disk_hit();

        // Promoted copies expire when the disk entry would have
        let remaining = entry.remaining_ttl(self.clock.now());
        if !self
            .memory
            .put(key, entry.value.clone(), remaining, entry.metadata)
        {
            tracing::debug!(key, "disk hit not promoted to memory");
        }
        Some(entry.value)
    }

    fn put(&self, key: &str, value: V, ttl: Option<Duration>, metadata: Metadata) -> PutOutcome {
        let disk = self
            .active_disk()
            .is_some_and(|disk| disk.put(key, &value, ttl, metadata.clone()));
        let memory = self.memory.put(key, value, ttl, metadata);

        let outcome = PutOutcome { memory, disk };
        if !outcome.any() {
            tracing::debug!(key, "no tier accepted entry");
        }
        outcome
    }
}

impl<V> WarmTarget<V> for OrchestratorInner<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn contains_in_memory(&self, key: &str) -> bool {
        self.memory.contains(key)
    }

    fn put_warm(&self, key: &str, value: V, ttl: Duration) -> bool {
        self.put(key, value, Some(ttl), Metadata::new()).any()
    }
}

impl<V> CacheOrchestrator<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Look up `key`: memory first, then disk with promotion on a hit
    pub fn get(&self, key: &str) -> Option<V> {
        self.inner.get(key)
    }

    /// Store `value` in every active tier; `true` if at least one accepted it
    pub fn put(&self, key: &str, value: V, ttl: Option<Duration>, metadata: Metadata) -> bool {
        self.inner.put(key, value, ttl, metadata).any()
    }

    /// Like [`put`](Self::put), reporting each tier separately
    pub fn put_detailed(
        &self,
        key: &str,
        value: V,
        ttl: Option<Duration>,
        metadata: Metadata,
    ) -> PutOutcome {
        self.inner.put(key, value, ttl, metadata)
    }

    /// Drop `key` from both tiers
    pub fn remove(&self, key: &str) -> bool {
        let memory = self.inner.memory.remove(key);
        let disk = self
            .inner
            .active_disk()
            .is_some_and(|disk| disk.remove(key));
        memory || disk
    }

    /// Empty both tiers and reset lookup counters
    pub fn clear(&self) {
        self.inner.memory.clear();
        if let Some(disk) = &self.inner.disk {
            if let Err(e) = disk.clear() {
                tracing::warn!(error = %e, "failed to clear disk tier");
            }
        }
        self.inner.stats.reset();
        tracing::info!("All caches cleared");
    }

    /// Eagerly drop expired entries from both tiers
    pub fn purge_expired(&self) -> usize {
        let memory = self.inner.memory.purge_expired();
        let disk = self
            .inner
            .active_disk()
            .map_or(0, |disk| disk.purge_expired());
        memory + disk
    }

    /// Repair divergence between the disk index and payload files
    pub fn reconcile(&self) -> Result<ReconcileReport> {
        match &self.inner.disk {
            Some(disk) => disk.reconcile(),
            None => Ok(ReconcileReport::default()),
        }
    }

    /// Start the background warming loop; `false` if disabled or already running
    pub fn start_warming(&self) -> bool {
        self.inner.warmer.start(Arc::clone(&self.inner))
    }

    /// Stop the warming loop; no warming write happens after this returns
    pub fn stop_warming(&self) -> bool {
        self.inner.warmer.stop()
    }

    /// Run one warming pass on the calling thread
    pub fn warm_now(&self) -> usize {
        self.inner.warmer.analyze_and_warm(self.inner.as_ref())
    }

    /// Take the disk tier in or out of the read/write path
    pub fn set_disk_enabled(&self, enabled: bool) {
        if self.inner.disk.is_some() {
            self.inner.disk_enabled.store(enabled, Ordering::Release);
            tracing::info!(enabled, "Disk tier toggled");
        }
    }

    pub fn is_disk_enabled(&self) -> bool {
        self.inner.active_disk().is_some()
    }

    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    pub fn memory(&self) -> &MemoryTier<V> {
        &self.inner.memory
    }

    pub fn disk(&self) -> Option<&DiskTier<V>> {
        self.inner.disk.as_ref()
    }
}

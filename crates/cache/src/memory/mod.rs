//! In-process memory tier
//!
//! A bounded map guarded by a single lock. Capacity is enforced on both entry
//! count and summed encoded size; the configured [`EvictionPolicy`] picks the
//! victim whenever a `put` would overflow either bound.

use crate::clock::SharedClock;
use crate::config::MemoryTierConfig;
use crate::entry::{CacheEntry, Metadata};
use crate::errors::{CacheError, RecoveryHint, Result};
use crate::eviction::{create_eviction_policy, EvictionPolicy, EvictionStrategy};
use crate::serialization::SharedCodec;
use crate::stats::{TierCounters, TierStats};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;

/// Bounded in-memory key/value store with a pluggable eviction strategy
pub struct MemoryTier<V> {
    config: MemoryTierConfig,
    codec: SharedCodec<V>,
    clock: SharedClock,
    inner: Mutex<MemoryInner<V>>,
}

struct MemoryInner<V> {
    entries: HashMap<String, CacheEntry<V>>,
    policy: Box<dyn EvictionPolicy>,
    current_bytes: u64,
    counters: TierCounters,
}

impl<V> MemoryInner<V> {
    fn remove_entry(&mut self, key: &str) -> Option<CacheEntry<V>> {
        let entry = self.entries.remove(key)?;
        self.policy.on_remove(key);
        self.current_bytes = self.current_bytes.saturating_sub(entry.size_bytes);
        Some(entry)
    }

    fn is_over(&self, config: &MemoryTierConfig, incoming: u64) -> bool {
        self.entries.len() >= config.max_entries
            || self.current_bytes + incoming > config.max_bytes
    }
}

impl<V> MemoryTier<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new(config: MemoryTierConfig, codec: SharedCodec<V>, clock: SharedClock) -> Self {
        tracing::info!(
            max_entries = config.max_entries,
            max_bytes = config.max_bytes,
            strategy = %config.strategy,
            "Initializing memory tier"
        );

        Self {
            inner: Mutex::new(MemoryInner {
                entries: HashMap::new(),
                policy: create_eviction_policy(config.strategy),
                current_bytes: 0,
                counters: TierCounters::default(),
            }),
            config,
            codec,
            clock,
        }
    }

    pub fn config(&self) -> &MemoryTierConfig {
        &self.config
    }

    pub fn strategy(&self) -> EvictionStrategy {
        self.config.strategy
    }

    /// Look up `key`, counting a hit or miss
    ///
    /// An expired entry is removed and reported as a miss.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        let mut inner = self.inner.lock();

        let expired = match inner.entries.get(key) {
            Some(entry) => entry.is_expired(now),
            None => {
                inner.counters.misses += 1;
                tracing::debug!(key, "memory tier miss");
                return None;
            }
        };

        if expired {
            inner.remove_entry(key);
            inner.counters.misses += 1;
            inner.counters.expirations += 1;
            tracing::debug!(key, "memory tier entry expired");
            return None;
        }

        inner.policy.on_access(key);
        inner.counters.hits += 1;
        let entry = inner.entries.get_mut(key)?;
        entry.access_count += 1;
        Some(entry.value.clone())
    }

    /// Store `value`, evicting as needed; `false` if it cannot fit
    pub fn put(
        &self,
        key: &str,
        value: V,
        ttl: Option<Duration>,
        metadata: Metadata,
    ) -> bool {
        match self.try_put(key, value, ttl, metadata) {
            Ok(()) => true,
            Err(e) => {
                if !e.is_capacity() {
                    self.inner.lock().counters.errors += 1;
                }
                tracing::debug!(key, error = %e, "memory tier rejected entry");
                false
            }
        }
    }

    /// Store `value`, reporting why it was rejected
    pub fn try_put(
        &self,
        key: &str,
        value: V,
        ttl: Option<Duration>,
        metadata: Metadata,
    ) -> Result<()> {
        let size_bytes = self
            .codec
            .encoded_len(&value)
            .map_err(|e| e.with_key(key))?;

        if self.config.max_entries == 0 || size_bytes > self.config.max_bytes {
            return Err(CacheError::CapacityExceeded {
                requested_bytes: size_bytes,
                available_bytes: self.config.max_bytes,
                recovery_hint: RecoveryHint::IncreaseCapacity {
                    suggested_bytes: size_bytes,
                },
            });
        }

        let now = self.clock.now();
        let mut inner = self.inner.lock();

        // Overwrites release the old entry's budget first
        inner.remove_entry(key);

        while inner.is_over(&self.config, size_bytes) {
            let victim = match inner.policy.next_eviction(now) {
                Some(victim) => victim,
                None => {
                    return Err(CacheError::CapacityExceeded {
                        requested_bytes: size_bytes,
                        available_bytes: self.config.max_bytes.saturating_sub(inner.current_bytes),
                        recovery_hint: RecoveryHint::IncreaseCapacity {
                            suggested_bytes: inner.current_bytes + size_bytes,
                        },
                    });
                }
            };

            if let Some(evicted) = inner.remove_entry(&victim) {
                inner.counters.evictions += 1;
                tracing::debug!(
                    key = %victim,
                    size_bytes = evicted.size_bytes,
                    strategy = %self.config.strategy,
                    "memory tier evicted entry"
                );
            } else {
                // Policy tracked a key the map no longer holds
                inner.policy.on_remove(&victim);
            }
        }

        let entry = CacheEntry::new(key, value, now, ttl, size_bytes, metadata);
        inner.policy.on_insert(key, entry.expires_at());
        inner.current_bytes += size_bytes;
        inner.entries.insert(key.to_string(), entry);
        Ok(())
    }

    /// Drop `key` if present; not counted as an eviction
    pub fn remove(&self, key: &str) -> bool {
        self.inner.lock().remove_entry(key).is_some()
    }

    /// Whether a live entry exists, without touching stats or ordering
    pub fn contains(&self, key: &str) -> bool {
        let now = self.clock.now();
        self.inner
            .lock()
            .entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired(now))
    }

    /// Copy of a live entry, without touching stats or ordering
    pub fn peek(&self, key: &str) -> Option<CacheEntry<V>> {
        let now = self.clock.now();
        self.inner
            .lock()
            .entries
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .cloned()
    }

    /// Eagerly remove every expired entry; returns how many were dropped
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut inner = self.inner.lock();

        let expired: Vec<String> = inner
            .entries
            .values()
            .filter(|entry| entry.is_expired(now))
            .map(|entry| entry.key.clone())
            .collect();

        for key in &expired {
            inner.remove_entry(key);
        }
        inner.counters.expirations += expired.len() as u64;
        expired.len()
    }

    /// Remove all entries and reset counters
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.policy.clear();
        inner.current_bytes = 0;
        inner.counters = TierCounters::default();
    }

    pub fn stats(&self) -> TierStats {
        let inner = self.inner.lock();
        inner
            .counters
            .snapshot(inner.current_bytes, inner.entries.len() as u64)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V> std::fmt::Debug for MemoryTier<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("MemoryTier")
            .field("strategy", &self.config.strategy)
            .field("entry_count", &inner.entries.len())
            .field("current_bytes", &inner.current_bytes)
            .finish()
    }
}

#[cfg(test)]
mod tests;

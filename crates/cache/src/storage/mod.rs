//! Persistent disk tier
//!
//! Each value lives in its own payload file (header + optionally zstd
//! compressed bytes, CRC32C checked). A SQLite index maps keys to payload
//! files and carries creation time, TTL, size and metadata. The index is the
//! source of truth: files it does not reference are swept, and references to
//! missing or corrupt files are dropped on read.

mod compression;
mod files;
mod format;
mod index;

pub use compression::CompressionConfig;
pub use format::{
    PayloadHeader, DEFAULT_COMPRESSION_LEVEL, HEADER_SIZE, INDEX_FILE, PAYLOAD_EXTENSION,
    PAYLOAD_MAGIC, STORAGE_VERSION,
};

use crate::clock::SharedClock;
use crate::config::DiskTierConfig;
use crate::entry::{is_expired, CacheEntry, Metadata};
use crate::errors::{CacheError, RecoveryHint, Result};
use crate::serialization::SharedCodec;
use crate::stats::{TierCounters, TierStats};
use index::{DiskIndex, IndexRecord};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// What a [`DiskTier::reconcile`] pass repaired
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileReport {
    /// Payload and temp files no index row pointed at
    pub orphan_files_removed: usize,
    /// Index rows whose payload file was gone
    pub dangling_records_removed: usize,
}

/// Bounded on-disk key/value store
pub struct DiskTier<V> {
    config: DiskTierConfig,
    directory: PathBuf,
    compression: CompressionConfig,
    codec: SharedCodec<V>,
    clock: SharedClock,
    inner: Mutex<DiskInner>,
}

struct DiskInner {
    index: DiskIndex,
    counters: TierCounters,
    // Last totals read successfully, reported when the index is unreadable
    last_totals: (u64, u64),
}

impl<V> DiskTier<V>
where
    V: Send + Sync + 'static,
{
    /// Open (or create) the tier rooted at `config.directory`
    ///
    /// Fails if the directory or index cannot be opened; a cache that
    /// silently ran without its disk tier would hide misconfiguration.
    pub fn open(config: DiskTierConfig, codec: SharedCodec<V>, clock: SharedClock) -> Result<Self> {
        let directory = files::ensure_dir(&config.directory)?;
        let index = DiskIndex::open(&directory.join(INDEX_FILE))?;

        let known = Self::known_handles(&index)?;
        let swept = files::sweep_orphans(&directory, &known)?;
        let last_totals = index.totals()?;

        tracing::info!(
            directory = %directory.display(),
            max_bytes = config.max_bytes,
            compression = config.compression_enabled,
            entries = last_totals.0,
            size_bytes = last_totals.1,
            orphans_removed = swept,
            "Opened disk tier"
        );

        Ok(Self {
            compression: CompressionConfig::from(&config),
            config,
            directory,
            codec,
            clock,
            inner: Mutex::new(DiskInner {
                index,
                counters: TierCounters::default(),
                last_totals,
            }),
        })
    }

    pub fn config(&self) -> &DiskTierConfig {
        &self.config
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Look up `key`, counting a hit or miss
    pub fn get(&self, key: &str) -> Option<V> {
        self.get_entry(key).map(|entry| entry.value)
    }

    /// Look up `key` together with its creation time, TTL and metadata
    ///
    /// Expired, missing or unreadable payloads are removed and reported as
    /// misses; failures other than expiry also count as errors.
    pub fn get_entry(&self, key: &str) -> Option<CacheEntry<V>> {
        let now = self.clock.now();
        let mut inner = self.inner.lock();

        let record = match inner.index.get(key) {
            Ok(Some(record)) => record,
            Ok(None) => {
                inner.counters.misses += 1;
                tracing::debug!(key, "disk tier miss");
                return None;
            }
            Err(e) => {
                inner.counters.misses += 1;
                inner.counters.errors += 1;
                if e.is_corruption() {
                    tracing::warn!(key, error = %e, "dropping unreadable disk index row");
                    self.drop_key(&mut inner, key);
                } else {
                    tracing::warn!(key, error = %e, "disk index lookup failed");
                }
                return None;
            }
        };

        if is_expired(record.created_at, record.ttl, now) {
            self.drop_record(&mut inner, key, &record.handle);
            inner.counters.misses += 1;
            inner.counters.expirations += 1;
            tracing::debug!(key, "disk tier entry expired");
            return None;
        }

        match self.load_value(key, &record.handle) {
            Ok(value) => {
                if let Err(e) = inner.index.record_hit(key) {
                    tracing::warn!(key, error = %e, "failed to record disk hit");
                }
                inner.counters.hits += 1;
                Some(CacheEntry {
                    key: record.key,
                    value,
                    created_at: record.created_at,
                    access_count: record.access_count + 1,
                    ttl: record.ttl,
                    size_bytes: record.size_bytes,
                    metadata: record.metadata,
                })
            }
            Err(e) => {
                inner.counters.misses += 1;
                inner.counters.errors += 1;
                match &e {
                    CacheError::Io { .. } => {
                        tracing::warn!(key, error = %e, "disk tier read failed");
                    }
                    _ => {
                        tracing::warn!(key, error = %e, "dropping unreadable disk entry");
                        self.drop_record(&mut inner, key, &record.handle);
                    }
                }
                None
            }
        }
    }

    fn load_value(&self, key: &str, handle: &str) -> Result<V> {
        let bytes = files::read(&self.directory, handle)?.ok_or_else(|| CacheError::Corruption {
            key: key.to_string(),
            reason: format!("payload file '{handle}' is missing"),
            recovery_hint: RecoveryHint::Ignore,
        })?;

        let (header, payload) = format::decode_file(key, &bytes)?;
        let encoded = CompressionConfig::decompress(payload, header.is_compressed())?;
        if encoded.len() as u64 != header.uncompressed_size {
            return Err(CacheError::Corruption {
                key: key.to_string(),
                reason: format!(
                    "Decompressed size mismatch: expected {}, got {}",
                    header.uncompressed_size,
                    encoded.len()
                ),
                recovery_hint: RecoveryHint::ClearAndRetry,
            });
        }
        self.codec.decode(&encoded).map_err(|e| e.with_key(key))
    }

    /// Store `value`; `false` if it was rejected or the write failed
    pub fn put(&self, key: &str, value: &V, ttl: Option<Duration>, metadata: Metadata) -> bool {
        match self.try_put(key, value, ttl, metadata) {
            Ok(()) => true,
            Err(e) => {
                if e.is_capacity() {
                    tracing::debug!(key, error = %e, "disk tier rejected entry");
                } else {
                    self.inner.lock().counters.errors += 1;
                    tracing::warn!(key, error = %e, "disk tier write failed");
                }
                false
            }
        }
    }

    /// Store `value`, evicting the oldest entries until it fits
    pub fn try_put(
        &self,
        key: &str,
        value: &V,
        ttl: Option<Duration>,
        metadata: Metadata,
    ) -> Result<()> {
        let encoded = self.codec.encode(value).map_err(|e| e.with_key(key))?;
        let (payload, compressed) = self.compression.compress(&encoded)?;
        let file = format::encode_file(encoded.len() as u64, &payload, compressed)?;
        let size_bytes = file.len() as u64;

        if size_bytes > self.config.max_bytes {
            return Err(CacheError::DiskQuotaExceeded {
                current: 0,
                requested: size_bytes,
                limit: self.config.max_bytes,
                recovery_hint: RecoveryHint::IncreaseCapacity {
                    suggested_bytes: size_bytes,
                },
            });
        }

        let now = self.clock.now();
        let mut inner = self.inner.lock();

        // The entry being replaced does not count against the new one
        let mut current = inner.index.total_size_except(key)?;
        while current + size_bytes > self.config.max_bytes {
            let Some(victim) = inner.index.oldest_except(key)? else {
                break;
            };
            inner.index.remove(&victim.key)?;
            if let Err(e) = files::remove(&self.directory, &victim.handle) {
                tracing::warn!(key = %victim.key, error = %e, "failed to remove evicted payload");
            }
            current = current.saturating_sub(victim.size_bytes);
            inner.counters.evictions += 1;
            tracing::debug!(
                key = %victim.key,
                size_bytes = victim.size_bytes,
                "disk tier evicted entry"
            );
        }

        let handle = files::new_handle();
        files::write_atomic(&self.directory, &handle, &file)?;

        let record = IndexRecord {
            key: key.to_string(),
            handle: handle.clone(),
            created_at: now,
            ttl,
            size_bytes,
            access_count: 0,
            metadata,
        };

        match inner.index.upsert(&record) {
            Ok(Some(previous)) => {
                if let Err(e) = files::remove(&self.directory, &previous) {
                    tracing::warn!(key, error = %e, "failed to remove replaced payload");
                }
            }
            Ok(None) => {}
            Err(e) => {
                let _ = files::remove(&self.directory, &handle);
                return Err(e);
            }
        }

        tracing::trace!(key, size_bytes, compressed, "disk tier stored entry");
        Ok(())
    }

    /// Drop `key` if present; not counted as an eviction
    pub fn remove(&self, key: &str) -> bool {
        let mut inner = self.inner.lock();
        match inner.index.remove(key) {
            Ok(Some(handle)) => {
                if let Err(e) = files::remove(&self.directory, &handle) {
                    tracing::warn!(key, error = %e, "failed to remove payload");
                }
                true
            }
            Ok(None) => false,
            Err(e) => {
                inner.counters.errors += 1;
                tracing::warn!(key, error = %e, "disk index remove failed");
                false
            }
        }
    }

    /// Whether a live entry is indexed, without touching stats or reading the payload
    pub fn contains(&self, key: &str) -> bool {
        let now = self.clock.now();
        matches!(
            self.inner.lock().index.get(key),
            Ok(Some(record)) if !is_expired(record.created_at, record.ttl, now)
        )
    }

    /// Eagerly remove every expired entry; returns how many were dropped
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut inner = self.inner.lock();

        let expired = match inner.index.expired(now) {
            Ok(expired) => expired,
            Err(e) => {
                inner.counters.errors += 1;
                tracing::warn!(error = %e, "disk expiry scan failed");
                return 0;
            }
        };

        let mut removed = 0;
        for entry in &expired {
            if self.drop_record(&mut inner, &entry.key, &entry.handle) {
                removed += 1;
            }
        }
        inner.counters.expirations += removed as u64;
        removed
    }

    /// Drop index rows whose payload file vanished and sweep unreferenced files
    pub fn reconcile(&self) -> Result<ReconcileReport> {
        let mut inner = self.inner.lock();
        let mut report = ReconcileReport::default();

        for entry in inner.index.all()? {
            if !self.directory.join(&entry.handle).exists() {
                inner.index.remove(&entry.key)?;
                report.dangling_records_removed += 1;
                tracing::debug!(key = %entry.key, "removed dangling index record");
            }
        }

        let known = Self::known_handles(&inner.index)?;
        report.orphan_files_removed = files::sweep_orphans(&self.directory, &known)?;

        tracing::info!(
            orphan_files_removed = report.orphan_files_removed,
            dangling_records_removed = report.dangling_records_removed,
            "Reconciled disk tier"
        );
        Ok(report)
    }

    /// Remove every entry and payload file, and reset counters
    pub fn clear(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.index.clear()?;
        files::sweep_orphans(&self.directory, &HashSet::new())?;
        inner.counters = TierCounters::default();
        inner.last_totals = (0, 0);
        Ok(())
    }

    pub fn stats(&self) -> TierStats {
        let mut inner = self.inner.lock();
        match inner.index.totals() {
            Ok(totals) => inner.last_totals = totals,
            Err(e) => tracing::warn!(error = %e, "disk index totals unavailable"),
        }
        let (entry_count, size_bytes) = inner.last_totals;
        inner.counters.snapshot(size_bytes, entry_count)
    }

    pub fn len(&self) -> usize {
        self.stats().entry_count as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn drop_record(&self, inner: &mut DiskInner, key: &str, handle: &str) -> bool {
        let removed = match inner.index.remove(key) {
            Ok(removed) => removed.is_some(),
            Err(e) => {
                inner.counters.errors += 1;
                tracing::warn!(key, error = %e, "failed to drop disk index record");
                return false;
            }
        };
        if let Err(e) = files::remove(&self.directory, handle) {
            tracing::warn!(key, error = %e, "failed to remove payload");
        }
        removed
    }

    /// Drop the row for `key` when only the key is known
    fn drop_key(&self, inner: &mut DiskInner, key: &str) {
        match inner.index.remove(key) {
            Ok(Some(handle)) => {
                if let Err(e) = files::remove(&self.directory, &handle) {
                    tracing::warn!(key, error = %e, "failed to remove payload");
                }
            }
            Ok(None) => {}
            Err(e) => {
                inner.counters.errors += 1;
                tracing::warn!(key, error = %e, "failed to drop disk index record");
            }
        }
    }

    fn known_handles(index: &DiskIndex) -> Result<HashSet<String>> {
        Ok(index.all()?.into_iter().map(|entry| entry.handle).collect())
    }
}

impl<V> std::fmt::Debug for DiskTier<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiskTier")
            .field("directory", &self.directory)
            .field("max_bytes", &self.config.max_bytes)
            .field("compression", &self.compression.enabled)
            .finish()
    }
}

//! Orchestrator statistics

use super::types::CacheOrchestrator;
use crate::stats::{ratio, TierStats};
use crate::warming::WarmingStats;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Lookup counters kept by the orchestrator itself
#[derive(Debug, Default)]
pub(super) struct LookupStats {
    pub total_requests: AtomicU64,
    pub memory_hits: AtomicU64,
    pub disk_hits: AtomicU64,
    pub misses: AtomicU64,
    pub total_latency_nanos: AtomicU64,
}

impl LookupStats {
    pub fn record_memory_hit(&self) {
        self.memory_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_disk_hit(&self) {
        self.disk_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_latency(&self, elapsed: Duration) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.total_latency_nanos.fetch_add(
            u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX),
            Ordering::Relaxed,
        );
    }

    pub fn reset(&self) {
        for counter in [
            &self.total_requests,
            &self.memory_hits,
            &self.disk_hits,
            &self.misses,
            &self.total_latency_nanos,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }

    fn snapshot(&self) -> OverallStats {
        let total_requests = self.total_requests.load(Ordering::Relaxed);
        let memory_hits = self.memory_hits.load(Ordering::Relaxed);
        let disk_hits = self.disk_hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total_latency_nanos = self.total_latency_nanos.load(Ordering::Relaxed);

        let avg_latency_us = if total_requests == 0 {
            0.0
        } else {
            total_latency_nanos as f64 / total_requests as f64 / 1_000.0
        };

        OverallStats {
            total_requests,
            memory_hits,
            disk_hits,
            misses,
            hit_rate: ratio(memory_hits + disk_hits, total_requests),
            memory_hit_rate: ratio(memory_hits, total_requests),
            disk_hit_rate: ratio(disk_hits, total_requests),
            avg_latency_us,
        }
    }
}

/// Lookup totals across both tiers
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallStats {
    pub total_requests: u64,
    pub memory_hits: u64,
    pub disk_hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub memory_hit_rate: f64,
    pub disk_hit_rate: f64,
    /// Mean wall-clock duration of `get`, in microseconds
    pub avg_latency_us: f64,
}

/// Snapshot of every counter the cache keeps
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorStats {
    pub overall: OverallStats,
    pub memory: TierStats,
    /// `None` when no disk tier is configured
    pub disk: Option<TierStats>,
    pub warming: WarmingStats,
}

impl<V> CacheOrchestrator<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Read-only snapshot; never changes cache contents
    pub fn stats(&self) -> OrchestratorStats {
        OrchestratorStats {
            overall: self.inner.stats.snapshot(),
            memory: self.inner.memory.stats(),
            disk: self.inner.disk.as_ref().map(|disk| disk.stats()),
            warming: self.inner.warmer.stats(),
        }
    }
}

//! Statistics snapshots

use serde::{Deserialize, Serialize};

/// Point-in-time counters for one tier
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    /// Entries dropped because their TTL elapsed
    pub expirations: u64,
    /// Absorbed failures (I/O, index, codec, corruption)
    pub errors: u64,
    pub size_bytes: u64,
    pub entry_count: u64,
    pub hit_rate: f64,
}

/// Monotonic counters kept alongside a tier's data, under the tier's lock
#[derive(Debug, Default, Clone)]
pub(crate) struct TierCounters {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub errors: u64,
}

impl TierCounters {
    pub fn snapshot(&self, size_bytes: u64, entry_count: u64) -> TierStats {
        TierStats {
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
            expirations: self.expirations,
            errors: self.errors,
            size_bytes,
            entry_count,
            hit_rate: hit_rate(self.hits, self.misses),
        }
    }
}

/// `hits / (hits + misses)`, zero before the first request
pub fn hit_rate(hits: u64, misses: u64) -> f64 {
    ratio(hits, hits + misses)
}

pub(crate) fn ratio(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}

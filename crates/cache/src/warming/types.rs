//! Types and configuration for cache warming

use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime};

/// Cache warming configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarmingConfig {
    /// Whether the background loop may be started
    pub enabled: bool,
    /// Seconds between analysis passes
    pub interval_secs: u64,
    /// Maximum keys handed to the value producer per pass
    pub top_n_candidates: usize,
    /// TTL given to warmed entries so stale predictions expire
    pub default_ttl_secs: u64,
    /// Access timestamps kept per key
    pub max_samples_per_key: usize,
}

impl Default for WarmingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 300, // 5 minutes
            top_n_candidates: 10,
            default_ttl_secs: 3600, // 1 hour
            max_samples_per_key: 1024,
        }
    }
}

impl WarmingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_secs)
    }
}

/// Warming statistics
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarmingStats {
    /// Background loop is running
    pub active: bool,
    /// Keys with at least one access in the window
    pub patterns_tracked: u64,
    /// Candidates found by the most recent pass
    pub warming_candidates: u64,
    pub total_warmed: u64,
    pub warming_cycles: u64,
    /// Producer errors and declined keys
    pub producer_failures: u64,
    pub last_warming: Option<SystemTime>,
}

/// A key predicted to be requested soon
#[derive(Debug, Clone, PartialEq)]
pub struct WarmingCandidate {
    pub key: String,
    /// Accesses per hour over the sample window
    pub frequency: f64,
    /// Time since the last access
    pub recency: Duration,
    pub priority: f64,
}

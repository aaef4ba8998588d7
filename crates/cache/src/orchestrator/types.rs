//! Orchestrator types

use super::statistics::LookupStats;
use crate::clock::SharedClock;
use crate::config::CacheConfig;
use crate::memory::MemoryTier;
use crate::storage::DiskTier;
use crate::warming::CacheWarmer;
use serde::{Deserialize, Serialize};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Multi-tier cache: memory in front of disk, with predictive warming
///
/// Dropping the orchestrator stops the warming loop.
pub struct CacheOrchestrator<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub(super) inner: Arc<OrchestratorInner<V>>,
}

pub(super) struct OrchestratorInner<V> {
    pub config: CacheConfig,
    pub clock: SharedClock,
    pub memory: MemoryTier<V>,
    pub disk: Option<DiskTier<V>>,
    /// Runtime switch taking the disk tier out of the read/write path
    pub disk_enabled: AtomicBool,
    pub warmer: Arc<CacheWarmer<V>>,
    pub stats: LookupStats,
}

/// Which tiers accepted a `put`
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PutOutcome {
    pub memory: bool,
    pub disk: bool,
}

impl PutOutcome {
    /// At least one tier holds the value
    pub fn any(&self) -> bool {
        self.memory || self.disk
    }

    pub fn all(&self) -> bool {
        self.memory && self.disk
    }
}

impl<V> Drop for CacheOrchestrator<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn drop(&mut self) {
        // The warming thread holds a reference to `inner`; stop it so both go away
        self.inner.warmer.stop();
    }
}

impl<V> std::fmt::Debug for CacheOrchestrator<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheOrchestrator")
            .field("memory", &self.inner.memory)
            .field("disk", &self.inner.disk)
            .field("warmer", &self.inner.warmer)
            .finish()
    }
}

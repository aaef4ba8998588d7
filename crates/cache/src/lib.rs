//! Two-tier cache for tiercache
//!
//! This crate provides an embeddable cache with:
//! - A bounded memory tier with LRU, LFU, FIFO or TTL-aware eviction
//! - A persistent disk tier: zstd-compressed, CRC-checked payload files
//!   behind a SQLite index
//! - An orchestrator that promotes disk hits into memory
//! - Predictive warming driven by observed access patterns
//!
//! Values are opaque to the cache; a [`ValueCodec`] turns them into bytes.

pub mod clock;
pub mod config;
pub mod entry;
pub mod errors;
pub mod eviction;
pub mod memory;
pub mod orchestrator;
pub mod serialization;
pub mod stats;
pub mod storage;
pub mod warming;

pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use config::{
    CacheConfig, CacheConfigBuilder, CacheConfigLoader, ConfigSource, DiskTierConfig,
    MemoryTierConfig,
};
pub use entry::{CacheEntry, Metadata};
pub use errors::{CacheError, Error, RecoveryHint, Result};
pub use eviction::{EvictionPolicy, EvictionStrategy};
pub use memory::MemoryTier;
pub use orchestrator::{
    CacheOrchestrator, CacheOrchestratorBuilder, OrchestratorStats, OverallStats, PutOutcome,
};
pub use serialization::{default_codec, BincodeCodec, JsonCodec, SharedCodec, ValueCodec};
pub use stats::TierStats;
pub use storage::{DiskTier, ReconcileReport};
pub use warming::{
    CacheWarmer, ProducerError, SharedProducer, ValueProducer, WarmTarget, WarmingConfig,
    WarmingStats,
};

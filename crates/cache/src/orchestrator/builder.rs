//! Orchestrator construction

use super::statistics::LookupStats;
use super::types::{CacheOrchestrator, OrchestratorInner};
use crate::clock::{SharedClock, SystemClock};
use crate::config::CacheConfig;
use crate::errors::Result;
use crate::memory::MemoryTier;
use crate::serialization::{default_codec, SharedCodec};
use crate::storage::DiskTier;
use crate::warming::{CacheWarmer, SharedProducer};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

impl<V> CacheOrchestrator<V>
where
    V: Clone + Send + Sync + Serialize + DeserializeOwned + 'static,
{
    /// Open a cache with the default codec and system clock
    pub fn new(config: CacheConfig) -> Result<Self> {
        CacheOrchestratorBuilder::new(config).build()
    }

    pub fn builder(config: CacheConfig) -> CacheOrchestratorBuilder<V> {
        CacheOrchestratorBuilder::new(config)
    }
}

/// Assembles a [`CacheOrchestrator`] from configuration and collaborators
pub struct CacheOrchestratorBuilder<V> {
    config: CacheConfig,
    codec: SharedCodec<V>,
    clock: SharedClock,
    producer: Option<SharedProducer<V>>,
}

impl<V> CacheOrchestratorBuilder<V>
where
    V: Clone + Send + Sync + Serialize + DeserializeOwned + 'static,
{
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            codec: default_codec(),
            clock: Arc::new(SystemClock),
            producer: None,
        }
    }
}

impl<V> CacheOrchestratorBuilder<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Replace the default bincode codec
    pub fn with_codec(mut self, codec: SharedCodec<V>) -> Self {
        self.codec = codec;
        self
    }

    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    /// Source of values for keys the warmer predicts
    pub fn with_producer(mut self, producer: SharedProducer<V>) -> Self {
        self.producer = Some(producer);
        self
    }

    /// Validate the configuration and open both tiers
    ///
    /// Fails if the disk directory or its index cannot be opened.
    pub fn build(self) -> Result<CacheOrchestrator<V>> {
        let Self {
            config,
            codec,
            clock,
            producer,
        } = self;

        config.validate()?;

        let memory = MemoryTier::new(config.memory.clone(), Arc::clone(&codec), Arc::clone(&clock));
        let disk = match &config.disk {
            Some(disk_config) => Some(DiskTier::open(
                disk_config.clone(),
                Arc::clone(&codec),
                Arc::clone(&clock),
            )?),
            None => None,
        };
        let warmer = Arc::new(CacheWarmer::new(
            config.warming.clone(),
            Arc::clone(&clock),
            producer,
        ));

        tracing::info!(
            disk = disk.is_some(),
            warming = config.warming.enabled,
            producer = warmer.has_producer(),
            "Cache orchestrator initialized"
        );

        Ok(CacheOrchestrator {
            inner: Arc::new(OrchestratorInner {
                disk_enabled: AtomicBool::new(disk.is_some()),
                config,
                clock,
                memory,
                disk,
                warmer,
                stats: LookupStats::default(),
            }),
        })
    }
}

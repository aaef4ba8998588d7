//! Factory for creating eviction policies

use crate::errors::{CacheError, RecoveryHint, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::policies::{FifoPolicy, LfuPolicy, LruPolicy, TtlPolicy};
use super::traits::EvictionPolicy;

/// Memory tier eviction strategy, fixed for the lifetime of a tier
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvictionStrategy {
    #[default]
    Lru,
    Lfu,
    Fifo,
    Ttl,
}

impl FromStr for EvictionStrategy {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "lru" => Ok(Self::Lru),
            "lfu" => Ok(Self::Lfu),
            "fifo" => Ok(Self::Fifo),
            "ttl" => Ok(Self::Ttl),
            _ => Err(CacheError::Configuration {
                message: format!("Unknown eviction policy: {s}"),
                recovery_hint: RecoveryHint::UseDefault {
                    value: "lru".to_string(),
                },
            }),
        }
    }
}

impl fmt::Display for EvictionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Lru => "lru",
            Self::Lfu => "lfu",
            Self::Fifo => "fifo",
            Self::Ttl => "ttl",
        };
        f.write_str(name)
    }
}

/// Eviction policy factory
pub fn create_eviction_policy(strategy: EvictionStrategy) -> Box<dyn EvictionPolicy> {
    match strategy {
        EvictionStrategy::Lru => Box::new(LruPolicy::new()),
        EvictionStrategy::Lfu => Box::new(LfuPolicy::new()),
        EvictionStrategy::Fifo => Box::new(FifoPolicy::new()),
        EvictionStrategy::Ttl => Box::new(TtlPolicy::new()),
    }
}

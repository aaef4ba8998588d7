//! Cache entry representation shared by both tiers

use crate::clock::elapsed_since;
use std::collections::HashMap;
use std::time::{Duration, SystemTime};

/// Opaque per-entry annotations; never interpreted by the cache
pub type Metadata = HashMap<String, String>;

/// A stored value together with its bookkeeping
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<V> {
    pub key: String,
    pub value: V,
    pub created_at: SystemTime,
    /// Incremented on every hit
    pub access_count: u64,
    /// Measured from `created_at`; `None` never expires
    pub ttl: Option<Duration>,
    pub size_bytes: u64,
    pub metadata: Metadata,
}

impl<V> CacheEntry<V> {
    pub fn new(
        key: impl Into<String>,
        value: V,
        created_at: SystemTime,
        ttl: Option<Duration>,
        size_bytes: u64,
        metadata: Metadata,
    ) -> Self {
        Self {
            key: key.into(),
            value,
            created_at,
            access_count: 0,
            ttl,
            size_bytes,
            metadata,
        }
    }

    /// Instant past which the entry is expired
    ///
    /// `None` when there is no TTL or the TTL reaches past what `SystemTime`
    /// can represent; either way the entry never expires.
    pub fn expires_at(&self) -> Option<SystemTime> {
        self.ttl.and_then(|ttl| self.created_at.checked_add(ttl))
    }

    pub fn is_expired(&self, now: SystemTime) -> bool {
        is_expired(self.created_at, self.ttl, now)
    }

    /// TTL left at `now`; `None` when the entry never expires
    pub fn remaining_ttl(&self, now: SystemTime) -> Option<Duration> {
        remaining_ttl(self.created_at, self.ttl, now)
    }
}

pub(crate) fn is_expired(created_at: SystemTime, ttl: Option<Duration>, now: SystemTime) -> bool {
    match ttl {
        Some(ttl) => elapsed_since(now, created_at) >= ttl,
        None => false,
    }
}

pub(crate) fn remaining_ttl(
    created_at: SystemTime,
    ttl: Option<Duration>,
    now: SystemTime,
) -> Option<Duration> {
    ttl.map(|ttl| ttl.saturating_sub(elapsed_since(now, created_at)))
}

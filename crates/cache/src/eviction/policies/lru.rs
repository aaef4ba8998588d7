//! LRU (Least Recently Used) eviction policy implementation

use crate::eviction::factory::EvictionStrategy;
use crate::eviction::order::OrderIndex;
use crate::eviction::traits::EvictionPolicy;
use std::time::SystemTime;

/// LRU (Least Recently Used) eviction policy
///
/// Both `put` and read hits count as use.
#[derive(Debug, Default)]
pub struct LruPolicy {
    /// Access order tracking, most recent at the back
    access_order: OrderIndex,
}

impl LruPolicy {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EvictionPolicy for LruPolicy {
    fn on_insert(&mut self, key: &str, _expires_at: Option<SystemTime>) {
        self.access_order.touch(key);
    }

    fn on_access(&mut self, key: &str) {
        self.access_order.touch(key);
    }

    fn on_remove(&mut self, key: &str) {
        self.access_order.remove(key);
    }

    fn next_eviction(&self, _now: SystemTime) -> Option<String> {
        self.access_order.front().cloned()
    }

    fn clear(&mut self) {
        self.access_order.clear();
    }

    fn len(&self) -> usize {
        self.access_order.len()
    }

    fn strategy(&self) -> EvictionStrategy {
        EvictionStrategy::Lru
    }
}

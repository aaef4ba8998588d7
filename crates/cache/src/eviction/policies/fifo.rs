//! FIFO (First In, First Out) eviction policy implementation

use crate::eviction::factory::EvictionStrategy;
use crate::eviction::order::OrderIndex;
use crate::eviction::traits::EvictionPolicy;
use std::time::SystemTime;

/// Evicts the oldest insertion regardless of reads
#[derive(Debug, Default)]
pub struct FifoPolicy {
    insertion_order: OrderIndex,
}

impl FifoPolicy {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EvictionPolicy for FifoPolicy {
    fn on_insert(&mut self, key: &str, _expires_at: Option<SystemTime>) {
        self.insertion_order.push(key);
    }

    fn on_access(&mut self, _key: &str) {}

    fn on_remove(&mut self, key: &str) {
        self.insertion_order.remove(key);
    }

    fn next_eviction(&self, _now: SystemTime) -> Option<String> {
        self.insertion_order.front().cloned()
    }

    fn clear(&mut self) {
        self.insertion_order.clear();
    }

    fn len(&self) -> usize {
        self.insertion_order.len()
    }

    fn strategy(&self) -> EvictionStrategy {
        EvictionStrategy::Fifo
    }
}

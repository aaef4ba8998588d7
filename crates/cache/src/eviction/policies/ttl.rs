//! TTL-aware eviction policy implementation

use crate::eviction::factory::EvictionStrategy;
use crate::eviction::order::OrderIndex;
use crate::eviction::traits::EvictionPolicy;
use std::collections::{BTreeSet, HashMap};
use std::time::SystemTime;

/// Evicts an already-expired entry when one exists, otherwise falls back to LRU
#[derive(Debug, Default)]
pub struct TtlPolicy {
    access_order: OrderIndex,
    expiries: BTreeSet<(SystemTime, String)>,
    expiry_of: HashMap<String, SystemTime>,
}

impl TtlPolicy {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EvictionPolicy for TtlPolicy {
    fn on_insert(&mut self, key: &str, expires_at: Option<SystemTime>) {
        if let Some(old) = self.expiry_of.remove(key) {
            self.expiries.remove(&(old, key.to_string()));
        }
        if let Some(at) = expires_at {
            self.expiry_of.insert(key.to_string(), at);
            self.expiries.insert((at, key.to_string()));
        }
        self.access_order.touch(key);
    }

    fn on_access(&mut self, key: &str) {
        self.access_order.touch(key);
    }

    fn on_remove(&mut self, key: &str) {
        self.access_order.remove(key);
        if let Some(at) = self.expiry_of.remove(key) {
            self.expiries.remove(&(at, key.to_string()));
        }
    }

    fn next_eviction(&self, now: SystemTime) -> Option<String> {
        match self.expiries.iter().next() {
            Some((at, key)) if *at <= now => Some(key.clone()),
            _ => self.access_order.front().cloned(),
        }
    }

    fn clear(&mut self) {
        self.access_order.clear();
        self.expiries.clear();
        self.expiry_of.clear();
    }

    fn len(&self) -> usize {
        self.access_order.len()
    }

    fn strategy(&self) -> EvictionStrategy {
        EvictionStrategy::Ttl
    }
}

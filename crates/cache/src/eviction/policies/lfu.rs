//! LFU (Least Frequently Used) eviction policy implementation

use crate::eviction::factory::EvictionStrategy;
use crate::eviction::traits::EvictionPolicy;
use std::collections::{BTreeSet, HashMap};
use std::time::SystemTime;

/// LFU (Least Frequently Used) eviction policy
///
/// Ties on frequency go to the earliest insertion.
#[derive(Debug, Default)]
pub struct LfuPolicy {
    /// (frequency, insertion sequence) per key
    frequencies: HashMap<String, (u64, u64)>,
    /// Ordered by (frequency, insertion sequence)
    ranking: BTreeSet<(u64, u64, String)>,
    next_seq: u64,
}

impl LfuPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current frequency recorded for `key`
    pub fn frequency(&self, key: &str) -> Option<u64> {
        self.frequencies.get(key).map(|(freq, _)| *freq)
    }
}

impl EvictionPolicy for LfuPolicy {
    fn on_insert(&mut self, key: &str, _expires_at: Option<SystemTime>) {
        self.on_remove(key);

        let seq = self.next_seq;
        self.next_seq += 1;
        self.frequencies.insert(key.to_string(), (0, seq));
        self.ranking.insert((0, seq, key.to_string()));
    }

    fn on_access(&mut self, key: &str) {
        if let Some((freq, seq)) = self.frequencies.get_mut(key) {
            self.ranking.remove(&(*freq, *seq, key.to_string()));
            *freq += 1;
            self.ranking.insert((*freq, *seq, key.to_string()));
        }
    }

    fn on_remove(&mut self, key: &str) {
        if let Some((freq, seq)) = self.frequencies.remove(key) {
            self.ranking.remove(&(freq, seq, key.to_string()));
        }
    }

    fn next_eviction(&self, _now: SystemTime) -> Option<String> {
        self.ranking.iter().next().map(|(_, _, key)| key.clone())
    }

    fn clear(&mut self) {
        self.frequencies.clear();
        self.ranking.clear();
    }

    fn len(&self) -> usize {
        self.frequencies.len()
    }

    fn strategy(&self) -> EvictionStrategy {
        EvictionStrategy::Lfu
    }
}

//! Sequence-ordered key index shared by the recency-based policies

use std::collections::{BTreeMap, HashMap};

/// Keys ordered by a monotonically increasing sequence number
#[derive(Debug, Default)]
pub(crate) struct OrderIndex {
    by_seq: BTreeMap<u64, String>,
    seq_of: HashMap<String, u64>,
    next_seq: u64,
}

impl OrderIndex {
    /// Move `key` to the back, inserting it if absent
    pub fn touch(&mut self, key: &str) {
        let seq = self.next_seq;
        self.next_seq += 1;

        match self.seq_of.get_mut(key) {
            Some(old) => {
                self.by_seq.remove(&*old);
                *old = seq;
            }
            None => {
                self.seq_of.insert(key.to_string(), seq);
            }
        }
        self.by_seq.insert(seq, key.to_string());
    }

    /// Insert at the back only if absent
    pub fn push(&mut self, key: &str) {
        if !self.seq_of.contains_key(key) {
            self.touch(key);
        }
    }

    pub fn remove(&mut self, key: &str) {
        if let Some(seq) = self.seq_of.remove(key) {
            self.by_seq.remove(&seq);
        }
    }

    /// Oldest key
    pub fn front(&self) -> Option<&String> {
        self.by_seq.values().next()
    }

    pub fn clear(&mut self) {
        self.by_seq.clear();
        self.seq_of.clear();
    }

    pub fn len(&self) -> usize {
        self.seq_of.len()
    }
}

//! Access tracking for warming analysis

use super::candidates::score;
use super::types::WarmingCandidate;
use crate::clock::elapsed_since;
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, SystemTime};

/// Samples older than this are never kept
pub(crate) const ACCESS_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);

/// How often recording an access also ages out idle keys
pub(crate) const SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Per-key sliding window of access timestamps
#[derive(Debug, Default)]
pub(crate) struct AccessTracker {
    patterns: HashMap<String, VecDeque<SystemTime>>,
    max_samples: usize,
    last_sweep: Option<SystemTime>,
}

impl AccessTracker {
    pub fn new(max_samples: usize) -> Self {
        Self {
            patterns: HashMap::new(),
            max_samples: max_samples.max(1),
            last_sweep: None,
        }
    }

    /// Record an access for tracking
    ///
    /// Stale samples of `key` are dropped on the spot. Keys nobody touched
    /// within the window are swept at most once per [`SWEEP_INTERVAL`], so
    /// the map stays bounded even when no analysis pass ever runs.
    pub fn record_access(&mut self, key: &str, at: SystemTime) {
        let sweep_due = match self.last_sweep {
            Some(last) => elapsed_since(at, last) >= SWEEP_INTERVAL,
            None => true,
        };
        if sweep_due {
            self.prune(at);
        }

        let cutoff = at.checked_sub(ACCESS_WINDOW);
        let samples = self.patterns.entry(key.to_string()).or_default();
        drop_stale(samples, cutoff);

        if samples.len() == self.max_samples {
            samples.pop_front();
        }
        samples.push_back(at);
    }

    /// Drop samples outside the window, and keys left with none
    pub fn prune(&mut self, now: SystemTime) {
        let cutoff = now.checked_sub(ACCESS_WINDOW);
        self.patterns.retain(|_, samples| {
            drop_stale(samples, cutoff);
            !samples.is_empty()
        });
        self.last_sweep = Some(now);
    }

    /// Every tracked key that currently qualifies for warming
    pub fn candidates(&self, now: SystemTime) -> Vec<WarmingCandidate> {
        self.patterns
            .iter()
            .filter_map(|(key, samples)| score(key, samples, now))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn clear(&mut self) {
        self.patterns.clear();
        self.last_sweep = None;
    }

    #[cfg(test)]
    pub fn samples(&self, key: &str) -> usize {
        self.patterns.get(key).map_or(0, VecDeque::len)
    }
}

fn drop_stale(samples: &mut VecDeque<SystemTime>, cutoff: Option<SystemTime>) {
    if let Some(cutoff) = cutoff {
        while samples.front().is_some_and(|at| *at < cutoff) {
            samples.pop_front();
        }
    }
}

//! Candidate scoring and selection

use super::types::WarmingCandidate;
use crate::clock::elapsed_since;
use std::cmp::Ordering;
use std::collections::VecDeque;
use std::time::{Duration, SystemTime};

const SECS_PER_HOUR: f64 = 3600.0;

/// A key must see more than this many accesses per hour
const MIN_FREQUENCY: f64 = 1.0;

/// ...and have been accessed more recently than this
const MAX_RECENCY: Duration = Duration::from_secs(3600);

/// Floor on recency so a just-accessed key does not score infinitely
const MIN_RECENCY_HOURS: f64 = 0.1;

/// Score one key's samples; `None` if it does not qualify
pub(crate) fn score(
    key: &str,
    samples: &VecDeque<SystemTime>,
    now: SystemTime,
) -> Option<WarmingCandidate> {
    let first = *samples.front()?;
    let last = *samples.back()?;

    let span_hours = (elapsed_since(last, first).as_secs_f64() / SECS_PER_HOUR).max(1.0);
    let frequency = samples.len() as f64 / span_hours;
    let recency = elapsed_since(now, last);

    if frequency <= MIN_FREQUENCY || recency >= MAX_RECENCY {
        return None;
    }

    let recency_hours = (recency.as_secs_f64() / SECS_PER_HOUR).max(MIN_RECENCY_HOURS);
    Some(WarmingCandidate {
        key: key.to_string(),
        frequency,
        recency,
        priority: frequency / recency_hours,
    })
}

/// Highest-priority candidates not already cached, at most `top_n`
pub(crate) fn select(
    mut candidates: Vec<WarmingCandidate>,
    top_n: usize,
    is_present: impl Fn(&str) -> bool,
) -> Vec<WarmingCandidate> {
    candidates.sort_by(|a, b| {
        b.priority
            .partial_cmp(&a.priority)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.key.cmp(&b.key))
    });

    candidates
        .into_iter()
        .filter(|candidate| !is_present(&candidate.key))
        .take(top_n)
        .collect()
}

//! Predictive cache warming
//!
//! Tracks access timestamps per key and, on a fixed interval, asks a
//! host-supplied [`ValueProducer`] for the keys most likely to be requested
//! next that are not already cached.

mod candidates;
mod core;
mod tracker;
mod types;

pub use core::{CacheWarmer, ProducerError, SharedProducer, ValueProducer, WarmTarget};
pub use types::{WarmingCandidate, WarmingConfig, WarmingStats};

#[cfg(test)]
mod tests;

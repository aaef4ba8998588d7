//! Core eviction policy trait definition

use super::factory::EvictionStrategy;
use std::time::SystemTime;

/// Eviction policy trait
///
/// Policies are driven from inside the memory tier's lock, so they take
/// `&mut self` and need no interior synchronisation.
pub trait EvictionPolicy: Send {
    /// Record insertion of a key
    fn on_insert(&mut self, key: &str, expires_at: Option<SystemTime>);

    /// Record a read hit on a key
    fn on_access(&mut self, key: &str);

    /// Record removal of a key (eviction, expiry, overwrite)
    fn on_remove(&mut self, key: &str);

    /// Get next key to evict
    fn next_eviction(&self, now: SystemTime) -> Option<String>;

    /// Clear all tracking data
    fn clear(&mut self);

    /// Number of tracked keys
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn strategy(&self) -> EvictionStrategy;
}

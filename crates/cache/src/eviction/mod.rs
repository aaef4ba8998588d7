//! Eviction policies for the memory tier
//!
//! Each policy only tracks ordering; the memory tier owns the entries and
//! asks the policy which key to drop next.

mod factory;
mod order;
mod policies;
mod traits;

pub use factory::{create_eviction_policy, EvictionStrategy};
pub use policies::{FifoPolicy, LfuPolicy, LruPolicy, TtlPolicy};
pub use traits::EvictionPolicy;

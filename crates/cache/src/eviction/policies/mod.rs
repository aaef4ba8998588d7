//! Eviction policy implementations

mod fifo;
mod lfu;
mod lru;
mod ttl;

pub use fifo::FifoPolicy;
pub use lfu::LfuPolicy;
pub use lru::LruPolicy;
pub use ttl::TtlPolicy;

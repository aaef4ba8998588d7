//! Two-tier cache orchestrator
//!
//! Composes the memory tier and the optional disk tier behind one
//! `get`/`put`/`clear`/`stats` surface, promotes disk hits into memory and
//! owns the warmer's background loop.
//!
//! Each tier has its own lock and the orchestrator holds none across tier
//! calls. A `clear` racing a disk-hit promotion may therefore leave the
//! promoted value in memory after the clear returns.

mod builder;
mod operations;
mod statistics;
mod types;

pub use builder::CacheOrchestratorBuilder;
pub use statistics::{OrchestratorStats, OverallStats};
pub use types::{CacheOrchestrator, PutOutcome};

#[cfg(test)]
mod tests;

//! Error handling for the cache tiers
//!
//! Every variant carries a [`RecoveryHint`]. Tier boundaries absorb these
//! errors into `Option`/`bool` results; only construction surfaces them.

mod conversions;
mod display;
mod recovery;
mod types;

pub use types::*;

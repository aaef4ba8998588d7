//! Recovery utilities for cache errors

use super::types::{CacheError, RecoveryHint};

impl CacheError {
    /// Get the recovery hint for this error
    #[must_use]
    pub const fn recovery_hint(&self) -> &RecoveryHint {
        match self {
            Self::Io { recovery_hint, .. }
            | Self::Serialization { recovery_hint, .. }
            | Self::Compression { recovery_hint, .. }
            | Self::Corruption { recovery_hint, .. }
            | Self::CapacityExceeded { recovery_hint, .. }
            | Self::DiskQuotaExceeded { recovery_hint, .. }
            | Self::Index { recovery_hint, .. }
            | Self::StoreUnavailable { recovery_hint, .. }
            | Self::Configuration { recovery_hint, .. } => recovery_hint,
        }
    }

    /// Check if this error indicates data corruption
    #[must_use]
    pub const fn is_corruption(&self) -> bool {
        matches!(self, Self::Corruption { .. })
    }

    /// Check if this error is a capacity rejection rather than a fault
    #[must_use]
    pub const fn is_capacity(&self) -> bool {
        matches!(
            self,
            Self::CapacityExceeded { .. } | Self::DiskQuotaExceeded { .. }
        )
    }
}

//! Core error types for the cache system

use std::path::PathBuf;

/// Result type for cache operations
pub type Result<T> = std::result::Result<T, CacheError>;

/// Re-export CacheError as Error for convenience
pub use CacheError as Error;

/// Error type for cache operations
#[derive(Debug)]
pub enum CacheError {
    /// I/O errors during cache operations
    Io {
        path: PathBuf,
        operation: &'static str,
        source: std::io::Error,
        recovery_hint: RecoveryHint,
    },

    /// Value or metadata could not be encoded/decoded
    Serialization {
        key: String,
        operation: SerializationOp,
        source: Box<dyn std::error::Error + Send + Sync>,
        recovery_hint: RecoveryHint,
    },

    /// Compression/decompression error
    Compression {
        operation: &'static str,
        source: std::io::Error,
        recovery_hint: RecoveryHint,
    },

    /// Stored payload failed validation
    Corruption {
        key: String,
        reason: String,
        recovery_hint: RecoveryHint,
    },

    /// A single entry does not fit in the memory tier
    CapacityExceeded {
        requested_bytes: u64,
        available_bytes: u64,
        recovery_hint: RecoveryHint,
    },

    /// A single entry does not fit in the disk tier
    DiskQuotaExceeded {
        current: u64,
        requested: u64,
        limit: u64,
        recovery_hint: RecoveryHint,
    },

    /// Query against the disk index failed
    Index {
        operation: &'static str,
        source: rusqlite::Error,
        recovery_hint: RecoveryHint,
    },

    /// Disk index could not be opened
    StoreUnavailable {
        reason: String,
        recovery_hint: RecoveryHint,
    },

    /// Configuration error
    Configuration {
        message: String,
        recovery_hint: RecoveryHint,
    },
}

/// Recovery hints for error handling
#[derive(Debug, Clone, PartialEq)]
pub enum RecoveryHint {
    /// Retry the operation after a delay
    RetryWithBackoff {
        initial_delay_ms: u64,
        max_retries: u32,
        backoff_multiplier: f64,
    },

    /// Clear the cache and retry
    ClearAndRetry,

    /// Increase cache capacity
    IncreaseCapacity { suggested_bytes: u64 },

    /// Check file permissions
    CheckPermissions { path: PathBuf },

    /// Rebuild cache index
    RebuildIndex,

    /// No automated recovery possible
    Manual { instructions: String },

    /// Operation can be safely ignored
    Ignore,

    /// Use a default value
    UseDefault { value: String },

    /// Check disk space and clean up if needed
    CheckDiskSpace,
}

/// Serialization operation types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerializationOp {
    Encode,
    Decode,
}

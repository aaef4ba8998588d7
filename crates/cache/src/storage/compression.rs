//! Compression configuration and utilities
//!
//! Payloads are compressed with zstd when enabled and large enough to benefit.

use super::format::DEFAULT_COMPRESSION_LEVEL;
use crate::config::DiskTierConfig;
use crate::errors::{CacheError, RecoveryHint, Result};

/// Compression configuration
#[derive(Debug, Clone, Copy)]
pub struct CompressionConfig {
    /// Whether compression is enabled
    pub enabled: bool,
    /// Compression level (1-22 for zstd, default 3)
    pub level: i32,
    /// Minimum size in bytes before compression is applied
    pub min_size: usize,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: DEFAULT_COMPRESSION_LEVEL,
            min_size: 64,
        }
    }
}

impl From<&DiskTierConfig> for CompressionConfig {
    fn from(config: &DiskTierConfig) -> Self {
        Self {
            enabled: config.compression_enabled,
            level: config.compression_level,
            ..Default::default()
        }
    }
}

impl CompressionConfig {
    /// Compress `data` if worthwhile; returns the bytes and whether they are compressed
    pub fn compress(&self, data: &[u8]) -> Result<(Vec<u8>, bool)> {
        if !self.enabled || data.len() < self.min_size {
            return Ok((data.to_vec(), false));
        }

        let compressed =
            zstd::stream::encode_all(data, self.level).map_err(|e| CacheError::Compression {
                operation: "compress payload",
                source: e,
                recovery_hint: RecoveryHint::Ignore,
            })?;

        // Incompressible data is stored as-is
        if compressed.len() >= data.len() {
            Ok((data.to_vec(), false))
        } else {
            Ok((compressed, true))
        }
    }

    /// Reverse [`compress`](Self::compress); the flag comes from the payload header
    pub fn decompress(data: &[u8], compressed: bool) -> Result<Vec<u8>> {
        if !compressed {
            return Ok(data.to_vec());
        }

        zstd::stream::decode_all(data).map_err(|e| CacheError::Compression {
            operation: "decompress payload",
            source: e,
            recovery_hint: RecoveryHint::ClearAndRetry,
        })
    }
}

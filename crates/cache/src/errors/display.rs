//! Display implementations for cache errors

use super::types::CacheError;
use std::fmt;

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io {
                path,
                operation,
                source,
                ..
            } => write!(
                f,
                "I/O error during {} on '{}': {}",
                operation,
                path.display(),
                source
            ),
            Self::Serialization {
                key,
                operation,
                source,
                ..
            } => write!(
                f,
                "Failed to {operation:?} cache entry '{key}': {source}"
            ),
            Self::Compression {
                operation, source, ..
            } => write!(f, "Compression error during {operation}: {source}"),
            Self::Corruption { key, reason, .. } => {
                write!(f, "Cache corruption detected for key '{key}': {reason}")
            }
            Self::CapacityExceeded {
                requested_bytes,
                available_bytes,
                ..
            } => write!(
                f,
                "Cache capacity exceeded: requested {requested_bytes} bytes, only {available_bytes} bytes available"
            ),
            Self::DiskQuotaExceeded {
                current,
                requested,
                limit,
                ..
            } => write!(
                f,
                "Disk quota exceeded: current {current}, requested {requested}, limit {limit}"
            ),
            Self::Index {
                operation, source, ..
            } => write!(f, "Disk index error during {operation}: {source}"),
            Self::StoreUnavailable { reason, .. } => {
                write!(f, "Disk index unavailable: {reason}")
            }
            Self::Configuration { message, .. } => {
                write!(f, "Cache configuration error: {message}")
            }
        }
    }
}

impl std::error::Error for CacheError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Serialization { source, .. } => Some(source.as_ref()),
            Self::Compression { source, .. } => Some(source),
            Self::Index { source, .. } => Some(source),
            _ => None,
        }
    }
}

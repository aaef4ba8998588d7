//! Error conversion utilities

use super::types::{CacheError, RecoveryHint, SerializationOp};

/// Metadata blobs in the disk index are JSON
impl From<serde_json::Error> for CacheError {
    fn from(error: serde_json::Error) -> Self {
        let operation = if error.is_data() || error.is_syntax() || error.is_eof() {
            SerializationOp::Decode
        } else {
            SerializationOp::Encode
        };
        Self::Serialization {
            key: String::new(),
            operation,
            source: Box::new(error),
            recovery_hint: RecoveryHint::Ignore,
        }
    }
}

impl From<bincode::Error> for CacheError {
    fn from(error: bincode::Error) -> Self {
        Self::Serialization {
            key: String::new(),
            operation: SerializationOp::Decode,
            source: error,
            recovery_hint: RecoveryHint::ClearAndRetry,
        }
    }
}

impl CacheError {
    /// Attach the key an encode/decode failure happened on
    #[must_use]
    pub fn with_key(self, key: &str) -> Self {
        match self {
            Self::Serialization {
                operation,
                source,
                recovery_hint,
                ..
            } => Self::Serialization {
                key: key.to_string(),
                operation,
                source,
                recovery_hint,
            },
            other => other,
        }
    }
}

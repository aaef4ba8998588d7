//! Value codecs
//!
//! The cache never inspects values. A [`ValueCodec`] turns them into bytes for
//! the disk tier and for memory-tier size accounting.

use crate::errors::{CacheError, RecoveryHint, Result, SerializationOp};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

/// Converts values to and from bytes
pub trait ValueCodec<V>: Send + Sync {
    fn encode(&self, value: &V) -> Result<Vec<u8>>;
    fn decode(&self, bytes: &[u8]) -> Result<V>;

    /// Size of the encoded value, used for capacity accounting
    fn encoded_len(&self, value: &V) -> Result<u64> {
        self.encode(value).map(|bytes| bytes.len() as u64)
    }
}

/// Shared codec handle
pub type SharedCodec<V> = Arc<dyn ValueCodec<V>>;

/// Compact binary encoding via bincode (the default)
#[derive(Debug, Default, Clone, Copy)]
pub struct BincodeCodec;

impl<V> ValueCodec<V> for BincodeCodec
where
    V: Serialize + DeserializeOwned,
{
    fn encode(&self, value: &V) -> Result<Vec<u8>> {
        bincode::serialize(value).map_err(|e| CacheError::Serialization {
            key: String::new(),
            operation: SerializationOp::Encode,
            source: e,
            recovery_hint: RecoveryHint::Ignore,
        })
    }

    fn decode(&self, bytes: &[u8]) -> Result<V> {
        bincode::deserialize(bytes).map_err(CacheError::from)
    }

    fn encoded_len(&self, value: &V) -> Result<u64> {
        bincode::serialized_size(value).map_err(|e| CacheError::Serialization {
            key: String::new(),
            operation: SerializationOp::Encode,
            source: e,
            recovery_hint: RecoveryHint::Ignore,
        })
    }
}

/// Human-readable JSON encoding
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonCodec;

impl<V> ValueCodec<V> for JsonCodec
where
    V: Serialize + DeserializeOwned,
{
    fn encode(&self, value: &V) -> Result<Vec<u8>> {
        serde_json::to_vec(value).map_err(CacheError::from)
    }

    fn decode(&self, bytes: &[u8]) -> Result<V> {
        serde_json::from_slice(bytes).map_err(CacheError::from)
    }
}

/// The codec used when the host does not supply one
pub fn default_codec<V>() -> SharedCodec<V>
where
    V: Serialize + DeserializeOwned + 'static,
{
    Arc::new(BincodeCodec)
}

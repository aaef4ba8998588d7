//! Payload file format
//!
//! Every payload file is a fixed-size header followed by the (optionally
//! zstd-compressed) encoded value. The header carries its own CRC and the
//! CRC of the payload so torn or tampered files are detected on read.

use crate::errors::{CacheError, RecoveryHint, Result};
use crc32c::crc32c;
use serde::{Deserialize, Serialize};

/// Magic number for payload files: "TIER"
pub const PAYLOAD_MAGIC: u32 = 0x5449_4552;

/// Current payload format version
pub const STORAGE_VERSION: u16 = 1;

/// Default zstd compression level (3 = fast with good compression)
pub const DEFAULT_COMPRESSION_LEVEL: i32 = 3;

/// Serialized header length (bincode fixed-int encoding)
pub const HEADER_SIZE: usize = 32;

/// Extension of committed payload files
pub const PAYLOAD_EXTENSION: &str = "entry";

/// Extension of payload files still being written
pub const TEMP_EXTENSION: &str = "tmp";

/// File name of the embedded index
pub const INDEX_FILE: &str = "index.db";

/// Binary header at the start of every payload file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(C)]
pub struct PayloadHeader {
    /// Magic number for validation
    magic: u32,
    /// Storage format version
    version: u16,
    /// Flags (bit 0: compressed)
    flags: u16,
    /// CRC32C of the header (excluding this field)
    header_crc: u32,
    /// Encoded value size before compression
    pub uncompressed_size: u64,
    /// Stored payload size
    pub stored_size: u64,
    /// CRC32C of the stored payload
    pub data_crc: u32,
}

impl PayloadHeader {
    const FLAG_COMPRESSED: u16 = 1 << 0;

    pub fn new(uncompressed_size: u64, payload: &[u8], compressed: bool) -> Self {
        let mut header = Self {
            magic: PAYLOAD_MAGIC,
            version: STORAGE_VERSION,
            flags: if compressed { Self::FLAG_COMPRESSED } else { 0 },
            header_crc: 0,
            uncompressed_size,
            stored_size: payload.len() as u64,
            data_crc: crc32c(payload),
        };

        header.header_crc = header.calculate_crc();
        header
    }

    fn calculate_crc(&self) -> u32 {
        let mut temp = *self;
        temp.header_crc = 0;

        match bincode::serialize(&temp) {
            Ok(bytes) => crc32c(&bytes),
            Err(_) => 0,
        }
    }

    pub fn validate(&self, key: &str) -> Result<()> {
        if self.magic != PAYLOAD_MAGIC {
            return Err(corruption(
                key,
                format!(
                    "Invalid magic number: expected {:08x}, got {:08x}",
                    PAYLOAD_MAGIC, self.magic
                ),
            ));
        }

        if self.version > STORAGE_VERSION {
            return Err(corruption(
                key,
                format!("Unsupported storage version: {}", self.version),
            ));
        }

        let expected_crc = self.calculate_crc();
        if self.header_crc != expected_crc {
            return Err(corruption(
                key,
                format!(
                    "Header CRC mismatch: expected {:08x}, got {:08x}",
                    expected_crc, self.header_crc
                ),
            ));
        }

        Ok(())
    }

    pub fn is_compressed(&self) -> bool {
        self.flags & Self::FLAG_COMPRESSED != 0
    }
}

/// Frame `payload` with a header, ready to be written to disk
pub fn encode_file(uncompressed_size: u64, payload: &[u8], compressed: bool) -> Result<Vec<u8>> {
    let header = PayloadHeader::new(uncompressed_size, payload, compressed);
    let mut out = bincode::serialize(&header)?;
    debug_assert_eq!(out.len(), HEADER_SIZE);
    out.extend_from_slice(payload);
    Ok(out)
}

/// Validate a payload file and split it into header and stored payload
pub fn decode_file<'a>(key: &str, bytes: &'a [u8]) -> Result<(PayloadHeader, &'a [u8])> {
    if bytes.len() < HEADER_SIZE {
        return Err(corruption(
            key,
            format!("File too short: {} bytes", bytes.len()),
        ));
    }

    let header: PayloadHeader = bincode::deserialize(&bytes[..HEADER_SIZE])?;
    header.validate(key)?;

    let payload = &bytes[HEADER_SIZE..];
    if payload.len() as u64 != header.stored_size {
        return Err(corruption(
            key,
            format!(
                "Payload length mismatch: header says {}, file has {}",
                header.stored_size,
                payload.len()
            ),
        ));
    }

    let actual_crc = crc32c(payload);
    if actual_crc != header.data_crc {
        return Err(corruption(
            key,
            format!(
                "Data CRC mismatch: expected {:08x}, got {:08x}",
                header.data_crc, actual_crc
            ),
        ));
    }

    Ok((header, payload))
}

fn corruption(key: &str, reason: String) -> CacheError {
    CacheError::Corruption {
        key: key.to_string(),
        reason,
        recovery_hint: RecoveryHint::Ignore,
    }
}

//! Payload compression
//!
//! Tags follow the block compression identifiers used by table files, so a
//! trailer written here reads the same way as a table block trailer.

use std::fmt;

use crate::error::{BlobError, Result};

/// Compression algorithm recorded in a block trailer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CompressionType {
    /// Payload stored as-is
    None = 0x00,

    /// LZ4 block format with the uncompressed size prepended
    Lz4 = 0x04,
}

impl CompressionType {
    /// Tag byte written to the trailer
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Parse a trailer tag; unknown tags are corruption
    pub fn from_tag(tag: u8) -> Result<Self> {
        match tag {
            0x00 => Ok(CompressionType::None),
            0x04 => Ok(CompressionType::Lz4),
            other => Err(BlobError::corruption(format!(
                "unknown compression type tag 0x{:02x}",
                other
            ))),
        }
    }
}

impl fmt::Display for CompressionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompressionType::None => write!(f, "none"),
            CompressionType::Lz4 => write!(f, "lz4"),
        }
    }
}

/// True if compressing `raw_len` bytes down to `compressed_len` saves
/// at least 12.5%
fn good_compression_ratio(compressed_len: usize, raw_len: usize) -> bool {
    compressed_len < raw_len - raw_len / 8
}

/// Compress `raw` with the requested algorithm.
///
/// Returns the bytes to store and the algorithm that actually describes
/// them: output that does not shrink enough is stored uncompressed.
pub fn compress(raw: &[u8], requested: CompressionType) -> (Vec<u8>, CompressionType) {
    match requested {
        CompressionType::None => (raw.to_vec(), CompressionType::None),
        CompressionType::Lz4 => {
            let compressed = lz4_flex::compress_prepend_size(raw);
            if good_compression_ratio(compressed.len(), raw.len()) {
                (compressed, CompressionType::Lz4)
            } else {
                (raw.to_vec(), CompressionType::None)
            }
        }
    }
}

/// Decompress bytes written by [`compress`]
pub fn decompress(data: &[u8], compression: CompressionType) -> Result<Vec<u8>> {
    match compression {
        CompressionType::None => Ok(data.to_vec()),
        CompressionType::Lz4 => lz4_flex::decompress_size_prepended(data)
            .map_err(|e| BlobError::corruption(format!("LZ4 decompression failed: {}", e))),
    }
}

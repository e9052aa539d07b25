//! Block Codec Module
//!
//! Stateless helpers shared by every framed block in the blob log.
//!
//! ## Responsibilities
//! - Compress / decompress record payloads
//! - CRC32 value, extension and masking for block trailers

pub mod crc;
mod compression;

pub use compression::{compress, decompress, CompressionType};

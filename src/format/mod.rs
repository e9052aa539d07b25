//! Blob Log Format Module
//!
//! Byte layout shared by the log writer and reader.
//!
//! ## File Format
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ Header Frame                                                 │
//! │ ┌──────────┬──────────────────┬─────────┬──────────────────┐ │
//! │ │ Len (8)  │  Property Block  │ Tag (1) │ Masked CRC (4)   │ │
//! │ └──────────┴──────────────────┴─────────┴──────────────────┘ │
//! ├──────────────────────────────────────────────────────────────┤
//! │ Record 1                                                     │
//! │ ┌──────────┬──────────────────┬─────────┬──────────────────┐ │
//! │ │ Len (8)  │ Compressed Data  │ Tag (1) │ Masked CRC (4)   │ │
//! │ └──────────┴──────────────────┴─────────┴──────────────────┘ │
//! │ ... (repeated for each record)                               │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! - `Len` is the little-endian length of the stored (compressed) data
//! - The CRC covers the stored data and the tag byte, never `Len`
//! - A `BlobHandle` points at the first data byte, just past `Len`
//! - The header's property block is framed (length, tag, CRC) like a record.
//!   Other producers of this format write the property block bare at
//!   offset 0, so their logs do not decode here and ours do not decode there.

mod handle;
mod header;
mod record;

pub use handle::BlobHandle;
pub use header::{BlobLogHeader, PropertyBlock};
pub use record::{
    decode_block, decode_payload, decode_record, encode_payload, encode_record, EncodedRecord,
};

// =============================================================================
// Shared Constants (used by writer, reader, header)
// =============================================================================

/// Name of the single active log file inside the blob directory
pub const LOG_FILE_NAME: &str = "blob_log";

/// Length header preceding every block: u64 little-endian
pub const LENGTH_HEADER_SIZE: u64 = 8;

/// Trailer following every block: Tag (1) + Masked CRC32 (4)
pub const TRAILER_SIZE: u64 = 5;

/// Value of the `magic` header property
pub const BLOB_LOG_MAGIC: u64 = 0x88e2_41b7_85f4_cff7;

/// Value of the `version` header property
pub const FORMAT_VERSION: u64 = 0;

/// Total on-disk size of a block holding `payload_len` stored bytes
pub fn frame_size(payload_len: u64) -> u64 {
    LENGTH_HEADER_SIZE + payload_len + TRAILER_SIZE
}

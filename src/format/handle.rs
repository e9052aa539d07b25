//! Blob Handle
//!
//! Locates a block's stored bytes within the log file.

use bytes::{Buf, BufMut};

use crate::error::Result;
use crate::varint::{decode_varint_u64, encode_varint_u64};

use super::TRAILER_SIZE;

/// Offset and size of a block's stored (compressed) bytes.
///
/// `offset` points at the first stored byte, just past the length header;
/// `size` excludes the trailer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlobHandle {
    offset: u64,
    size: u64,
}

impl BlobHandle {
    pub fn new(offset: u64, size: u64) -> Self {
        Self { offset, size }
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Bytes a reader fetches for this handle: stored data plus trailer
    pub fn read_len(&self) -> u64 {
        self.size.saturating_add(TRAILER_SIZE)
    }

    /// First byte past this block's trailer
    pub fn end_offset(&self) -> u64 {
        self.offset.saturating_add(self.read_len())
    }

    /// Append `varint(offset) varint(size)`
    pub fn encode_to(&self, buf: &mut impl BufMut) {
        encode_varint_u64(buf, self.offset);
        encode_varint_u64(buf, self.size);
    }

    /// Inverse of [`encode_to`](Self::encode_to); consumes exactly the
    /// handle's bytes from `buf`
    pub fn decode_from(buf: &mut impl Buf) -> Result<Self> {
        let offset = decode_varint_u64(buf)?;
        let size = decode_varint_u64(buf)?;
        Ok(Self { offset, size })
    }
}

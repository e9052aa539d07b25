//! Index Record
//!
//! The only state the primary store holds for a blob-backed key.

use bytes::{Buf, BytesMut};

use crate::error::{BlobError, Result};
use crate::format::BlobHandle;
use crate::varint::{decode_varint_u64, encode_varint_u64};

/// Pointer from a user key to its blob: log file number + block handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexRecord {
    pub file_number: u64,
    pub handle: BlobHandle,
}

impl IndexRecord {
    pub fn new(file_number: u64, handle: BlobHandle) -> Self {
        Self {
            file_number,
            handle,
        }
    }

    /// `varint(file_number) varint(offset) varint(size)`
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(16);
        encode_varint_u64(&mut buf, self.file_number);
        self.handle.encode_to(&mut buf);
        buf.to_vec()
    }

    /// Parse a stored index record. Truncated, overlong or trailing bytes
    /// are all corruption.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut buf = bytes;

        let file_number = decode_varint_u64(&mut buf)?;
        let handle = BlobHandle::decode_from(&mut buf)?;

        if buf.has_remaining() {
            return Err(BlobError::corruption(format!(
                "{} trailing bytes after index record",
                buf.remaining()
            )));
        }

        Ok(Self {
            file_number,
            handle,
        })
    }
}

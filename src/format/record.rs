//! Blob Record encoding
//!
//! One record holds exactly one key-value pair:
//! ```text
//! payload = [KeyLen: varint][Key][ValLen: varint][Value]
//! block   = [Len: u64 LE][compress(payload)][Tag: u8][MaskedCRC: u32 LE]
//! ```

use bytes::{Buf, BufMut, BytesMut};

use crate::codec::{compress, crc, decompress, CompressionType};
use crate::error::{BlobError, Result};
use crate::varint::{decode_varint_u64, encode_varint_u64, varint_len};

use super::{frame_size, BlobHandle, LENGTH_HEADER_SIZE, TRAILER_SIZE};

/// A block ready to be appended: length header, stored data, trailer
#[derive(Debug, Clone)]
pub struct EncodedRecord {
    length_header: [u8; LENGTH_HEADER_SIZE as usize],
    data: Vec<u8>,
    trailer: [u8; TRAILER_SIZE as usize],
    compression: CompressionType,
}

impl EncodedRecord {
    /// Frame already-compressed `data` whose format is `compression`.
    ///
    /// The length header and checksum are always derived from `data`
    /// itself, so a frame can never carry a stale length.
    pub fn frame(data: Vec<u8>, compression: CompressionType) -> Self {
        let length_header = (data.len() as u64).to_le_bytes();

        let tag = compression.tag();
        let checksum = crc::mask(crc::extend(crc::value(&data), &[tag]));

        let mut trailer = [0u8; TRAILER_SIZE as usize];
        trailer[0] = tag;
        trailer[1..].copy_from_slice(&checksum.to_le_bytes());

        Self {
            length_header,
            data,
            trailer,
            compression,
        }
    }

    pub fn length_header(&self) -> &[u8] {
        &self.length_header
    }

    /// Stored (compressed) bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn trailer(&self) -> &[u8] {
        &self.trailer
    }

    /// Algorithm that actually describes `data()`
    pub fn compression(&self) -> CompressionType {
        self.compression
    }

    /// Length of the stored bytes, as written in the length header
    pub fn data_len(&self) -> u64 {
        self.data.len() as u64
    }

    /// Total bytes this block occupies on disk
    pub fn frame_size(&self) -> u64 {
        frame_size(self.data_len())
    }

    /// Contiguous on-disk representation
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.frame_size() as usize);
        out.extend_from_slice(&self.length_header);
        out.extend_from_slice(&self.data);
        out.extend_from_slice(&self.trailer);
        out
    }
}

// =============================================================================
// Encoding
// =============================================================================

/// Encode the uncompressed record payload for one key-value pair
pub fn encode_payload(key: &[u8], value: &[u8]) -> Vec<u8> {
    let capacity = varint_len(key.len() as u64)
        + key.len()
        + varint_len(value.len() as u64)
        + value.len();
    let mut buf = BytesMut::with_capacity(capacity);

    encode_varint_u64(&mut buf, key.len() as u64);
    buf.put_slice(key);
    encode_varint_u64(&mut buf, value.len() as u64);
    buf.put_slice(value);

    buf.to_vec()
}

/// Encode, compress and frame one key-value pair
pub fn encode_record(key: &[u8], value: &[u8], compression: CompressionType) -> EncodedRecord {
    let payload = encode_payload(key, value);
    let (data, actual) = compress(&payload, compression);
    EncodedRecord::frame(data, actual)
}

// =============================================================================
// Decoding
// =============================================================================

/// Verify and strip the trailer of `raw` (stored data followed by the
/// trailer), returning the decompressed contents.
pub fn decode_block(raw: &[u8], size: u64) -> Result<Vec<u8>> {
    if size.checked_add(TRAILER_SIZE) != Some(raw.len() as u64) {
        return Err(BlobError::corruption(format!(
            "block length mismatch: handle size {} with {} bytes read",
            size,
            raw.len()
        )));
    }

    let (data, mut trailer) = raw.split_at(size as usize);
    let tag = trailer.get_u8();
    let stored = crc::unmask(trailer.get_u32_le());

    let actual = crc::extend(crc::value(data), &[tag]);
    if actual != stored {
        return Err(BlobError::corruption(format!(
            "block checksum mismatch: expected {:#010x}, got {:#010x}",
            stored, actual
        )));
    }

    let compression = CompressionType::from_tag(tag)?;
    decompress(data, compression)
}

/// Split a record payload back into its key and value
pub fn decode_payload(payload: &[u8]) -> Result<(Vec<u8>, Vec<u8>)> {
    let mut buf = payload;

    let key = read_length_prefixed(&mut buf, "key")?;
    let value = read_length_prefixed(&mut buf, "value")?;

    if buf.has_remaining() {
        return Err(BlobError::corruption(format!(
            "{} trailing bytes after record value",
            buf.remaining()
        )));
    }

    Ok((key, value))
}

/// Decode a full record read for `handle`: verify, decompress, split.
///
/// The returned key is whatever the record holds; it is not compared with
/// the key that was looked up.
pub fn decode_record(raw: &[u8], handle: &BlobHandle) -> Result<(Vec<u8>, Vec<u8>)> {
    let payload = decode_block(raw, handle.size())?;
    decode_payload(&payload)
}

fn read_length_prefixed(buf: &mut &[u8], field: &str) -> Result<Vec<u8>> {
    let len = decode_varint_u64(buf)?;
    if len > buf.remaining() as u64 {
        return Err(BlobError::corruption(format!(
            "record {} length {} exceeds remaining {} bytes",
            field,
            len,
            buf.remaining()
        )));
    }
    let len = len as usize;
    let bytes = buf[..len].to_vec();
    buf.advance(len);
    Ok(bytes)
}

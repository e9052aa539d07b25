//! Variable-length Integer Encoding (Varint)
//!
//! Unsigned integers are written 7 bits per byte, low bits first, with the
//! high bit of each byte set while more bytes follow:
//! - 0-127 use 1 byte
//! - a full u64 uses at most 10 bytes
//!
//! Decoding never panics: input read from disk or from the primary store may
//! be truncated or garbage, and both cases surface as `Corruption`.

use bytes::{Buf, BufMut};

use crate::error::{BlobError, Result};

/// Longest valid encoding of a u64
pub const MAX_VARINT_LEN: usize = 10;

/// Encode an unsigned integer as a varint
pub fn encode_varint_u64(buf: &mut impl BufMut, mut value: u64) {
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;

        if value != 0 {
            byte |= 0x80; // Set continuation bit
        }

        buf.put_u8(byte);

        if value == 0 {
            break;
        }
    }
}

/// Number of bytes `encode_varint_u64` writes for `value`
pub fn varint_len(mut value: u64) -> usize {
    let mut len = 1;
    while value >= 0x80 {
        value >>= 7;
        len += 1;
    }
    len
}

/// Decode a varint to an unsigned integer
pub fn decode_varint_u64(buf: &mut impl Buf) -> Result<u64> {
    let mut value: u64 = 0;
    let mut shift = 0;

    loop {
        if !buf.has_remaining() {
            return Err(BlobError::corruption("truncated varint"));
        }
        let byte = buf.get_u8();

        // The tenth byte may only contribute the top bit of a u64
        if shift == 63 && byte > 1 {
            return Err(BlobError::corruption("varint overflows u64"));
        }
        value |= ((byte & 0x7F) as u64) << shift;

        if (byte & 0x80) == 0 {
            return Ok(value);
        }

        shift += 7;
    }
}

//! CRC32 helpers
//!
//! Checksums stored on disk are masked: a CRC computed over data that itself
//! contains embedded CRCs is easy to get wrong, and an all-zero region would
//! otherwise carry a plausible-looking zero checksum.

const MASK_DELTA: u32 = 0xa282_ead8;

/// CRC32 of `data`
pub fn value(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}

/// Continue a CRC32 computed by [`value`] over more bytes
pub fn extend(crc: u32, data: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new_with_initial(crc);
    hasher.update(data);
    hasher.finalize()
}

/// Mask a CRC for storage
pub fn mask(crc: u32) -> u32 {
    ((crc >> 15) | (crc << 17)).wrapping_add(MASK_DELTA)
}

/// Inverse of [`mask`]
pub fn unmask(masked: u32) -> u32 {
    let rot = masked.wrapping_sub(MASK_DELTA);
    (rot >> 17) | (rot << 15)
}

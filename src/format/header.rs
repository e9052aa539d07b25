//! Blob Log Header
//!
//! Written once at file creation, immediately before the first record.
//! The header is a property block (named u64 properties, sorted by name)
//! framed exactly like a record, so it carries its own checksum.
//!
//! ## Property Block
//! ```text
//! [Count: varint]
//! [NameLen: varint][Name][Value: u64 LE]   (sorted by name)
//! ... repeated Count times ...
//! ```

use std::collections::BTreeMap;

use bytes::{Buf, BufMut, BytesMut};

use crate::codec::CompressionType;
use crate::error::{BlobError, Result};
use crate::varint::{decode_varint_u64, encode_varint_u64};

use super::{
    decode_block, EncodedRecord, BLOB_LOG_MAGIC, FORMAT_VERSION, LENGTH_HEADER_SIZE, TRAILER_SIZE,
};

const PROP_MAGIC: &str = "magic";
const PROP_VERSION: &str = "version";
const PROP_HAS_TTL: &str = "has_ttl";
const PROP_COMPRESSION: &str = "compression";
const PROP_EARLIEST: &str = "earliest";
const PROP_LATEST: &str = "latest";

// =============================================================================
// Property Block
// =============================================================================

/// Ordered mapping of named u64 properties
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyBlock {
    properties: BTreeMap<String, u64>,
}

impl PropertyBlock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a property
    pub fn add(&mut self, name: &str, value: u64) {
        self.properties.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<u64> {
        self.properties.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Properties in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = BytesMut::new();
        encode_varint_u64(&mut buf, self.properties.len() as u64);
        for (name, value) in &self.properties {
            encode_varint_u64(&mut buf, name.len() as u64);
            buf.put_slice(name.as_bytes());
            buf.put_u64_le(*value);
        }
        buf.to_vec()
    }

    pub fn decode(block: &[u8]) -> Result<Self> {
        let mut buf = block;
        let count = decode_varint_u64(&mut buf)?;

        let mut properties = BTreeMap::new();
        for _ in 0..count {
            let name_len = decode_varint_u64(&mut buf)?;
            if name_len > buf.remaining() as u64 {
                return Err(BlobError::corruption("truncated property name"));
            }
            let name_len = name_len as usize;
            let name = std::str::from_utf8(&buf[..name_len])
                .map_err(|_| BlobError::corruption("property name is not UTF-8"))?
                .to_string();
            buf.advance(name_len);

            if buf.remaining() < 8 {
                return Err(BlobError::corruption(format!(
                    "truncated value for property '{}'",
                    name
                )));
            }
            let value = buf.get_u64_le();
            properties.insert(name, value);
        }

        if buf.has_remaining() {
            return Err(BlobError::corruption("trailing bytes after property block"));
        }

        Ok(Self { properties })
    }
}

// =============================================================================
// Header
// =============================================================================

/// Header of a blob log file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobLogHeader {
    version: u64,
    compression: CompressionType,
    /// `Some((earliest, latest))` iff the log was created with TTL support
    ttl_range: Option<(u64, u64)>,
}

impl BlobLogHeader {
    /// Header for a new log. With TTL enabled the range starts at `(0, 0)`.
    pub fn new(has_ttl: bool, compression: CompressionType) -> Self {
        Self {
            version: FORMAT_VERSION,
            compression,
            ttl_range: has_ttl.then_some((0, 0)),
        }
    }

    /// Header for a TTL log with a known expiration range
    pub fn with_ttl_range(compression: CompressionType, earliest: u64, latest: u64) -> Self {
        Self {
            version: FORMAT_VERSION,
            compression,
            ttl_range: Some((earliest, latest)),
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn has_ttl(&self) -> bool {
        self.ttl_range.is_some()
    }

    pub fn compression(&self) -> CompressionType {
        self.compression
    }

    pub fn earliest(&self) -> Option<u64> {
        self.ttl_range.map(|(earliest, _)| earliest)
    }

    pub fn latest(&self) -> Option<u64> {
        self.ttl_range.map(|(_, latest)| latest)
    }

    pub fn to_properties(&self) -> PropertyBlock {
        let mut props = PropertyBlock::new();
        props.add(PROP_MAGIC, BLOB_LOG_MAGIC);
        props.add(PROP_VERSION, self.version);
        props.add(PROP_HAS_TTL, u64::from(self.has_ttl()));
        props.add(PROP_COMPRESSION, u64::from(self.compression.tag()));
        if let Some((earliest, latest)) = self.ttl_range {
            props.add(PROP_EARLIEST, earliest);
            props.add(PROP_LATEST, latest);
        }
        props
    }

    pub fn from_properties(props: &PropertyBlock) -> Result<Self> {
        let require = |name: &str| {
            props
                .get(name)
                .ok_or_else(|| BlobError::corruption(format!("header missing '{}'", name)))
        };

        let magic = require(PROP_MAGIC)?;
        if magic != BLOB_LOG_MAGIC {
            return Err(BlobError::corruption(format!(
                "bad blob log magic {:#018x}",
                magic
            )));
        }

        let version = require(PROP_VERSION)?;
        if version != FORMAT_VERSION {
            return Err(BlobError::corruption(format!(
                "unsupported blob log version {}",
                version
            )));
        }

        let tag = u8::try_from(require(PROP_COMPRESSION)?)
            .map_err(|_| BlobError::corruption("compression property out of range"))?;
        let compression = CompressionType::from_tag(tag)?;

        let ttl_range = match require(PROP_HAS_TTL)? {
            0 => None,
            1 => Some((require(PROP_EARLIEST)?, require(PROP_LATEST)?)),
            other => {
                return Err(BlobError::corruption(format!(
                    "invalid has_ttl value {}",
                    other
                )))
            }
        };

        Ok(Self {
            version,
            compression,
            ttl_range,
        })
    }

    /// Frame the header for writing at offset 0
    pub fn encode(&self) -> EncodedRecord {
        EncodedRecord::frame(self.to_properties().encode(), CompressionType::None)
    }

    /// Bytes the header occupies at the start of the file
    pub fn encoded_size(&self) -> u64 {
        self.encode().frame_size()
    }

    /// Decode a header from the start of a log file.
    ///
    /// `bytes` may extend past the header; the header's frame size is
    /// returned alongside it.
    pub fn decode(bytes: &[u8]) -> Result<(Self, u64)> {
        let mut buf = bytes;
        if buf.remaining() < LENGTH_HEADER_SIZE as usize {
            return Err(BlobError::corruption("truncated header length"));
        }
        let block_len = buf.get_u64_le();
        let frame = block_len
            .checked_add(LENGTH_HEADER_SIZE + TRAILER_SIZE)
            .ok_or_else(|| BlobError::corruption("header length overflows"))?;
        if (bytes.len() as u64) < frame {
            return Err(BlobError::corruption(format!(
                "truncated header: need {} bytes, have {}",
                frame,
                bytes.len()
            )));
        }

        let raw = &bytes[LENGTH_HEADER_SIZE as usize..frame as usize];
        let block = decode_block(raw, block_len)?;
        let header = Self::from_properties(&PropertyBlock::decode(&block)?)?;
        Ok((header, frame))
    }
}

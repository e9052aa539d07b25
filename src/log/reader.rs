//! Blob Log Reader
//!
//! Random-access, checksum-verified reads from the log file.

use std::path::{Path, PathBuf};

use bytes::Buf;

use crate::error::{BlobError, Result};
use crate::format::{
    decode_block, decode_payload, BlobHandle, BlobLogHeader, LENGTH_HEADER_SIZE, TRAILER_SIZE,
};

use super::file::{LogFileReader, RandomAccessFile};

/// Reads blocks from a log file by handle.
///
/// Holds its own file handle, independent of the writer. All methods take
/// `&self`, so one reader can serve many threads.
pub struct BlobLogReader {
    path: PathBuf,
    file: Box<dyn RandomAccessFile>,
}

impl BlobLogReader {
    /// Open a log file for reading
    pub fn open(path: &Path) -> Result<Self> {
        let file = LogFileReader::open(path)?;
        Ok(Self::with_file(path, Box::new(file)))
    }

    /// Read through an already opened file
    pub fn with_file(path: &Path, file: Box<dyn RandomAccessFile>) -> Self {
        Self {
            path: path.to_path_buf(),
            file,
        }
    }

    /// Read the block at `handle`, verify its trailer and return the
    /// decompressed record payload
    pub fn read(&self, handle: &BlobHandle) -> Result<Vec<u8>> {
        let raw = self.file.read_at(handle.offset(), handle.read_len())?;

        let payload = decode_block(&raw, handle.size()).map_err(|e| {
            tracing::warn!(
                path = %self.path.display(),
                offset = handle.offset(),
                size = handle.size(),
                error = %e,
                "Corrupt blob block"
            );
            e
        })?;

        tracing::trace!(offset = handle.offset(), size = handle.size(), "Blob read");
        Ok(payload)
    }

    /// Read the block at `handle` and split it into key and value
    pub fn read_entry(&self, handle: &BlobHandle) -> Result<(Vec<u8>, Vec<u8>)> {
        let payload = self.read(handle)?;
        decode_payload(&payload)
    }

    /// Decode and verify the header at the start of the file
    pub fn read_header(&self) -> Result<BlobLogHeader> {
        let (header, _) = self.read_header_frame()?;
        Ok(header)
    }

    /// Iterate over every record after the header, in file order
    pub fn iter(&self) -> Result<RecordIterator<'_>> {
        let (_, header_size) = self.read_header_frame()?;
        Ok(RecordIterator {
            reader: self,
            position: header_size,
            end: self.file.size()?,
            done: false,
        })
    }

    /// Current length of the log file
    pub fn file_size(&self) -> Result<u64> {
        Ok(self.file.size()?)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_header_frame(&self) -> Result<(BlobLogHeader, u64)> {
        let len_bytes = self.file.read_at(0, LENGTH_HEADER_SIZE)?;
        let block_len = (&len_bytes[..]).get_u64_le();
        let frame_len = block_len
            .checked_add(LENGTH_HEADER_SIZE + TRAILER_SIZE)
            .ok_or_else(|| BlobError::corruption("header length overflows"))?;

        let frame = self.file.read_at(0, frame_len)?;
        BlobLogHeader::decode(&frame)
    }
}

/// Sequential walk over the records of a log.
///
/// Yields `(handle, key, value)` per record. The first error (including a
/// truncated trailing frame) is yielded once and ends the iteration.
pub struct RecordIterator<'a> {
    reader: &'a BlobLogReader,
    /// Offset of the next length header
    position: u64,
    /// File length when iteration started
    end: u64,
    done: bool,
}

impl RecordIterator<'_> {
    /// Offset of the next record to be read
    pub fn position(&self) -> u64 {
        self.position
    }

    fn next_record(&mut self) -> Result<(BlobHandle, Vec<u8>, Vec<u8>)> {
        let remaining = self.end - self.position;
        if remaining < LENGTH_HEADER_SIZE {
            return Err(BlobError::corruption(format!(
                "truncated length header at offset {}",
                self.position
            )));
        }

        let len_bytes = self.reader.file.read_at(self.position, LENGTH_HEADER_SIZE)?;
        let size = (&len_bytes[..]).get_u64_le();
        let handle = BlobHandle::new(self.position + LENGTH_HEADER_SIZE, size);

        if handle.end_offset() > self.end {
            return Err(BlobError::corruption(format!(
                "truncated record at offset {}: needs {} bytes, {} remain",
                self.position,
                handle.end_offset() - self.position,
                remaining
            )));
        }

        let (key, value) = self.reader.read_entry(&handle)?;
        self.position = handle.end_offset();
        Ok((handle, key, value))
    }
}

impl Iterator for RecordIterator<'_> {
    type Item = Result<(BlobHandle, Vec<u8>, Vec<u8>)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.position >= self.end {
            return None;
        }

        let item = self.next_record();
        if item.is_err() {
            self.done = true;
        }
        Some(item)
    }
}

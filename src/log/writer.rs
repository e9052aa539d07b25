//! Blob Log Writer
//!
//! Appends framed records to the active log file and keeps the in-memory
//! offset in step with what has been flushed to the OS.

use std::io;
use std::path::{Path, PathBuf};

use crate::codec::CompressionType;
use crate::config::Config;
use crate::error::{BlobError, Result};
use crate::format::{encode_record, BlobHandle, BlobLogHeader, EncodedRecord, LENGTH_HEADER_SIZE};

use super::file::{LogFileWriter, WritableFile};

/// File number of the single active log. Index records always carry it.
pub const ACTIVE_FILE_NUMBER: u64 = 0;

/// Counters describing what the writer has done so far
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriterStats {
    /// Records appended and flushed
    pub records_written: u64,
    /// Record bytes appended (header excluded)
    pub bytes_written: u64,
    /// Successful durability syncs
    pub syncs: u64,
}

/// Appends records to one log file
///
/// ## Offset bookkeeping
/// - `writer_offset`: bytes handed to the OS so far, header included.
///   Advanced only after a whole frame has been written and flushed.
/// - `next_sync_offset`: once `writer_offset` passes it, the file is synced
///   and the threshold moves forward by one `bytes_per_sync` interval.
///
/// ## Failed appends
/// A frame that fails part way may leave bytes buffered in the file that
/// `writer_offset` does not account for. The writer is then poisoned: every
/// later `append` and `sync` fails with `Io` until the log is recreated.
pub struct BlobLogWriter {
    /// Path of the log file
    path: PathBuf,
    /// Sequential file handle
    file: Box<dyn WritableFile>,
    /// Header written at creation
    header: BlobLogHeader,
    /// Requested payload compression
    compression: CompressionType,
    /// Number of this log file
    file_number: u64,
    writer_offset: u64,
    next_sync_offset: u64,
    bytes_per_sync: u64,
    use_fsync: bool,
    stats: WriterStats,
    /// Set once a frame write or flush failed
    poisoned: bool,
}

impl BlobLogWriter {
    /// Create (or truncate) the log file at `path` and write its header
    ///
    /// The config is validated before the file is touched.
    pub fn create(path: &Path, config: &Config) -> Result<Self> {
        config.validate()?;
        let file = LogFileWriter::create(path)?;
        Self::start(path, Box::new(file), config)
    }

    /// Start a log on an already opened file; writes the header
    pub fn with_file(path: &Path, file: Box<dyn WritableFile>, config: &Config) -> Result<Self> {
        config.validate()?;
        Self::start(path, file, config)
    }

    /// Write the header and set up offsets; `config` is already validated
    fn start(path: &Path, file: Box<dyn WritableFile>, config: &Config) -> Result<Self> {
        let header = BlobLogHeader::new(config.has_ttl, config.compression);
        let mut writer = Self {
            path: path.to_path_buf(),
            file,
            header,
            compression: config.compression,
            file_number: ACTIVE_FILE_NUMBER,
            writer_offset: 0,
            next_sync_offset: config.bytes_per_sync,
            bytes_per_sync: config.bytes_per_sync,
            use_fsync: config.use_fsync,
            stats: WriterStats::default(),
            poisoned: false,
        };

        let frame = writer.header.encode();
        writer.write_frame(&frame)?;
        writer.writer_offset = frame.frame_size();

        tracing::debug!(
            path = %writer.path.display(),
            header_size = writer.writer_offset,
            has_ttl = config.has_ttl,
            "Blob log created"
        );

        Ok(writer)
    }

    /// Append one key-value pair.
    ///
    /// Returns the handle of the stored bytes: its offset is the pre-append
    /// write offset plus the length header.
    pub fn append(&mut self, key: &[u8], value: &[u8]) -> Result<BlobHandle> {
        self.check_poisoned()?;

        let record = encode_record(key, value, self.compression);
        let handle = BlobHandle::new(self.writer_offset + LENGTH_HEADER_SIZE, record.data_len());

        if let Err(e) = self.write_frame(&record) {
            self.poisoned = true;
            tracing::error!(
                offset = self.writer_offset,
                error = %e,
                "Blob append failed, writer poisoned"
            );
            return Err(BlobError::Io(e));
        }

        self.writer_offset += record.frame_size();
        self.stats.records_written += 1;
        self.stats.bytes_written += record.frame_size();

        tracing::trace!(
            offset = handle.offset(),
            size = handle.size(),
            compression = %record.compression(),
            "Blob appended"
        );

        self.maybe_sync()?;
        Ok(handle)
    }

    /// Make everything appended so far durable
    pub fn sync(&mut self) -> Result<()> {
        self.check_poisoned()?;

        self.file.sync(self.use_fsync).map_err(|e| {
            tracing::error!(offset = self.writer_offset, error = %e, "Blob log sync failed");
            BlobError::Io(e)
        })?;
        self.stats.syncs += 1;

        tracing::debug!(offset = self.writer_offset, "Blob log synced");
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Bytes flushed to the log so far, header included
    pub fn offset(&self) -> u64 {
        self.writer_offset
    }

    /// Offset past which the next sync is issued
    pub fn next_sync_offset(&self) -> u64 {
        self.next_sync_offset
    }

    pub fn file_number(&self) -> u64 {
        self.file_number
    }

    pub fn header(&self) -> &BlobLogHeader {
        &self.header
    }

    pub fn stats(&self) -> WriterStats {
        self.stats
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True once an append failed part way; the writer accepts no more writes
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Write length header, data and trailer in order, then flush
    fn write_frame(&mut self, frame: &EncodedRecord) -> io::Result<()> {
        self.file.append(frame.length_header())?;
        self.file.append(frame.data())?;
        self.file.append(frame.trailer())?;
        self.file.flush()
    }

    fn check_poisoned(&self) -> Result<()> {
        if self.poisoned {
            return Err(BlobError::Io(io::Error::other(format!(
                "blob log {} is unusable after a failed append",
                self.path.display()
            ))));
        }
        Ok(())
    }

    fn maybe_sync(&mut self) -> Result<()> {
        if self.writer_offset > self.next_sync_offset {
            self.next_sync_offset += self.bytes_per_sync;
            self.sync()?;
        }
        Ok(())
    }
}

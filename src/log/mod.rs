//! Blob Log Module
//!
//! Append-only log holding the blob records.
//!
//! ## Responsibilities
//! - Write the header once when the log is created
//! - Append framed records and track the write offset
//! - Flush every append, sync every `bytes_per_sync` bytes
//! - Random-access, checksum-verified reads by handle
//!
//! ## Concurrency
//! - `BlobLogWriter` needs `&mut self`; callers serialize appends
//! - `BlobLogReader` is `&self` only and safe to share across threads

mod file;
mod reader;
mod writer;

pub use file::{LogFileReader, LogFileWriter, RandomAccessFile, WritableFile};
pub use reader::{BlobLogReader, RecordIterator};
pub use writer::{BlobLogWriter, WriterStats, ACTIVE_FILE_NUMBER};

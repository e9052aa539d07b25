//! File abstractions
//!
//! The writer appends through [`WritableFile`] and the reader fetches byte
//! ranges through [`RandomAccessFile`]. The `LogFile*` types are the
//! filesystem-backed implementations.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Sequential append-only file
pub trait WritableFile: Send {
    /// Append bytes (may stay buffered in-process)
    fn append(&mut self, data: &[u8]) -> io::Result<()>;

    /// Hand buffered bytes to the OS
    fn flush(&mut self) -> io::Result<()>;

    /// Flush, then make the file durable.
    /// `use_fsync` also syncs file metadata.
    fn sync(&mut self, use_fsync: bool) -> io::Result<()>;
}

/// File readable at arbitrary offsets through a shared reference
pub trait RandomAccessFile: Send + Sync {
    /// Read exactly `len` bytes starting at `offset`.
    /// A range past the end of the file is an `UnexpectedEof` error.
    fn read_at(&self, offset: u64, len: u64) -> io::Result<Vec<u8>>;

    /// Current length of the file in bytes
    fn size(&self) -> io::Result<u64>;
}

// =============================================================================
// Filesystem Writer
// =============================================================================

/// Buffered writer over a freshly created (truncated) file
pub struct LogFileWriter {
    writer: BufWriter<File>,
}

impl LogFileWriter {
    pub fn create(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        Ok(Self {
            writer: BufWriter::new(file),
        })
    }
}

impl WritableFile for LogFileWriter {
    fn append(&mut self, data: &[u8]) -> io::Result<()> {
        self.writer.write_all(data)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    fn sync(&mut self, use_fsync: bool) -> io::Result<()> {
        self.writer.flush()?;
        if use_fsync {
            self.writer.get_ref().sync_all()
        } else {
            self.writer.get_ref().sync_data()
        }
    }
}

// =============================================================================
// Filesystem Reader
// =============================================================================

/// Positioned reads over an open file; no shared cursor, so no locking
pub struct LogFileReader {
    file: File,
}

impl LogFileReader {
    pub fn open(path: &Path) -> io::Result<Self> {
        Ok(Self {
            file: File::open(path)?,
        })
    }
}

impl RandomAccessFile for LogFileReader {
    fn read_at(&self, offset: u64, len: u64) -> io::Result<Vec<u8>> {
        let file_len = self.size()?;
        let in_bounds = offset.checked_add(len).is_some_and(|end| end <= file_len);
        if !in_bounds {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "read of {} bytes at offset {} past end of file ({} bytes)",
                    len, offset, file_len
                ),
            ));
        }

        let mut buf = vec![0u8; len as usize];
        read_exact_at(&self.file, &mut buf, offset)?;
        Ok(buf)
    }

    fn size(&self) -> io::Result<u64> {
        Ok(self.file.metadata()?.len())
    }
}

#[cfg(unix)]
fn read_exact_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<()> {
    use std::os::unix::fs::FileExt;
    file.read_exact_at(buf, offset)
}

#[cfg(windows)]
fn read_exact_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<()> {
    use std::os::windows::fs::FileExt;

    let mut done = 0;
    while done < buf.len() {
        let n = file.seek_read(&mut buf[done..], offset + done as u64)?;
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "failed to fill whole buffer",
            ));
        }
        done += n;
    }
    Ok(())
}

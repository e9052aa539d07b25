//! BlobDB Module
//!
//! The public facade that composes the blob log and the primary store.
//!
//! ## Responsibilities
//! - Resolve and create the blob directory
//! - Write blobs to the log and publish index records
//! - Resolve keys through the index and read blobs back

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;

use crate::config::Config;
use crate::error::{BlobError, Result};
use crate::format::LOG_FILE_NAME;
use crate::index::{IndexRecord, PrimaryStore};
use crate::log::{BlobLogReader, BlobLogWriter, WriterStats, ACTIVE_FILE_NUMBER};

/// Blob store beside a primary key-value store
///
/// ## Concurrency Model: Single Writer / Lock-free Readers
///
/// - **Writes** (put): Serialized by the `writer` mutex
///   - Held across append + flush + (sync) + index put
///   - An index record is only published after its bytes were flushed
///
/// - **Reads** (get): No lock
///   - The reader uses positioned reads on its own file handle
///   - Handles come from the primary store, so they only ever name
///     flushed byte ranges
///
/// ## Durability
/// Flushed is not synced: a crash can lose the unsynced tail of the log
/// even though its index records were already published.
pub struct BlobDb {
    /// Configuration the database was opened with
    config: Config,

    /// Resolved blob directory
    blob_dir: PathBuf,

    /// Primary store holding index records
    store: Arc<dyn PrimaryStore>,

    /// Append side of the log (exclusive access needed)
    writer: Mutex<BlobLogWriter>,

    /// Read side of the log (shared)
    reader: BlobLogReader,
}

impl BlobDb {
    /// Open the blob store.
    ///
    /// On startup:
    /// 1. Resolve the blob directory (`NotSupported` if none configured)
    /// 2. Create the directory if missing
    /// 3. Create the log file and write its header (the writer validates
    ///    the config)
    /// 4. Open the random-access reader on the same file
    ///
    /// An existing log file is truncated; its index records are not
    /// reconciled.
    pub fn open(config: Config, store: Arc<dyn PrimaryStore>) -> Result<Self> {
        // Step 1: Resolve the directory
        let blob_dir = config
            .resolve_blob_dir(store.name())
            .ok_or_else(|| BlobError::NotSupported("No blob directory in options".to_string()))?;

        // Step 2: Create it
        fs::create_dir_all(&blob_dir)?;

        // Step 3: Writer (header written here)
        let log_path = blob_dir.join(LOG_FILE_NAME);
        let writer = BlobLogWriter::create(&log_path, &config)?;

        // Step 4: Reader
        let reader = BlobLogReader::open(&log_path)?;

        tracing::info!(
            path = %log_path.display(),
            compression = %config.compression,
            has_ttl = config.has_ttl,
            bytes_per_sync = config.bytes_per_sync,
            "BlobDB opened"
        );

        Ok(Self {
            config,
            blob_dir,
            store,
            writer: Mutex::new(writer),
            reader,
        })
    }

    /// Store `value` under `key`.
    ///
    /// Steps (under the writer lock):
    /// 1. Append the record to the log (flushed, maybe synced)
    /// 2. Put the index record into the primary store
    ///
    /// The two steps are not atomic: if step 2 fails the blob stays in the
    /// log unreferenced.
    ///
    /// A failed append poisons the writer: later puts (and `close`) fail
    /// with `Io` until the database is reopened.
    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let mut writer = self.writer.lock();

        let handle = writer.append(key, value)?;
        let index = IndexRecord::new(writer.file_number(), handle);
        self.store.put(key, &index.encode())?;

        tracing::debug!(
            key_len = key.len(),
            value_len = value.len(),
            offset = handle.offset(),
            size = handle.size(),
            "Blob put"
        );
        Ok(())
    }

    /// Store `value` under `key`, expiring `ttl_secs` seconds from now
    pub fn put_with_ttl(&self, key: &[u8], value: &[u8], ttl_secs: u32) -> Result<()> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        self.put_until(key, value, now.saturating_add(u64::from(ttl_secs)))
    }

    /// Store `value` under `key`, expiring at `expiration` (unix seconds).
    ///
    /// Expiring blobs are not implemented: this always returns
    /// `NotSupported` and writes nothing.
    pub fn put_until(&self, key: &[u8], _value: &[u8], expiration: u64) -> Result<()> {
        tracing::debug!(key_len = key.len(), expiration, "put_until rejected");
        Err(BlobError::NotSupported(
            "TTL-based insertion is not implemented".to_string(),
        ))
    }

    /// Fetch the value stored under `key`.
    ///
    /// Errors:
    /// - `NotFound`: no index record for `key`
    /// - `Corruption`: bad index record, checksum or record layout
    /// - `Io`: the log could not be read (e.g. the handle runs past its end)
    pub fn get(&self, key: &[u8]) -> Result<Vec<u8>> {
        // Step 1: Index lookup
        let encoded = self.store.get(key)?.ok_or(BlobError::NotFound)?;

        // Step 2: Decode the index record
        let index = IndexRecord::decode(&encoded)?;
        if index.file_number != ACTIVE_FILE_NUMBER {
            return Err(BlobError::corruption(format!(
                "index record names unknown blob file {}",
                index.file_number
            )));
        }

        // Step 3: Read and verify the block
        let (_key, value) = self.reader.read_entry(&index.handle)?;
        Ok(value)
    }

    /// Sync the log and close the database
    pub fn close(self) -> Result<()> {
        let mut writer = self.writer.into_inner();
        writer.sync()?;

        tracing::info!(
            path = %writer.path().display(),
            offset = writer.offset(),
            records = writer.stats().records_written,
            "BlobDB closed"
        );
        Ok(())
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Current write offset of the log (bytes flushed, header included)
    pub fn writer_offset(&self) -> u64 {
        self.writer.lock().offset()
    }

    /// Offset past which the next durability sync is issued
    pub fn next_sync_offset(&self) -> u64 {
        self.writer.lock().next_sync_offset()
    }

    pub fn writer_stats(&self) -> WriterStats {
        self.writer.lock().stats()
    }

    /// Path of the active log file
    pub fn log_path(&self) -> PathBuf {
        self.blob_dir.join(LOG_FILE_NAME)
    }

    pub fn blob_dir(&self) -> &Path {
        &self.blob_dir
    }

    /// The read side of the log
    pub fn reader(&self) -> &BlobLogReader {
        &self.reader
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

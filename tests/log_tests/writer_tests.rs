//! Tests for Blob Log Writer
//!
//! These tests verify:
//! - Header written on creation
//! - Handle offsets and write-offset bookkeeping
//! - Sync cadence (once per crossed interval, not per write)
//! - Offsets never advance past a failed append
//! - A partly written frame poisons the writer
//! - Sync failures are surfaced

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use blobdb::codec::CompressionType;
use blobdb::config::{Config, DEFAULT_BYTES_PER_SYNC};
use blobdb::format::{frame_size, BlobLogHeader, LENGTH_HEADER_SIZE};
use blobdb::log::{BlobLogReader, BlobLogWriter, WritableFile};
use blobdb::BlobError;
use parking_lot::Mutex;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_log() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("blob_log");
    (temp_dir, path)
}

fn uncompressed_config() -> Config {
    Config::builder()
        .blob_dir("unused")
        .compression(CompressionType::None)
        .build()
}

/// Stored size of an uncompressed record with single-byte varint lengths
fn small_record_size(key: &[u8], value: &[u8]) -> u64 {
    frame_size(1 + key.len() as u64 + 1 + value.len() as u64)
}

fn file_len(path: &Path) -> u64 {
    fs::metadata(path).unwrap().len()
}

/// In-memory file that records what reached "disk" and can be made to fail
#[derive(Default)]
struct MockState {
    buffered: Vec<u8>,
    flushed: Vec<u8>,
    syncs: u64,
    /// Calls to `append` so far (header frame included)
    appends: usize,
    fail_append: bool,
    /// Fail only the n-th call to `append` (1-based)
    fail_append_at: Option<usize>,
    fail_sync: bool,
}

#[derive(Clone, Default)]
struct MockFile {
    state: Arc<Mutex<MockState>>,
}

impl WritableFile for MockFile {
    fn append(&mut self, data: &[u8]) -> io::Result<()> {
        let mut state = self.state.lock();
        state.appends += 1;
        if state.fail_append || state.fail_append_at == Some(state.appends) {
            return Err(io::Error::other("injected append failure"));
        }
        state.buffered.extend_from_slice(data);
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut state = self.state.lock();
        let pending = std::mem::take(&mut state.buffered);
        state.flushed.extend_from_slice(&pending);
        Ok(())
    }

    fn sync(&mut self, _use_fsync: bool) -> io::Result<()> {
        self.flush()?;
        let mut state = self.state.lock();
        if state.fail_sync {
            return Err(io::Error::other("injected sync failure"));
        }
        state.syncs += 1;
        Ok(())
    }
}

fn mock_writer(config: &Config) -> (MockFile, BlobLogWriter) {
    let file = MockFile::default();
    let writer =
        BlobLogWriter::with_file(Path::new("mock"), Box::new(file.clone()), config).unwrap();
    (file, writer)
}

// =============================================================================
// Creation Tests
// =============================================================================

#[test]
fn test_create_writes_header() {
    let (_temp, path) = setup_temp_log();

    let writer = BlobLogWriter::create(&path, &uncompressed_config()).unwrap();

    let header_size = BlobLogHeader::new(false, CompressionType::None).encoded_size();
    assert_eq!(writer.offset(), header_size);
    assert_eq!(file_len(&path), header_size);
    assert_eq!(writer.file_number(), 0);
    assert_eq!(writer.stats().records_written, 0);
}

#[test]
fn test_create_truncates_existing_file() {
    let (_temp, path) = setup_temp_log();
    fs::write(&path, vec![0xAB; 4096]).unwrap();

    let writer = BlobLogWriter::create(&path, &uncompressed_config()).unwrap();

    assert_eq!(file_len(&path), writer.offset());
}

#[test]
fn test_create_ttl_header_readable() {
    let (_temp, path) = setup_temp_log();
    let config = Config::builder().blob_dir("unused").has_ttl(true).build();

    let writer = BlobLogWriter::create(&path, &config).unwrap();
    let header = BlobLogReader::open(&path).unwrap().read_header().unwrap();

    assert_eq!(&header, writer.header());
    assert!(header.has_ttl());
    assert_eq!(header.earliest(), Some(0));
    assert_eq!(header.latest(), Some(0));
}

#[test]
fn test_create_rejects_zero_sync_interval() {
    let (_temp, path) = setup_temp_log();
    let config = Config::builder().blob_dir("unused").bytes_per_sync(0).build();

    let result = BlobLogWriter::create(&path, &config);

    assert!(matches!(result, Err(BlobError::Config(_))));
    assert!(!path.exists());
}

#[test]
fn test_rejected_config_keeps_existing_file() {
    let (_temp, path) = setup_temp_log();
    fs::write(&path, b"existing log").unwrap();
    let config = Config::builder().blob_dir("unused").bytes_per_sync(0).build();

    assert!(BlobLogWriter::create(&path, &config).is_err());
    assert_eq!(fs::read(&path).unwrap(), b"existing log");
}

#[test]
fn test_default_sync_interval() {
    let (_temp, path) = setup_temp_log();

    let writer = BlobLogWriter::create(&path, &Config::default()).unwrap();

    assert_eq!(DEFAULT_BYTES_PER_SYNC, 128 * 1024 * 1024);
    assert_eq!(writer.next_sync_offset(), DEFAULT_BYTES_PER_SYNC);
}

// =============================================================================
// Append / Offset Tests
// =============================================================================

#[test]
fn test_append_returns_handle_past_length_header() {
    let (_temp, path) = setup_temp_log();
    let mut writer = BlobLogWriter::create(&path, &uncompressed_config()).unwrap();
    let before = writer.offset();

    let handle = writer.append(b"key", b"value").unwrap();

    assert_eq!(handle.offset(), before + LENGTH_HEADER_SIZE);
    assert_eq!(handle.size(), 1 + 3 + 1 + 5);
    assert_eq!(writer.offset(), before + small_record_size(b"key", b"value"));
}

#[test]
fn test_offset_matches_file_length() {
    let (_temp, path) = setup_temp_log();
    let mut writer = BlobLogWriter::create(&path, &uncompressed_config()).unwrap();
    let header_size = writer.offset();

    let mut expected = header_size;
    for i in 0..100 {
        let key = format!("key{:03}", i);
        let value = format!("value{}", i);
        let handle = writer.append(key.as_bytes(), value.as_bytes()).unwrap();

        assert_eq!(handle.offset(), expected + LENGTH_HEADER_SIZE);
        expected += small_record_size(key.as_bytes(), value.as_bytes());

        assert_eq!(writer.offset(), expected);
        assert_eq!(file_len(&path), expected);
    }

    let stats = writer.stats();
    assert_eq!(stats.records_written, 100);
    assert_eq!(stats.bytes_written, expected - header_size);
}

#[test]
fn test_handles_are_contiguous() {
    let (_temp, path) = setup_temp_log();
    let mut writer = BlobLogWriter::create(&path, &Config::default()).unwrap();

    let mut previous_end = writer.offset();
    for i in 0..50 {
        let value = vec![i as u8; i * 100];
        let handle = writer.append(format!("k{}", i).as_bytes(), &value).unwrap();

        assert_eq!(handle.offset(), previous_end + LENGTH_HEADER_SIZE);
        previous_end = handle.end_offset();
    }
    assert_eq!(previous_end, writer.offset());
}

#[test]
fn test_appended_records_readable() {
    let (_temp, path) = setup_temp_log();
    let mut writer = BlobLogWriter::create(&path, &Config::default()).unwrap();

    let small = writer.append(b"small", b"v").unwrap();
    let large_value = vec![7u8; 100_000];
    let large = writer.append(b"large", &large_value).unwrap();

    let reader = BlobLogReader::open(&path).unwrap();
    assert_eq!(reader.read_entry(&small).unwrap(), (b"small".to_vec(), b"v".to_vec()));
    assert_eq!(reader.read_entry(&large).unwrap().1, large_value);
}

// =============================================================================
// Sync Cadence Tests
// =============================================================================

#[test]
fn test_no_sync_below_interval() {
    let (file, mut writer) = mock_writer(&uncompressed_config());

    for i in 0..100 {
        writer.append(format!("k{}", i).as_bytes(), b"v").unwrap();
    }

    assert_eq!(file.state.lock().syncs, 0);
    assert_eq!(writer.stats().syncs, 0);
}

#[test]
fn test_sync_once_per_interval() {
    let interval = 1024;
    let config = Config::builder()
        .blob_dir("unused")
        .compression(CompressionType::None)
        .bytes_per_sync(interval)
        .build();
    let (file, mut writer) = mock_writer(&config);

    let value = vec![b'v'; 100];
    let mut expected_syncs = 0;
    let mut threshold = interval;
    for i in 0..200 {
        let key = format!("k{:03}", i);
        writer.append(key.as_bytes(), &value).unwrap();

        // Each record (119 bytes) is smaller than the interval, so at most
        // one boundary is crossed per append
        if writer.offset() > threshold {
            threshold += interval;
            expected_syncs += 1;
        }
        assert_eq!(writer.stats().syncs, expected_syncs, "after record {}", i);
        assert_eq!(writer.next_sync_offset(), threshold);
    }

    let total = writer.offset();
    assert_eq!(expected_syncs, (total - 1) / interval);
    assert_eq!(file.state.lock().syncs, expected_syncs);
    assert!(expected_syncs < 200);
}

#[test]
fn test_large_record_advances_threshold_one_interval() {
    let interval = 1000;
    let config = Config::builder()
        .blob_dir("unused")
        .compression(CompressionType::None)
        .bytes_per_sync(interval)
        .build();
    let (_file, mut writer) = mock_writer(&config);

    // One record spanning several intervals
    writer.append(b"big", &vec![0u8; 3500]).unwrap();
    assert_eq!(writer.stats().syncs, 1);
    assert_eq!(writer.next_sync_offset(), 2 * interval);

    // The threshold is still behind the offset, so the next append syncs too
    writer.append(b"k", b"v").unwrap();
    assert_eq!(writer.stats().syncs, 2);
    assert_eq!(writer.next_sync_offset(), 3 * interval);
}

#[test]
fn test_explicit_sync() {
    let (file, mut writer) = mock_writer(&uncompressed_config());

    writer.append(b"k", b"v").unwrap();
    writer.sync().unwrap();

    assert_eq!(file.state.lock().syncs, 1);
    assert_eq!(writer.stats().syncs, 1);
}

// =============================================================================
// Failure Tests
// =============================================================================

#[test]
fn test_failed_append_does_not_advance_offset() {
    let (file, mut writer) = mock_writer(&uncompressed_config());
    writer.append(b"first", b"ok").unwrap();
    let offset = writer.offset();

    file.state.lock().fail_append = true;
    let result = writer.append(b"second", b"fails");

    assert!(matches!(result, Err(BlobError::Io(_))));
    assert_eq!(writer.offset(), offset);
    assert_eq!(writer.stats().records_written, 1);
    assert!(writer.is_poisoned());

    // Still refused once the file works again
    file.state.lock().fail_append = false;
    assert!(matches!(writer.append(b"third", b"ok"), Err(BlobError::Io(_))));
    assert_eq!(writer.offset(), offset);
    assert_eq!(file.state.lock().flushed.len() as u64, offset);
}

#[test]
fn test_partial_frame_poisons_writer() {
    let (file, mut writer) = mock_writer(&uncompressed_config());
    let header_size = writer.offset();
    assert!(!writer.is_poisoned());

    // Header took appends 1-3; the first record's trailer is append 6
    file.state.lock().fail_append_at = Some(6);
    let result = writer.append(b"k1", b"v1");
    assert!(matches!(result, Err(BlobError::Io(_))));
    assert!(writer.is_poisoned());

    // Length header and data are left buffered; a retry must not publish a
    // handle behind them
    assert!(!file.state.lock().buffered.is_empty());
    let retry = writer.append(b"k1", b"v1");
    assert!(matches!(retry, Err(BlobError::Io(_))));

    let state = file.state.lock();
    assert_eq!(state.appends, 6);
    assert_eq!(state.flushed.len() as u64, header_size);
    assert_eq!(writer.offset(), header_size);
    assert_eq!(writer.stats().records_written, 0);
}

#[test]
fn test_poisoned_writer_refuses_sync() {
    let (file, mut writer) = mock_writer(&uncompressed_config());
    let header_size = writer.offset();

    file.state.lock().fail_append_at = Some(5);
    assert!(writer.append(b"key", b"value").is_err());

    assert!(matches!(writer.sync(), Err(BlobError::Io(_))));

    // The partial frame never reaches the file
    let state = file.state.lock();
    assert_eq!(state.syncs, 0);
    assert_eq!(state.flushed.len() as u64, header_size);
}

#[test]
fn test_failed_header_write() {
    let file = MockFile::default();
    file.state.lock().fail_append = true;

    let result = BlobLogWriter::with_file(
        Path::new("mock"),
        Box::new(file.clone()),
        &uncompressed_config(),
    );

    assert!(matches!(result, Err(BlobError::Io(_))));
    assert!(file.state.lock().flushed.is_empty());
}

#[test]
fn test_sync_failure_is_surfaced() {
    let config = Config::builder()
        .blob_dir("unused")
        .compression(CompressionType::None)
        .bytes_per_sync(100)
        .build();
    let (file, mut writer) = mock_writer(&config);
    file.state.lock().fail_sync = true;

    let before = writer.offset();
    let result = writer.append(b"key", &[1u8; 200]);

    assert!(matches!(result, Err(BlobError::Io(_))));
    // The record was flushed before the sync was attempted
    let flushed = file.state.lock().flushed.len() as u64;
    assert_eq!(writer.offset(), flushed);
    assert!(writer.offset() > before);
    assert_eq!(writer.stats().syncs, 0);
    assert_eq!(writer.next_sync_offset(), 200);
}

#[test]
fn test_flushed_bytes_match_offset() {
    let (file, mut writer) = mock_writer(&Config::default());

    for i in 0..20 {
        writer.append(format!("k{}", i).as_bytes(), &vec![i as u8; 1000]).unwrap();
        let state = file.state.lock();
        assert!(state.buffered.is_empty(), "every append is flushed");
        assert_eq!(state.flushed.len() as u64, writer.offset());
    }
}

//! Configuration for BlobDB
//!
//! Centralized configuration with sensible defaults.

use std::path::{Path, PathBuf};

use crate::codec::CompressionType;
use crate::error::{BlobError, Result};

/// Sync the log file to stable storage every 128 MiB of appended bytes
pub const DEFAULT_BYTES_PER_SYNC: u64 = 128 * 1024 * 1024;

/// Main configuration for a BlobDB instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Directory holding the blob log. Required; an empty path means
    /// "no blob directory configured".
    /// Internal structure:
    ///   {blob_dir}/
    ///     └── blob_log        (header + appended records)
    pub blob_dir: PathBuf,

    /// Resolve `blob_dir` under the primary store's own directory
    pub path_relative: bool,

    // -------------------------------------------------------------------------
    // Format Configuration
    // -------------------------------------------------------------------------
    /// Write the TTL range properties into the log header
    pub has_ttl: bool,

    /// Compression applied to record payloads
    pub compression: CompressionType,

    // -------------------------------------------------------------------------
    // Durability Configuration
    // -------------------------------------------------------------------------
    /// Appended bytes between durability syncs
    pub bytes_per_sync: u64,

    /// Use a full fsync (data + metadata) instead of fdatasync
    pub use_fsync: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            blob_dir: PathBuf::new(),
            path_relative: false,
            has_ttl: false,
            compression: CompressionType::Lz4,
            bytes_per_sync: DEFAULT_BYTES_PER_SYNC,
            use_fsync: false,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check values that would make the log unusable.
    ///
    /// A missing blob directory is not checked here: it is reported as
    /// `NotSupported` when the database is opened.
    pub fn validate(&self) -> Result<()> {
        if self.bytes_per_sync == 0 {
            return Err(BlobError::Config(
                "bytes_per_sync must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolve the blob directory, given the primary store's directory.
    ///
    /// Returns `None` when no blob directory is configured.
    pub fn resolve_blob_dir(&self, primary_dir: &Path) -> Option<PathBuf> {
        if self.blob_dir.as_os_str().is_empty() {
            return None;
        }
        if self.path_relative {
            Some(primary_dir.join(&self.blob_dir))
        } else {
            Some(self.blob_dir.clone())
        }
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the blob directory
    pub fn blob_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.blob_dir = path.into();
        self
    }

    /// Resolve the blob directory relative to the primary store
    pub fn path_relative(mut self, relative: bool) -> Self {
        self.config.path_relative = relative;
        self
    }

    /// Enable the TTL properties in the log header
    pub fn has_ttl(mut self, has_ttl: bool) -> Self {
        self.config.has_ttl = has_ttl;
        self
    }

    /// Set the payload compression algorithm
    pub fn compression(mut self, compression: CompressionType) -> Self {
        self.config.compression = compression;
        self
    }

    /// Set the sync interval (in bytes)
    pub fn bytes_per_sync(mut self, bytes: u64) -> Self {
        self.config.bytes_per_sync = bytes;
        self
    }

    /// Use fsync rather than fdatasync for durability syncs
    pub fn use_fsync(mut self, use_fsync: bool) -> Self {
        self.config.use_fsync = use_fsync;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

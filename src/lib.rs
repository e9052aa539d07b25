//! # BlobDB
//!
//! A blob log that sits beside a primary ordered key-value store:
//! - Large values are appended to a dedicated log file
//! - Each record is compressed and carries a masked CRC32
//! - The primary store keeps only a small index record per key
//! - Single-writer / lock-free-reader concurrency model
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         BlobDb                               │
//! │               put / put_with_ttl / get                       │
//! └──────────────┬──────────────────────────────┬───────────────┘
//!                │                              │
//!                ▼                              ▼
//!   ┌────────────────────────┐      ┌────────────────────────┐
//!   │       Blob Log         │      │     Index Bridge       │
//!   │ Writer (Mutex) │Reader │      │  IndexRecord encoding  │
//!   └───────────┬────────────┘      └───────────┬────────────┘
//!               │                               │
//!               ▼                               ▼
//!   ┌────────────────────────┐      ┌────────────────────────┐
//!   │  Record Format + Codec │      │     Primary Store      │
//!   │ (LZ4, masked CRC32)    │      │    (PrimaryStore)      │
//!   └────────────────────────┘      └────────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod codec;
pub mod varint;
pub mod format;
pub mod log;
pub mod index;
pub mod db;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{BlobError, Result};
pub use config::Config;
pub use codec::CompressionType;
pub use db::BlobDb;
pub use format::BlobHandle;
pub use index::{MemStore, PrimaryStore};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of BlobDB
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

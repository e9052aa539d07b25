//! Primary store abstraction
//!
//! The ordered key-value store that holds index records. BlobDB only needs
//! point puts and gets of opaque bytes, plus the store's directory for
//! resolving a relative blob directory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;

use crate::error::Result;

/// Point put/get of opaque byte strings
pub trait PrimaryStore: Send + Sync {
    /// Store `value` under `key`, replacing any previous value
    fn put(&self, key: &[u8], value: &[u8]) -> Result<()>;

    /// Fetch the value under `key`; `Ok(None)` if absent
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Directory of the store, used as the base for relative blob dirs
    fn name(&self) -> &Path;
}

/// In-memory primary store
///
/// ## Concurrency:
/// - `data`: RwLock (many concurrent readers, exclusive writer)
pub struct MemStore {
    /// Nominal directory of the store
    name: PathBuf,

    /// Sorted key → value map
    data: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemStore {
    pub fn new(name: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            data: RwLock::new(BTreeMap::new()),
        }
    }

    /// Number of keys stored
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}

impl PrimaryStore for MemStore {
    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.data.write().insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.data.read().get(key).cloned())
    }

    fn name(&self) -> &Path {
        &self.name
    }
}

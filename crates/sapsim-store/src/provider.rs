//! The data provider contract consumed by endpoint handlers.
//!
//! Uses enum dispatch instead of trait objects because async methods are
//! not dyn-compatible. Every call may fail; the only ordering guarantee
//! is read-after-write on a single key from the same caller.

use std::path::PathBuf;

use crate::error::StoreError;
use crate::file::FileStore;
use crate::memory::MemoryStore;
use crate::record::{Record, RecordFilter};

/// A source of mock business records.
#[derive(Debug)]
pub enum DataProvider {
    /// Volatile process memory.
    Memory(MemoryStore),
    /// JSON documents on disk.
    File(FileStore),
}

impl DataProvider {
    /// An empty in-memory provider.
    pub fn in_memory() -> Self {
        Self::Memory(MemoryStore::new())
    }

    /// A file-backed provider rooted at `directory`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory cannot be created.
    pub async fn file(directory: impl Into<PathBuf>) -> Result<Self, StoreError> {
        Ok(Self::File(FileStore::open(directory).await?))
    }

    /// Read one record; `Ok(None)` when the key is absent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backend cannot complete the read.
    pub async fn read(&self, collection: &str, key: &str) -> Result<Option<Record>, StoreError> {
        match self {
            Self::Memory(store) => store.read(collection, key).await,
            Self::File(store) => store.read(collection, key).await,
        }
    }

    /// Insert or replace one record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backend cannot complete the write.
    pub async fn write(&self, collection: &str, key: &str, record: Record) -> Result<(), StoreError> {
        match self {
            Self::Memory(store) => store.write(collection, key, record).await,
            Self::File(store) => store.write(collection, key, record).await,
        }
    }

    /// Remove one record, reporting whether it existed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backend cannot complete the delete.
    pub async fn delete(&self, collection: &str, key: &str) -> Result<bool, StoreError> {
        match self {
            Self::Memory(store) => store.delete(collection, key).await,
            Self::File(store) => store.delete(collection, key).await,
        }
    }

    /// List the records of `collection` passing `filter`, in key order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backend cannot complete the listing.
    pub async fn list(&self, collection: &str, filter: &RecordFilter) -> Result<Vec<Record>, StoreError> {
        match self {
            Self::Memory(store) => store.list(collection, filter).await,
            Self::File(store) => store.list(collection, filter).await,
        }
    }

    /// Liveness check used by data-store health probes.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backend is unreachable.
    pub async fn ping(&self) -> Result<(), StoreError> {
        match self {
            Self::Memory(_) => Ok(()),
            Self::File(store) => store.ping().await,
        }
    }

    /// Human-readable backend name for logging.
    pub const fn name(&self) -> &str {
        match self {
            Self::Memory(_) => "memory",
            Self::File(_) => "file",
        }
    }
}

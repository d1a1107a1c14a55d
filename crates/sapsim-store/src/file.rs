//! File-backed provider.
//!
//! Each collection is stored as one JSON document, `{directory}/{collection}.json`,
//! holding an object that maps record keys to records. Writes rewrite the
//! whole document through a temporary file followed by a rename, so a
//! crash mid-write leaves the previous document intact.
//!
//! All mutations go through a single [`Mutex`]; reads do not take it and
//! may observe the document before or after a concurrent write, but never
//! a torn one.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::sync::Mutex;

use crate::error::StoreError;
use crate::memory::check_names;
use crate::record::{Record, RecordFilter, valid_name};

type Document = BTreeMap<String, Record>;

/// Provider persisting collections as JSON files in one directory.
#[derive(Debug)]
pub struct FileStore {
    directory: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Open (and create if needed) the data directory.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory cannot be created.
    pub async fn open(directory: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let directory = directory.into();
        tokio::fs::create_dir_all(&directory)
            .await
            .map_err(|e| StoreError::io(&directory, e))?;
        tracing::info!(directory = %directory.display(), "File data store opened");
        Ok(Self {
            directory,
            write_lock: Mutex::new(()),
        })
    }

    /// The directory holding the collection documents.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Read one record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the name is invalid or the document cannot
    /// be read or parsed.
    pub async fn read(&self, collection: &str, key: &str) -> Result<Option<Record>, StoreError> {
        check_names(collection, key)?;
        let mut document = self.load(collection).await?;
        Ok(document.remove(key))
    }

    /// Insert or replace one record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the name is invalid or the document cannot
    /// be read, parsed or written.
    pub async fn write(&self, collection: &str, key: &str, record: Record) -> Result<(), StoreError> {
        check_names(collection, key)?;
        let _guard = self.write_lock.lock().await;
        let mut document = self.load(collection).await?;
        document.insert(key.to_owned(), record);
        self.store(collection, &document).await
    }

    /// Remove one record, reporting whether it existed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the name is invalid or the document cannot
    /// be read, parsed or written.
    pub async fn delete(&self, collection: &str, key: &str) -> Result<bool, StoreError> {
        check_names(collection, key)?;
        let _guard = self.write_lock.lock().await;
        let mut document = self.load(collection).await?;
        if document.remove(key).is_none() {
            return Ok(false);
        }
        self.store(collection, &document).await?;
        Ok(true)
    }

    /// List the records of a collection that pass `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the name is invalid or the document cannot
    /// be read or parsed.
    pub async fn list(&self, collection: &str, filter: &RecordFilter) -> Result<Vec<Record>, StoreError> {
        if !valid_name(collection) {
            return Err(StoreError::InvalidName(collection.to_owned()));
        }
        let document = self.load(collection).await?;
        Ok(filter.apply(document.values()))
    }

    /// Check that the data directory is still reachable.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory metadata cannot be read.
    pub async fn ping(&self) -> Result<(), StoreError> {
        let metadata = tokio::fs::metadata(&self.directory)
            .await
            .map_err(|e| StoreError::io(&self.directory, e))?;
        if metadata.is_dir() {
            Ok(())
        } else {
            Err(StoreError::io(
                &self.directory,
                std::io::Error::new(ErrorKind::NotADirectory, "data path is not a directory"),
            ))
        }
    }

    fn document_path(&self, collection: &str) -> PathBuf {
        self.directory.join(format!("{collection}.json"))
    }

    async fn load(&self, collection: &str) -> Result<Document, StoreError> {
        let path = self.document_path(collection);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Document::new()),
            Err(e) => return Err(StoreError::io(&path, e)),
        };
        serde_json::from_slice(&bytes).map_err(|e| StoreError::Corrupt {
            collection: collection.to_owned(),
            message: e.to_string(),
        })
    }

    async fn store(&self, collection: &str, document: &Document) -> Result<(), StoreError> {
        let path = self.document_path(collection);
        let tmp = self.directory.join(format!(".{collection}.json.tmp"));
        let bytes = serde_json::to_vec_pretty(document)?;
        tokio::fs::write(&tmp, bytes)
            .await
            .map_err(|e| StoreError::io(&tmp, e))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| StoreError::io(&path, e))?;
        tracing::debug!(collection, records = document.len(), "Collection document written");
        Ok(())
    }
}

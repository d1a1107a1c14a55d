//! Volatile in-memory provider.
//!
//! Collections are kept in a [`BTreeMap`] behind a [`RwLock`], so `list`
//! returns records in key order.

use std::collections::BTreeMap;

use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::record::{Record, RecordFilter, valid_name};

type Collections = BTreeMap<String, BTreeMap<String, Record>>;

/// Provider holding every collection in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<Collections>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read one record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidName`] for an unusable collection name.
    pub async fn read(&self, collection: &str, key: &str) -> Result<Option<Record>, StoreError> {
        check_names(collection, key)?;
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|records| records.get(key))
            .cloned())
    }

    /// Insert or replace one record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidName`] for an unusable collection name.
    pub async fn write(&self, collection: &str, key: &str, record: Record) -> Result<(), StoreError> {
        check_names(collection, key)?;
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_owned())
            .or_default()
            .insert(key.to_owned(), record);
        Ok(())
    }

    /// Remove one record, reporting whether it existed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidName`] for an unusable collection name.
    pub async fn delete(&self, collection: &str, key: &str) -> Result<bool, StoreError> {
        check_names(collection, key)?;
        let mut collections = self.collections.write().await;
        Ok(collections
            .get_mut(collection)
            .and_then(|records| records.remove(key))
            .is_some())
    }

    /// List the records of a collection that pass `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidName`] for an unusable collection name.
    pub async fn list(&self, collection: &str, filter: &RecordFilter) -> Result<Vec<Record>, StoreError> {
        if !valid_name(collection) {
            return Err(StoreError::InvalidName(collection.to_owned()));
        }
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|records| filter.apply(records.values()))
            .unwrap_or_default())
    }
}

pub(crate) fn check_names(collection: &str, key: &str) -> Result<(), StoreError> {
    if !valid_name(collection) {
        return Err(StoreError::InvalidName(collection.to_owned()));
    }
    if key.is_empty() {
        return Err(StoreError::InvalidName(String::from("<empty key>")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn read_after_write() {
        let store = MemoryStore::new();
        let written = store
            .write("Materials", "MAT-1", json!({"Material": "MAT-1"}))
            .await;
        assert!(written.is_ok());

        let read = store.read("Materials", "MAT-1").await.ok().flatten();
        assert_eq!(read, Some(json!({"Material": "MAT-1"})));
    }

    #[tokio::test]
    async fn missing_record_is_none() {
        let store = MemoryStore::new();
        let read = store.read("Materials", "nope").await;
        assert!(matches!(read, Ok(None)));
    }

    #[tokio::test]
    async fn delete_reports_existence() {
        let store = MemoryStore::new();
        let _ = store.write("Materials", "MAT-1", json!({})).await;
        assert!(matches!(store.delete("Materials", "MAT-1").await, Ok(true)));
        assert!(matches!(store.delete("Materials", "MAT-1").await, Ok(false)));
    }

    #[tokio::test]
    async fn list_applies_filter() {
        let store = MemoryStore::new();
        let _ = store.write("Orders", "1", json!({"Status": "OPEN"})).await;
        let _ = store.write("Orders", "2", json!({"Status": "DONE"})).await;
        let _ = store.write("Orders", "3", json!({"Status": "OPEN"})).await;

        let open = store
            .list("Orders", &RecordFilter::all().with("Status", "OPEN"))
            .await
            .unwrap_or_default();
        assert_eq!(open.len(), 2);

        let unknown = store.list("Unknown", &RecordFilter::all()).await;
        assert!(matches!(unknown, Ok(ref v) if v.is_empty()));
    }

    #[tokio::test]
    async fn rejects_traversal_names() {
        let store = MemoryStore::new();
        let result = store.write("../x", "1", json!({})).await;
        assert!(matches!(result, Err(StoreError::InvalidName(_))));
    }
}

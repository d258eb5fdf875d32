//! In-process store.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{KeyValueStore, Record, TabularStore};
use crate::errors::{MentionScoutError, Result};

/// The full contents of a store: collections, scalars and properties.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoreData {
    /// Named collections of rows.
    #[serde(default)]
    pub collections: HashMap<String, Vec<Record>>,
    /// Single-value locations.
    #[serde(default)]
    pub scalars: HashMap<String, String>,
    /// Durable key-value properties.
    #[serde(default)]
    pub properties: HashMap<String, String>,
}

impl StoreData {
    pub(crate) fn append(&mut self, collection: &str, record: Record) {
        self.collections
            .entry(collection.to_string())
            .or_default()
            .push(record);
    }

    pub(crate) fn read_all(&self, collection: &str) -> Vec<Record> {
        self.collections.get(collection).cloned().unwrap_or_default()
    }

    pub(crate) fn update_row(&mut self, collection: &str, index: usize, record: Record) -> Result<()> {
        let rows = self.rows_mut(collection, index)?;
        rows[index] = record;
        Ok(())
    }

    pub(crate) fn delete_row(&mut self, collection: &str, index: usize) -> Result<Record> {
        let rows = self.rows_mut(collection, index)?;
        Ok(rows.remove(index))
    }

    fn rows_mut(&mut self, collection: &str, index: usize) -> Result<&mut Vec<Record>> {
        let rows = self
            .collections
            .get_mut(collection)
            .ok_or_else(|| MentionScoutError::store(format!("collection '{collection}' not found")))?;
        if index >= rows.len() {
            return Err(MentionScoutError::store(format!(
                "row {index} out of range for '{collection}' ({} rows)",
                rows.len()
            )));
        }
        Ok(rows)
    }
}

/// A store held entirely in memory.
///
/// Used by tests and as a scratch store; nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<StoreData>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `data`.
    #[must_use]
    pub fn with_data(data: StoreData) -> Self {
        Self {
            data: RwLock::new(data),
        }
    }

    /// Returns a copy of the current contents.
    #[must_use]
    pub fn snapshot(&self) -> StoreData {
        self.data.read().clone()
    }

    /// Number of rows in a collection.
    #[must_use]
    pub fn row_count(&self, collection: &str) -> usize {
        self.data
            .read()
            .collections
            .get(collection)
            .map_or(0, Vec::len)
    }
}

#[async_trait]
impl TabularStore for MemoryStore {
    async fn append(&self, collection: &str, record: Record) -> Result<()> {
        self.data.write().append(collection, record);
        Ok(())
    }

    async fn read_all(&self, collection: &str) -> Result<Vec<Record>> {
        Ok(self.data.read().read_all(collection))
    }

    async fn update_row(&self, collection: &str, index: usize, record: Record) -> Result<()> {
        self.data.write().update_row(collection, index, record)
    }

    async fn delete_row(&self, collection: &str, index: usize) -> Result<Record> {
        self.data.write().delete_row(collection, index)
    }

    async fn read_scalar(&self, location: &str) -> Result<Option<String>> {
        Ok(self.data.read().scalars.get(location).cloned())
    }

    async fn write_scalar(&self, location: &str, value: &str) -> Result<()> {
        self.data
            .write()
            .scalars
            .insert(location.to_string(), value.to_string());
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.data.read().properties.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.data
            .write()
            .properties
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

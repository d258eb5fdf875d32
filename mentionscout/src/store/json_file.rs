//! Store backed by a single JSON document on disk.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::memory::StoreData;
use super::{KeyValueStore, Record, TabularStore};
use crate::errors::Result;

/// A durable store that rewrites its JSON file after every mutation.
///
/// Writes go to a sibling temp file which is then renamed over the target,
/// so a crash mid-write leaves the previous document intact.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    data: RwLock<StoreData>,
}

impl JsonFileStore {
    /// Opens the store at `path`, starting empty if the file does not exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let data = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            if raw.trim().is_empty() {
                StoreData::default()
            } else {
                serde_json::from_str(&raw)?
            }
        } else {
            StoreData::default()
        };
        debug!(path = %path.display(), "Opened JSON file store");
        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns a copy of the current contents.
    #[must_use]
    pub fn snapshot(&self) -> StoreData {
        self.data.read().clone()
    }

    fn mutate<T>(&self, f: impl FnOnce(&mut StoreData) -> Result<T>) -> Result<T> {
        let mut data = self.data.write();
        let out = f(&mut data)?;
        self.persist(&data)?;
        Ok(out)
    }

    fn persist(&self, data: &StoreData) -> Result<()> {
        let json = serde_json::to_string_pretty(data)?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[async_trait]
impl TabularStore for JsonFileStore {
    async fn append(&self, collection: &str, record: Record) -> Result<()> {
        self.mutate(|data| {
            data.append(collection, record);
            Ok(())
        })
    }

    async fn read_all(&self, collection: &str) -> Result<Vec<Record>> {
        Ok(self.data.read().read_all(collection))
    }

    async fn update_row(&self, collection: &str, index: usize, record: Record) -> Result<()> {
        self.mutate(|data| data.update_row(collection, index, record))
    }

    async fn delete_row(&self, collection: &str, index: usize) -> Result<Record> {
        self.mutate(|data| data.delete_row(collection, index))
    }

    async fn read_scalar(&self, location: &str) -> Result<Option<String>> {
        Ok(self.data.read().scalars.get(location).cloned())
    }

    async fn write_scalar(&self, location: &str, value: &str) -> Result<()> {
        self.mutate(|data| {
            data.scalars.insert(location.to_string(), value.to_string());
            Ok(())
        })
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.data.read().properties.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.mutate(|data| {
            data.properties.insert(key.to_string(), value.to_string());
            Ok(())
        })
    }
}

//! Record storage seams.
//!
//! The pipeline never talks to a concrete storage product. It sees a
//! [`TabularStore`] (named collections of rows plus single-value scalar
//! locations) and a [`KeyValueStore`] for small state that must survive
//! between runs.

use async_trait::async_trait;

use crate::errors::Result;

mod json_file;
mod memory;
mod rows;

pub use json_file::JsonFileStore;
pub use memory::{MemoryStore, StoreData};
pub use rows::{
    opportunity_from_record, opportunity_to_record, query_from_record, query_to_record,
    url_of_record,
};

/// One row of a collection. Cells are plain text.
pub type Record = Vec<String>;

/// A generic tabular record store.
///
/// Row indexes are 0-based and count data rows only.
#[async_trait]
pub trait TabularStore: Send + Sync {
    /// Appends a row to a collection, creating the collection if needed.
    async fn append(&self, collection: &str, record: Record) -> Result<()>;

    /// Returns every row of a collection. A missing collection is empty.
    async fn read_all(&self, collection: &str) -> Result<Vec<Record>>;

    /// Replaces the row at `index`.
    async fn update_row(&self, collection: &str, index: usize, record: Record) -> Result<()>;

    /// Removes and returns the row at `index`.
    async fn delete_row(&self, collection: &str, index: usize) -> Result<Record>;

    /// Reads a single-value location.
    async fn read_scalar(&self, location: &str) -> Result<Option<String>>;

    /// Writes a single-value location.
    async fn write_scalar(&self, location: &str, value: &str) -> Result<()>;
}

/// Durable small state that survives across runs.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Gets a value.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Sets a value.
    async fn set(&self, key: &str, value: &str) -> Result<()>;
}

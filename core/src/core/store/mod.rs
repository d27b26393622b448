//! Storage abstraction for names index records.
//!
//! A store keeps three maps:
//! - records by key
//! - record keys by grouping key
//! - qualified record keys by their canonical key
//!
//! Every operation except `start` and `has_started` fails with
//! `StoreError::Unavailable` until the store has been started.

use crate::types::{IndexName, RecordError};
use std::time::SystemTime;

pub(crate) mod db;
pub(crate) mod memory;
pub(crate) mod synced;

pub use db::DbStore;
pub use memory::MemoryStore;
pub use synced::SyncedStore;

pub mod error {
    use crate::core::source::error::SourceError;
    use crate::types::{CodecError, RecordError};
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum StoreError {
        #[error("Database error: {0}")]
        Redb(#[from] redb::DatabaseError),

        #[error("Table error: {0}")]
        Table(#[from] redb::TableError),

        #[error("Storage error: {0}")]
        Storage(#[from] redb::StorageError),

        #[error("Transaction error: {0}")]
        Transaction(#[from] redb::TransactionError),

        #[error("Commit error: {0}")]
        Commit(#[from] redb::CommitError),

        #[error("Compaction error: {0}")]
        Compaction(#[from] redb::CompactionError),

        #[error("IO error: {0}")]
        Io(#[from] std::io::Error),

        #[error("Metadata error: {0}")]
        Metadata(#[from] serde_json::Error),

        #[error("Record encoding error: {0}")]
        Codec(#[from] CodecError),

        #[error("Invalid record: {0}")]
        InvalidRecord(#[from] RecordError),

        #[error("Grouping key must be ASCII: {0:?}")]
        InvalidGroupingKey(String),

        #[error("Name source error: {0}")]
        Source(#[from] SourceError),

        #[error("Names index store is not started")]
        Unavailable,
    }
}

use error::StoreError;

/// Persistent or in-memory map of names index records.
pub trait Store: Send + Sync {
    fn start(&self) -> Result<(), StoreError>;

    /// Flushes and closes the store. Stopping twice is a no-op.
    fn stop(&self) -> Result<(), StoreError>;

    fn has_started(&self) -> bool;

    /// When the store content was created or last cleared.
    fn created(&self) -> Result<Option<SystemTime>, StoreError>;

    fn get(&self, key: u32) -> Result<Option<IndexName>, StoreError>;

    /// All records sharing a grouping key, in ascending key order.
    fn get_by_grouping_key(&self, grouping_key: &str) -> Result<Vec<IndexName>, StoreError>;

    /// Qualified records pointing at the given canonical key, in ascending key order.
    fn get_canonical_group(&self, canonical_key: u32) -> Result<Vec<IndexName>, StoreError>;

    /// Inserts or replaces a record under its grouping key.
    fn add(&self, grouping_key: &str, name: &IndexName) -> Result<(), StoreError> {
        self.add_all(grouping_key, std::slice::from_ref(name))
    }

    /// Inserts or replaces records sharing a grouping key.
    ///
    /// Either every record is written or none is.
    fn add_all(&self, grouping_key: &str, names: &[IndexName]) -> Result<(), StoreError>;

    /// Removes a record; canonical records take their qualified group with them.
    ///
    /// Returns every removed record, the requested one first.
    fn delete(&self, key: u32) -> Result<Vec<IndexName>, StoreError>;

    fn compact(&self) -> Result<(), StoreError>;

    fn clear(&self) -> Result<(), StoreError>;

    fn count(&self) -> Result<usize, StoreError>;

    /// All records in ascending key order.
    fn all(&self) -> Result<Vec<IndexName>, StoreError>;

    /// Highest key ever added since the store was created or last cleared.
    ///
    /// Deleting records never lowers it.
    fn max_key(&self) -> Result<u32, StoreError>;
}

/// Precondition shared by all `Store::add` implementations.
///
/// Returns the record key and canonical id.
pub(crate) fn check_insert(grouping_key: &str, name: &IndexName) -> Result<(u32, u32), StoreError> {
    if !grouping_key.is_ascii() {
        return Err(StoreError::InvalidGroupingKey(grouping_key.to_string()));
    }
    name.check()?;
    match (name.key, name.canonical_id) {
        (Some(key), Some(canonical_id)) => Ok((key, canonical_id)),
        (None, _) => Err(RecordError::MissingKey.into()),
        (_, None) => Err(RecordError::MissingCanonicalId.into()),
    }
}

#[cfg(test)]
mod tests;

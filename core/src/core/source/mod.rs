//! Authoritative store of names that the index mirrors.

use crate::types::IndexName;
use error::SourceError;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};

pub mod error {
    use crate::types::RecordError;
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum SourceError {
        #[error("Name source backend error: {0}")]
        Backend(String),

        #[error("Invalid record: {0}")]
        InvalidRecord(#[from] RecordError),
    }
}

pub trait NameSource: Send + Sync {
    fn count(&self) -> Result<usize, SourceError>;

    /// All records in ascending key order.
    fn all(&self) -> Result<Vec<IndexName>, SourceError>;

    fn create(&self, name: &IndexName) -> Result<(), SourceError> {
        self.create_all(std::slice::from_ref(name))
    }

    /// Creates every record or none of them.
    fn create_all(&self, names: &[IndexName]) -> Result<(), SourceError>;

    fn delete(&self, key: u32) -> Result<(), SourceError>;

    /// Empties the source and resets [`NameSource::max_key`].
    fn truncate(&self) -> Result<(), SourceError>;

    /// Highest key ever created since the source was last truncated.
    fn max_key(&self) -> Result<u32, SourceError>;
}

/// In-process source keyed by record key.
#[derive(Default)]
pub struct MemorySource {
    names: RwLock<BTreeMap<u32, IndexName>>,
    max_key: AtomicU32,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_names(names: impl IntoIterator<Item = IndexName>) -> Result<Self, SourceError> {
        let source = Self::new();
        for name in names {
            source.create(&name)?;
        }
        Ok(source)
    }

    pub fn get(&self, key: u32) -> Option<IndexName> {
        self.names.read().get(&key).cloned()
    }
}

impl NameSource for MemorySource {
    fn count(&self) -> Result<usize, SourceError> {
        Ok(self.names.read().len())
    }

    fn all(&self) -> Result<Vec<IndexName>, SourceError> {
        Ok(self.names.read().values().cloned().collect())
    }

    fn create_all(&self, names: &[IndexName]) -> Result<(), SourceError> {
        for name in names {
            name.check()?;
        }
        let mut stored = self.names.write();
        for name in names {
            if let Some(key) = name.key {
                stored.insert(key, name.clone());
                self.max_key.fetch_max(key, Ordering::AcqRel);
            }
        }
        Ok(())
    }

    fn delete(&self, key: u32) -> Result<(), SourceError> {
        self.names.write().remove(&key);
        Ok(())
    }

    fn truncate(&self) -> Result<(), SourceError> {
        let mut stored = self.names.write();
        stored.clear();
        self.max_key.store(0, Ordering::Release);
        Ok(())
    }

    fn max_key(&self) -> Result<u32, SourceError> {
        Ok(self.max_key.load(Ordering::Acquire))
    }
}

//! Store kept in step with an authoritative [`NameSource`].
//!
//! Writes go to the source first, so a failed source write leaves the local
//! store untouched.

use crate::core::normalizer::grouping_key;
use crate::core::source::NameSource;
use crate::core::store::Store;
use crate::core::store::error::StoreError;
use crate::types::IndexName;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::SystemTime;
use tracing::{info, warn};

pub struct SyncedStore {
    inner: Box<dyn Store>,
    source: Arc<dyn NameSource>,
    verify: bool,
    /// Set once the startup load from the source has finished.
    started: AtomicBool,
}

impl SyncedStore {
    /// `verify` reloads the local store from the source when counts disagree at startup.
    pub fn new(inner: Box<dyn Store>, source: Arc<dyn NameSource>, verify: bool) -> Self {
        Self {
            inner,
            source,
            verify,
            started: AtomicBool::new(false),
        }
    }

    fn ensure_started(&self) -> Result<(), StoreError> {
        if self.has_started() {
            Ok(())
        } else {
            Err(StoreError::Unavailable)
        }
    }

    fn load_from_source(&self) -> Result<usize, StoreError> {
        let names = self.source.all()?;
        for name in &names {
            self.inner.add(&grouping_key(name), name)?;
        }
        Ok(names.len())
    }

    /// Every record a cascading delete of `key` will remove, the requested one first.
    fn cascade(&self, key: u32) -> Result<Vec<u32>, StoreError> {
        let Some(name) = self.inner.get(key)? else {
            return Ok(vec![]);
        };
        let mut keys = vec![key];
        if name.is_canonical() {
            keys.extend(
                self.inner
                    .get_canonical_group(key)?
                    .iter()
                    .filter_map(|n| n.key),
            );
        }
        Ok(keys)
    }
}

impl Store for SyncedStore {
    fn start(&self) -> Result<(), StoreError> {
        if self.has_started() {
            return Ok(());
        }
        self.inner.start()?;

        let local = self.inner.count()?;
        let remote = self.source.count()?;
        if local == 0 {
            if remote > 0 {
                let loaded = self.load_from_source()?;
                info!(records = loaded, "names index loaded from source");
            }
        } else if local != remote {
            if self.verify {
                warn!(local, remote, "names index out of sync with source, reloading");
                self.inner.clear()?;
                let loaded = self.load_from_source()?;
                info!(records = loaded, "names index reloaded from source");
            } else {
                warn!(local, remote, "names index count differs from source");
            }
        }

        self.started.store(true, Ordering::Release);
        Ok(())
    }

    fn stop(&self) -> Result<(), StoreError> {
        self.started.store(false, Ordering::Release);
        self.inner.stop()
    }

    fn has_started(&self) -> bool {
        self.started.load(Ordering::Acquire) && self.inner.has_started()
    }

    fn created(&self) -> Result<Option<SystemTime>, StoreError> {
        self.ensure_started()?;
        self.inner.created()
    }

    fn get(&self, key: u32) -> Result<Option<IndexName>, StoreError> {
        self.ensure_started()?;
        self.inner.get(key)
    }

    fn get_by_grouping_key(&self, grouping_key: &str) -> Result<Vec<IndexName>, StoreError> {
        self.ensure_started()?;
        self.inner.get_by_grouping_key(grouping_key)
    }

    fn get_canonical_group(&self, canonical_key: u32) -> Result<Vec<IndexName>, StoreError> {
        self.ensure_started()?;
        self.inner.get_canonical_group(canonical_key)
    }

    fn add_all(&self, grouping_key: &str, names: &[IndexName]) -> Result<(), StoreError> {
        self.ensure_started()?;
        if !grouping_key.is_ascii() {
            return Err(StoreError::InvalidGroupingKey(grouping_key.to_string()));
        }
        self.source.create_all(names)?;
        self.inner.add_all(grouping_key, names)
    }

    fn delete(&self, key: u32) -> Result<Vec<IndexName>, StoreError> {
        self.ensure_started()?;
        for key in self.cascade(key)? {
            self.source.delete(key)?;
        }
        self.inner.delete(key)
    }

    fn compact(&self) -> Result<(), StoreError> {
        self.ensure_started()?;
        self.inner.compact()
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.ensure_started()?;
        self.source.truncate()?;
        self.inner.clear()
    }

    fn count(&self) -> Result<usize, StoreError> {
        self.ensure_started()?;
        self.inner.count()
    }

    fn all(&self) -> Result<Vec<IndexName>, StoreError> {
        self.ensure_started()?;
        self.inner.all()
    }

    /// The higher of the local and source marks, so keys deleted while the
    /// local store was rebuilt stay retired.
    fn max_key(&self) -> Result<u32, StoreError> {
        self.ensure_started()?;
        Ok(self.inner.max_key()?.max(self.source.max_key()?))
    }
}

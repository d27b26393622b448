//! Names index engine combining a store, the matcher and key assignment.

use crate::core::authorship::AuthorComparator;
use crate::core::matcher::match_candidates;
use crate::core::normalizer::grouping_key;
use crate::core::source::NameSource;
use crate::core::store::{DbStore, MemoryStore, Store, SyncedStore};
use crate::types::{
    BackendKind, CANONICAL_RANK, IndexConfig, IndexName, MATCHER_USER, MatchResult, MatchType,
    Name, RecordError, ScientificName,
};
use error::NamesIndexError;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::SystemTime;
use tracing::{debug, info, trace, warn};

pub mod authorship;
pub mod matcher;
pub mod normalizer;
pub(crate) mod source;
pub(crate) mod store;

pub mod error {
    use crate::core::store::error::StoreError;
    use crate::types::RecordError;
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum NamesIndexError {
        #[error("Names index is not started")]
        Unavailable,

        #[error("Failed to match {label:?}: {source}")]
        Matching {
            label: String,
            source: Box<NamesIndexError>,
        },

        #[error("Invalid record: {0}")]
        InvalidRecord(RecordError),

        #[error("Store error: {0}")]
        Store(StoreError),
    }

    impl From<StoreError> for NamesIndexError {
        fn from(err: StoreError) -> Self {
            match err {
                StoreError::Unavailable => NamesIndexError::Unavailable,
                StoreError::InvalidRecord(err) => NamesIndexError::InvalidRecord(err),
                err => NamesIndexError::Store(err),
            }
        }
    }

    impl From<RecordError> for NamesIndexError {
        fn from(err: RecordError) -> Self {
            NamesIndexError::InvalidRecord(err)
        }
    }
}

/// Receives records removed by a cascading delete so dependants can be matched again.
pub trait RematchListener: Send + Sync {
    fn rematch(&self, removed: &[IndexName]);
}

pub struct NameIndex {
    store: Box<dyn Store>,
    comparator: AuthorComparator,
    seq: AtomicU32,
    /// Set once the store is up and `seq` is seeded.
    started: AtomicBool,
    write_lock: Mutex<()>,
    rematch: Option<Arc<dyn RematchListener>>,
}

/// No match, or only a canonical one for a query that is not canonical itself.
fn needs_insert(result: &MatchResult, query: &Name) -> bool {
    !result.has_match() || (result.kind == MatchType::Canonical && !query.qualifies_as_canonical())
}

impl NameIndex {
    /// Wraps a store. The index is unusable until [`NameIndex::start`].
    pub fn new(store: Box<dyn Store>) -> Self {
        Self {
            store,
            comparator: AuthorComparator::new(),
            seq: AtomicU32::new(0),
            started: AtomicBool::new(false),
            write_lock: Mutex::new(()),
            rematch: None,
        }
    }

    /// Builds the configured store, optionally synced with `source`, and starts it.
    pub fn open(
        config: &IndexConfig,
        source: Option<Arc<dyn NameSource>>,
    ) -> Result<Self, NamesIndexError> {
        let problems = config.validate();
        for problem in &problems {
            warn!(problem = %problem, "invalid names index config value, using default");
        }
        let config = if problems.is_empty() {
            config.clone()
        } else {
            config.with_defaults_for_invalid()
        };

        let store: Box<dyn Store> = match config.backend {
            BackendKind::Memory => Box::new(MemoryStore::new()),
            BackendKind::Embedded | BackendKind::Large => Box::new(DbStore::from_config(&config)),
        };
        let store: Box<dyn Store> = match source {
            Some(source) => Box::new(SyncedStore::new(store, source, config.verify)),
            None => store,
        };

        let index = Self::new(store);
        index.start()?;
        Ok(index)
    }

    pub fn with_rematch_listener(mut self, listener: Arc<dyn RematchListener>) -> Self {
        self.rematch = Some(listener);
        self
    }

    fn next_key(&self) -> u32 {
        self.seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn ensure_started(&self) -> Result<(), NamesIndexError> {
        if self.has_started() {
            Ok(())
        } else {
            Err(NamesIndexError::Unavailable)
        }
    }
}

/// Lifecycle operations.
impl NameIndex {
    /// Starts the store and seeds key assignment from its high-water mark.
    ///
    /// Every other operation fails with `Unavailable` until this returns.
    pub fn start(&self) -> Result<(), NamesIndexError> {
        if self.has_started() {
            return Ok(());
        }
        info!("starting names index");
        self.store.start()?;
        let max_key = self.store.max_key()?;
        self.seq.store(max_key, Ordering::SeqCst);
        self.started.store(true, Ordering::Release);
        info!(names = self.store.count()?, max_key, "names index started");
        Ok(())
    }

    pub fn stop(&self) -> Result<(), NamesIndexError> {
        self.started.store(false, Ordering::Release);
        Ok(self.store.stop()?)
    }

    pub fn has_started(&self) -> bool {
        self.started.load(Ordering::Acquire) && self.store.has_started()
    }

    pub fn created(&self) -> Result<Option<SystemTime>, NamesIndexError> {
        self.ensure_started()?;
        Ok(self.store.created()?)
    }

    /// Removes every record and restarts key assignment at 1.
    pub fn reset(&self) -> Result<(), NamesIndexError> {
        self.ensure_started()?;
        let _guard = self.write_lock.lock();
        self.store.clear()?;
        self.seq.store(0, Ordering::SeqCst);
        info!("names index reset");
        Ok(())
    }

    pub fn compact(&self) -> Result<(), NamesIndexError> {
        self.ensure_started()?;
        Ok(self.store.compact()?)
    }
}

/// Read operations.
impl NameIndex {
    pub fn get(&self, key: u32) -> Result<Option<IndexName>, NamesIndexError> {
        self.ensure_started()?;
        Ok(self.store.get(key)?)
    }

    pub fn get_canonical_group(&self, key: u32) -> Result<Vec<IndexName>, NamesIndexError> {
        self.ensure_started()?;
        Ok(self.store.get_canonical_group(key)?)
    }

    pub fn all(&self) -> Result<Vec<IndexName>, NamesIndexError> {
        self.ensure_started()?;
        Ok(self.store.all()?)
    }

    pub fn size(&self) -> Result<usize, NamesIndexError> {
        self.ensure_started()?;
        Ok(self.store.count()?)
    }
}

/// Matching operations.
impl NameIndex {
    /// Matches a name against the index, inserting it when allowed and needed.
    ///
    /// With `verbose` the result lists the other candidates that shared the
    /// grouping key.
    pub fn match_name(
        &self,
        name: &Name,
        allow_inserts: bool,
        verbose: bool,
    ) -> Result<MatchResult, NamesIndexError> {
        self.ensure_started()?;

        let mut query = name.clone();
        if query.rank.is_none() {
            query.rank = Some(CANONICAL_RANK);
        }

        self.match_or_insert(&query, allow_inserts, verbose)
            .map_err(|err| match err {
                NamesIndexError::Unavailable => NamesIndexError::Unavailable,
                err => NamesIndexError::Matching {
                    label: query.label(),
                    source: Box::new(err),
                },
            })
    }

    fn match_or_insert(
        &self,
        query: &Name,
        allow_inserts: bool,
        verbose: bool,
    ) -> Result<MatchResult, NamesIndexError> {
        let mut result = self.match_stored(query, verbose)?;
        debug!(label = %query.label(), kind = ?result.kind, key = ?result.key(), "matched");

        if allow_inserts && needs_insert(&result, query) && query.is_eligible() {
            result = self.try_to_add(query, result, verbose)?;
        }
        Ok(result)
    }

    fn match_stored(&self, query: &Name, verbose: bool) -> Result<MatchResult, NamesIndexError> {
        let mut candidates = self.store.get_by_grouping_key(&grouping_key(query))?;
        let mut result = match_candidates(query, &candidates, &self.comparator);
        if verbose {
            if let Some(chosen) = result.key() {
                candidates.retain(|c| c.key != Some(chosen));
            }
            result.alternatives = Some(candidates);
        }
        Ok(result)
    }

    /// Inserts the query unless a concurrent writer already did.
    fn try_to_add(
        &self,
        query: &Name,
        mut result: MatchResult,
        verbose: bool,
    ) -> Result<MatchResult, NamesIndexError> {
        let _guard = self.write_lock.lock();
        trace!(kind = ?result.kind, label = %query.label(), "trying to add");

        let rematch = self.match_stored(query, verbose)?;
        if !needs_insert(&rematch, query) {
            return Ok(rematch);
        }

        debug!(kind = ?result.kind, label = %query.label(), "adding name");
        let mut name = IndexName::from(query);
        self.add_unsynchronized(&mut name)?;
        result.kind = if name.scientific_name.to_lowercase() == query.scientific_name.to_lowercase()
        {
            MatchType::Exact
        } else {
            MatchType::Variant
        };
        result.name = Some(name);
        Ok(result)
    }
}

/// Write operations.
impl NameIndex {
    /// Adds a record, creating its canonical record first when missing.
    ///
    /// Assigns fresh keys even if an equal record is already stored.
    pub fn add(&self, mut name: IndexName) -> Result<IndexName, NamesIndexError> {
        let _guard = self.write_lock.lock();
        self.add_unsynchronized(&mut name)?;
        Ok(name)
    }

    /// Writes the record, together with a new canonical record when the
    /// group has none, in a single store write.
    fn add_unsynchronized(&self, name: &mut IndexName) -> Result<(), NamesIndexError> {
        self.ensure_started()?;
        if name.scientific_name.trim().is_empty() {
            return Err(RecordError::MissingScientificName.into());
        }

        let key = grouping_key(name);
        name.stamp(SystemTime::now(), MATCHER_USER);

        if name.qualifies_as_canonical() {
            let id = self.next_key();
            name.key = Some(id);
            name.canonical_id = Some(id);
            self.store.add(&key, name)?;
            return Ok(());
        }

        let mut batch = Vec::with_capacity(2);
        match self.lowest_canonical(&key)? {
            Some(canonical) => name.canonical_id = canonical.key,
            None => {
                let mut canonical = IndexName::new_canonical(name);
                canonical.stamp(SystemTime::now(), MATCHER_USER);
                let id = self.next_key();
                canonical.key = Some(id);
                canonical.canonical_id = Some(id);
                name.canonical_id = Some(id);
                batch.push(canonical);
            }
        }
        name.key = Some(self.next_key());
        batch.push(name.clone());

        self.store.add_all(&key, &batch)?;
        if batch.len() > 1 {
            debug!(key = ?name.canonical_id, label = %name.label(), "created canonical name");
        }
        Ok(())
    }

    fn lowest_canonical(&self, grouping_key: &str) -> Result<Option<IndexName>, NamesIndexError> {
        Ok(self
            .store
            .get_by_grouping_key(grouping_key)?
            .into_iter()
            .filter(|n| n.is_canonical() && n.qualifies_as_canonical())
            .min_by_key(|n| n.key))
    }

    /// Deletes a record and, for canonical records, their qualified group.
    ///
    /// With `rematch` the removed records are handed to the registered
    /// [`RematchListener`].
    pub fn delete(&self, key: u32, rematch: bool) -> Result<Vec<IndexName>, NamesIndexError> {
        self.ensure_started()?;
        let removed = {
            let _guard = self.write_lock.lock();
            self.store.delete(key)?
        };
        info!(key, removed = removed.len(), "deleted names index entry");

        if rematch
            && !removed.is_empty()
            && let Some(listener) = &self.rematch
        {
            listener.rematch(&removed);
        }
        Ok(removed)
    }
}

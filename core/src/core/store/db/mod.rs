//! redb-backed store.
//!
//! Tables:
//! - `keys`: record key → versioned record bytes
//! - `names`: grouping key → record keys (multimap)
//! - `canonical`: canonical key → qualified record keys (multimap)
//! - `metadata`: JSON strings

use crate::core::normalizer::grouping_key;
use crate::core::store::error::StoreError;
use crate::core::store::{Store, check_insert};
use crate::types::{DB_FILE, IndexConfig, IndexName};
use codec::RecordCodec;
use parking_lot::RwLock;
use redb::backends::InMemoryBackend;
use redb::{
    MultimapTableDefinition, ReadableDatabase, ReadableMultimapTable, ReadableTable,
    ReadableTableMetadata, TableDefinition,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info, warn};

mod codec;

/// Main table: record key → versioned record bytes
const KEYS_TABLE: TableDefinition<u32, &[u8]> = TableDefinition::new("keys");

/// Names group: grouping key → record keys
const NAMES_TABLE: MultimapTableDefinition<&str, u32> = MultimapTableDefinition::new("names");

/// Canonical group: canonical key → qualified record keys
const CANONICAL_TABLE: MultimapTableDefinition<u32, u32> =
    MultimapTableDefinition::new("canonical");

/// Metadata table: &str → JSON string
const METADATA_TABLE: TableDefinition<&str, &str> = TableDefinition::new("metadata");

const METADATA_KEY_STORE: &str = "store";

/// Store metadata. Missing fields default to None.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoreMetadata {
    #[serde(default)]
    created: Option<SystemTime>,
    #[serde(default)]
    last_compacted_at: Option<SystemTime>,
    /// Highest key ever added since creation or the last clear.
    #[serde(default)]
    max_key: u32,
}

pub struct DbStore {
    dir: Option<PathBuf>,
    cache_size: Option<usize>,
    codec: RecordCodec,
    db: RwLock<Option<redb::Database>>,
}

impl DbStore {
    /// Store persisted under `dir`, or held in memory when `dir` is `None`.
    pub fn new(dir: Option<PathBuf>, pool_size: usize, cache_size: Option<usize>) -> Self {
        Self {
            dir,
            cache_size,
            codec: RecordCodec::new(pool_size),
            db: RwLock::new(None),
        }
    }

    pub fn from_config(config: &IndexConfig) -> Self {
        Self::new(
            config.file.clone(),
            config.pool_size,
            config.backend.cache_size(config.max_entries),
        )
    }

    pub fn path(&self) -> Option<PathBuf> {
        self.dir.as_ref().map(|dir| dir.join(DB_FILE))
    }

    /// Opens the database, wiping and recreating a corrupt file.
    fn open(&self) -> Result<redb::Database, StoreError> {
        let Some(dir) = &self.dir else {
            return self.create_database(None);
        };

        std::fs::create_dir_all(dir)?;
        let path = dir.join(DB_FILE);
        match self.create_database(Some(&path)) {
            Ok(db) => Ok(db),
            Err(err @ StoreError::Redb(redb::DatabaseError::DatabaseAlreadyOpen)) => Err(err),
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "names index store was corrupt, removing and rebuilding from scratch"
                );
                std::fs::remove_file(&path)?;
                self.create_database(Some(&path))
            }
        }
    }

    fn create_database(&self, path: Option<&Path>) -> Result<redb::Database, StoreError> {
        let mut builder = redb::Database::builder();
        if let Some(cache_size) = self.cache_size {
            builder.set_cache_size(cache_size);
        }
        let db = match path {
            Some(path) => builder.create(path)?,
            None => builder.create_with_backend(InMemoryBackend::new())?,
        };

        // Initialize tables
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(KEYS_TABLE)?;
            let _ = write_txn.open_multimap_table(NAMES_TABLE)?;
            let _ = write_txn.open_multimap_table(CANONICAL_TABLE)?;
            let mut meta_table = write_txn.open_table(METADATA_TABLE)?;
            let existing = meta_table
                .get(METADATA_KEY_STORE)?
                .map(|guard| guard.value().to_string());
            match existing {
                Some(json) => {
                    serde_json::from_str::<StoreMetadata>(&json)?;
                }
                None => {
                    let metadata = StoreMetadata {
                        created: Some(SystemTime::now()),
                        ..StoreMetadata::default()
                    };
                    let json = serde_json::to_string(&metadata)?;
                    meta_table.insert(METADATA_KEY_STORE, json.as_str())?;
                }
            }
        }
        write_txn.commit()?;

        // Newest record must decode, otherwise the file is not ours
        {
            let read_txn = db.begin_read()?;
            let table = read_txn.open_table(KEYS_TABLE)?;
            if let Some((_, bytes)) = table.last()? {
                RecordCodec::decode(bytes.value())?;
            }
        }

        Ok(db)
    }

    fn with_db<T>(
        &self,
        f: impl FnOnce(&redb::Database) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let guard = self.db.read();
        let db = guard.as_ref().ok_or(StoreError::Unavailable)?;
        f(db)
    }

    fn load(db: &redb::Database, keys: &[u32]) -> Result<Vec<IndexName>, StoreError> {
        let read_txn = db.begin_read()?;
        let table = read_txn.open_table(KEYS_TABLE)?;
        let mut names = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(guard) = table.get(key)? {
                names.push(RecordCodec::decode(guard.value())?);
            }
        }
        Ok(names)
    }
}

/// Metadata operations.
impl DbStore {
    fn metadata(db: &redb::Database) -> Result<StoreMetadata, StoreError> {
        let read_txn = db.begin_read()?;
        let table = read_txn.open_table(METADATA_TABLE)?;
        match table.get(METADATA_KEY_STORE)? {
            Some(guard) => Ok(serde_json::from_str(guard.value())?),
            None => Ok(StoreMetadata::default()),
        }
    }

    fn metadata_in(write_txn: &redb::WriteTransaction) -> Result<StoreMetadata, StoreError> {
        let table = write_txn.open_table(METADATA_TABLE)?;
        match table.get(METADATA_KEY_STORE)? {
            Some(guard) => Ok(serde_json::from_str(guard.value())?),
            None => Ok(StoreMetadata::default()),
        }
    }

    fn set_metadata(
        write_txn: &redb::WriteTransaction,
        metadata: &StoreMetadata,
    ) -> Result<(), StoreError> {
        let json = serde_json::to_string(metadata)?;
        let mut table = write_txn.open_table(METADATA_TABLE)?;
        table.insert(METADATA_KEY_STORE, json.as_str())?;
        Ok(())
    }
}

impl Store for DbStore {
    fn start(&self) -> Result<(), StoreError> {
        let mut guard = self.db.write();
        if guard.is_some() {
            return Ok(());
        }
        let db = self.open()?;
        let count = {
            let read_txn = db.begin_read()?;
            read_txn.open_table(KEYS_TABLE)?.len()?
        };
        match self.path() {
            Some(path) => info!(path = %path.display(), records = count, "names index store opened"),
            None => info!(records = count, "in-memory names index store opened"),
        }
        *guard = Some(db);
        Ok(())
    }

    fn stop(&self) -> Result<(), StoreError> {
        if let Some(db) = self.db.write().take() {
            drop(db);
            info!("names index store closed");
        }
        Ok(())
    }

    fn has_started(&self) -> bool {
        self.db.read().is_some()
    }

    fn created(&self) -> Result<Option<SystemTime>, StoreError> {
        self.with_db(|db| Ok(Self::metadata(db)?.created))
    }

    fn get(&self, key: u32) -> Result<Option<IndexName>, StoreError> {
        self.with_db(|db| {
            let read_txn = db.begin_read()?;
            let table = read_txn.open_table(KEYS_TABLE)?;
            match table.get(key)? {
                None => Ok(None),
                Some(guard) => Ok(Some(RecordCodec::decode(guard.value())?)),
            }
        })
    }

    fn get_by_grouping_key(&self, grouping_key: &str) -> Result<Vec<IndexName>, StoreError> {
        self.with_db(|db| {
            let keys = {
                let read_txn = db.begin_read()?;
                let table = read_txn.open_multimap_table(NAMES_TABLE)?;
                let mut keys = Vec::new();
                for key in table.get(grouping_key)? {
                    keys.push(key?.value());
                }
                keys
            };
            Self::load(db, &keys)
        })
    }

    fn get_canonical_group(&self, canonical_key: u32) -> Result<Vec<IndexName>, StoreError> {
        self.with_db(|db| {
            let keys = {
                let read_txn = db.begin_read()?;
                let table = read_txn.open_multimap_table(CANONICAL_TABLE)?;
                let mut keys = Vec::new();
                for key in table.get(canonical_key)? {
                    keys.push(key?.value());
                }
                keys
            };
            Self::load(db, &keys)
        })
    }

    fn add_all(&self, grouping_key: &str, names: &[IndexName]) -> Result<(), StoreError> {
        self.with_db(|db| {
            let mut max_key = 0;
            let mut encoded = Vec::with_capacity(names.len());
            for name in names {
                let (key, canonical_id) = check_insert(grouping_key, name)?;
                max_key = max_key.max(key);
                encoded.push((key, canonical_id, self.codec.encode(name)?));
            }

            let write_txn = db.begin_write()?;
            {
                let mut keys_table = write_txn.open_table(KEYS_TABLE)?;
                let mut names_table = write_txn.open_multimap_table(NAMES_TABLE)?;
                let mut canonical_table = write_txn.open_multimap_table(CANONICAL_TABLE)?;
                for (key, canonical_id, bytes) in &encoded {
                    debug!(key, canonical = key == canonical_id, grouping_key, "insert");
                    keys_table.insert(*key, &**bytes)?;
                    names_table.insert(grouping_key, *key)?;
                    if canonical_id != key {
                        canonical_table.insert(*canonical_id, *key)?;
                    }
                }
            }
            let mut metadata = Self::metadata_in(&write_txn)?;
            if max_key > metadata.max_key {
                metadata.max_key = max_key;
                Self::set_metadata(&write_txn, &metadata)?;
            }
            write_txn.commit()?;
            Ok(())
        })
    }

    fn delete(&self, key: u32) -> Result<Vec<IndexName>, StoreError> {
        self.with_db(|db| {
            let mut removed = Vec::new();
            let write_txn = db.begin_write()?;
            {
                let mut keys_table = write_txn.open_table(KEYS_TABLE)?;
                let mut names_table = write_txn.open_multimap_table(NAMES_TABLE)?;
                let mut canonical_table = write_txn.open_multimap_table(CANONICAL_TABLE)?;
                let mut pending = vec![key];

                while let Some(key) = pending.pop() {
                    let record = match keys_table.remove(key)? {
                        Some(guard) => RecordCodec::decode(guard.value())?,
                        None => continue,
                    };

                    if record.is_canonical() {
                        let mut qualified = Vec::new();
                        for k in canonical_table.remove_all(key)? {
                            qualified.push(k?.value());
                        }
                        pending.extend(qualified.into_iter().rev());
                    } else if let Some(canonical_id) = record.canonical_id {
                        canonical_table.remove(canonical_id, key)?;
                    }

                    names_table.remove(grouping_key(&record).as_str(), key)?;
                    removed.push(record);
                }
            }
            write_txn.commit()?;
            Ok(removed)
        })
    }

    fn compact(&self) -> Result<(), StoreError> {
        let mut guard = self.db.write();
        let db = guard.as_mut().ok_or(StoreError::Unavailable)?;

        let compacted = db.compact()?;
        let mut metadata = Self::metadata(db)?;
        metadata.last_compacted_at = Some(SystemTime::now());
        let write_txn = db.begin_write()?;
        Self::set_metadata(&write_txn, &metadata)?;
        write_txn.commit()?;

        info!(compacted, "names index store compacted");
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.with_db(|db| {
            let write_txn = db.begin_write()?;
            write_txn.delete_table(KEYS_TABLE)?;
            write_txn.delete_multimap_table(NAMES_TABLE)?;
            write_txn.delete_multimap_table(CANONICAL_TABLE)?;
            {
                let _ = write_txn.open_table(KEYS_TABLE)?;
                let _ = write_txn.open_multimap_table(NAMES_TABLE)?;
                let _ = write_txn.open_multimap_table(CANONICAL_TABLE)?;
            }
            let metadata = StoreMetadata {
                created: Some(SystemTime::now()),
                ..StoreMetadata::default()
            };
            Self::set_metadata(&write_txn, &metadata)?;
            write_txn.commit()?;
            info!("names index store cleared");
            Ok(())
        })
    }

    fn count(&self) -> Result<usize, StoreError> {
        self.with_db(|db| {
            let read_txn = db.begin_read()?;
            let table = read_txn.open_table(KEYS_TABLE)?;
            Ok(table.len()? as usize)
        })
    }

    fn all(&self) -> Result<Vec<IndexName>, StoreError> {
        self.with_db(|db| {
            let read_txn = db.begin_read()?;
            let table = read_txn.open_table(KEYS_TABLE)?;
            let mut names = Vec::new();
            for entry in table.iter()? {
                let (_, bytes) = entry?;
                names.push(RecordCodec::decode(bytes.value())?);
            }
            Ok(names)
        })
    }

    fn max_key(&self) -> Result<u32, StoreError> {
        self.with_db(|db| {
            let read_txn = db.begin_read()?;
            let table = read_txn.open_table(KEYS_TABLE)?;
            let stored = table.last()?.map(|(key, _)| key.value()).unwrap_or(0);
            Ok(stored.max(Self::metadata(db)?.max_key))
        })
    }
}

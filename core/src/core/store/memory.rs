//! Volatile store backed by concurrent hash maps.

use crate::core::normalizer::grouping_key;
use crate::core::store::error::StoreError;
use crate::core::store::{Store, check_insert};
use crate::types::IndexName;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::SystemTime;
use tracing::{debug, info};

#[derive(Default)]
pub struct MemoryStore {
    started: AtomicBool,
    created: Mutex<Option<SystemTime>>,
    max_key: AtomicU32,
    keys: DashMap<u32, IndexName>,
    names: DashMap<String, Vec<u32>>,
    canonical: DashMap<u32, Vec<u32>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_started(&self) -> Result<(), StoreError> {
        if self.started.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(StoreError::Unavailable)
        }
    }

    fn resolve(&self, mut keys: Vec<u32>) -> Vec<IndexName> {
        keys.sort_unstable();
        keys.iter()
            .filter_map(|k| self.keys.get(k).map(|n| n.value().clone()))
            .collect()
    }
}

impl Store for MemoryStore {
    fn start(&self) -> Result<(), StoreError> {
        let mut created = self.created.lock();
        if created.is_none() {
            *created = Some(SystemTime::now());
        }
        self.started.store(true, Ordering::Release);
        info!(records = self.keys.len(), "memory store started");
        Ok(())
    }

    fn stop(&self) -> Result<(), StoreError> {
        if self.started.swap(false, Ordering::AcqRel) {
            info!("memory store stopped");
        }
        Ok(())
    }

    fn has_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    fn created(&self) -> Result<Option<SystemTime>, StoreError> {
        self.ensure_started()?;
        Ok(*self.created.lock())
    }

    fn get(&self, key: u32) -> Result<Option<IndexName>, StoreError> {
        self.ensure_started()?;
        Ok(self.keys.get(&key).map(|n| n.value().clone()))
    }

    fn get_by_grouping_key(&self, grouping_key: &str) -> Result<Vec<IndexName>, StoreError> {
        self.ensure_started()?;
        let group = match self.names.get(grouping_key) {
            Some(group) => group.value().clone(),
            None => return Ok(vec![]),
        };
        Ok(self.resolve(group))
    }

    fn get_canonical_group(&self, canonical_key: u32) -> Result<Vec<IndexName>, StoreError> {
        self.ensure_started()?;
        let group = match self.canonical.get(&canonical_key) {
            Some(group) => group.value().clone(),
            None => return Ok(vec![]),
        };
        Ok(self.resolve(group))
    }

    fn add_all(&self, grouping_key: &str, names: &[IndexName]) -> Result<(), StoreError> {
        self.ensure_started()?;
        let checked = names
            .iter()
            .map(|name| check_insert(grouping_key, name))
            .collect::<Result<Vec<_>, _>>()?;

        for (name, (key, canonical_id)) in names.iter().zip(checked) {
            debug!(key, canonical = name.is_canonical(), grouping_key, "insert");
            self.keys.insert(key, name.clone());
            self.max_key.fetch_max(key, Ordering::AcqRel);

            let mut group = self.names.entry(grouping_key.to_string()).or_default();
            if !group.contains(&key) {
                group.push(key);
            }
            drop(group);

            if canonical_id != key {
                let mut group = self.canonical.entry(canonical_id).or_default();
                if !group.contains(&key) {
                    group.push(key);
                }
            }
        }
        Ok(())
    }

    fn delete(&self, key: u32) -> Result<Vec<IndexName>, StoreError> {
        self.ensure_started()?;
        let mut removed = Vec::new();
        let mut pending = vec![key];

        while let Some(key) = pending.pop() {
            let Some((_, record)) = self.keys.remove(&key) else {
                continue;
            };

            if record.is_canonical() {
                if let Some((_, qualified)) = self.canonical.remove(&key) {
                    pending.extend(qualified.into_iter().rev());
                }
            } else if let Some(canonical_id) = record.canonical_id
                && let Some(mut group) = self.canonical.get_mut(&canonical_id)
            {
                group.retain(|k| *k != key);
            }

            let group_key = grouping_key(&record);
            self.names.remove_if_mut(&group_key, |_, group| {
                group.retain(|k| *k != key);
                group.is_empty()
            });

            removed.push(record);
        }

        Ok(removed)
    }

    fn compact(&self) -> Result<(), StoreError> {
        self.ensure_started()?;
        self.canonical.retain(|_, group| {
            let mut seen = std::collections::HashSet::with_capacity(group.len());
            group.retain(|k| seen.insert(*k));
            !group.is_empty()
        });
        self.names.retain(|_, group| !group.is_empty());
        self.keys.shrink_to_fit();
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.ensure_started()?;
        self.keys.clear();
        self.names.clear();
        self.canonical.clear();
        self.max_key.store(0, Ordering::Release);
        *self.created.lock() = Some(SystemTime::now());
        Ok(())
    }

    fn count(&self) -> Result<usize, StoreError> {
        self.ensure_started()?;
        Ok(self.keys.len())
    }

    fn all(&self) -> Result<Vec<IndexName>, StoreError> {
        self.ensure_started()?;
        let mut all: Vec<IndexName> = self.keys.iter().map(|e| e.value().clone()).collect();
        all.sort_by_key(|n| n.key);
        Ok(all)
    }

    fn max_key(&self) -> Result<u32, StoreError> {
        self.ensure_started()?;
        Ok(self.max_key.load(Ordering::Acquire))
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;

/// Page cache budget per expected entry for the large backend.
const CACHE_BYTES_PER_ENTRY: u64 = 512;
const MIN_LARGE_CACHE: u64 = 64 * 1024 * 1024;
const MAX_LARGE_CACHE: u64 = 4 * 1024 * 1024 * 1024;

/// Storage backend behind the names index.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Concurrent in-process maps, nothing persisted.
    Memory,
    /// redb database with its default page cache.
    #[default]
    Embedded,
    /// redb database with a page cache sized for `max_entries`.
    Large,
}

impl BackendKind {
    /// redb cache size in bytes, `None` keeps redb's default.
    pub fn cache_size(self, max_entries: u64) -> Option<usize> {
        match self {
            BackendKind::Large => {
                let bytes = max_entries
                    .saturating_mul(CACHE_BYTES_PER_ENTRY)
                    .clamp(MIN_LARGE_CACHE, MAX_LARGE_CACHE);
                Some(usize::try_from(bytes).unwrap_or(usize::MAX))
            }
            BackendKind::Memory | BackendKind::Embedded => None,
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Memory => write!(f, "memory"),
            BackendKind::Embedded => write!(f, "embedded"),
            BackendKind::Large => write!(f, "large"),
        }
    }
}

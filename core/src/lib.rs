pub mod core;
pub mod types;

pub use crate::core::error::NamesIndexError;
pub use crate::core::source::{MemorySource, NameSource, error::SourceError};
pub use crate::core::store::{DbStore, MemoryStore, Store, SyncedStore, error::StoreError};
pub use crate::core::{NameIndex, RematchListener};

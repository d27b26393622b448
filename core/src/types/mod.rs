pub(crate) mod config;
pub use config::{BackendKind, DB_FILE, IndexConfig, IndexConfigError};

pub(crate) mod rank;
pub use rank::{CANONICAL_RANK, NameType, NomCode, ParseVocabularyError, Rank};

pub(crate) mod name;
pub use name::{Authorship, Name, NamePart, NameParts, ScientificName};

pub(crate) mod index_name;
pub use index_name::error::RecordError;
pub use index_name::versioned_record::error::CodecError;
pub use index_name::{IndexName, MATCHER_USER};

pub(crate) mod matching;
pub use matching::{MatchResult, MatchType};

//! Stored names index records.
//!
//! `IndexName` is the public record type; the on-disk form lives in
//! `versioned_record` and is converted with `IndexName::from_latest_record`.

use crate::types::name::{Authorship, Name, NameParts, ScientificName};
use crate::types::rank::{NameType, NomCode, Rank};
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

pub(crate) mod versioned_record;

use versioned_record::latest_record;

/// User id stamped on records created by the matcher.
pub const MATCHER_USER: u32 = 11;

/// A names index entry.
///
/// Canonical records have `canonical_id == key`; qualified records point at
/// the canonical record sharing their grouping key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexName {
    #[serde(rename = "id")]
    pub key: Option<u32>,
    pub canonical_id: Option<u32>,
    pub scientific_name: String,
    pub authorship: Option<String>,
    pub rank: Rank,
    pub code: Option<NomCode>,
    #[serde(rename = "type")]
    pub name_type: NameType,
    #[serde(flatten)]
    pub parts: NameParts,
    pub combination_authorship: Authorship,
    pub basionym_authorship: Authorship,
    pub sanctioning_author: Option<String>,
    pub created: Option<SystemTime>,
    pub created_by: Option<u32>,
    pub modified: Option<SystemTime>,
    pub modified_by: Option<u32>,
}

impl IndexName {
    pub fn is_canonical(&self) -> bool {
        self.key.is_some() && self.canonical_id == self.key
    }

    pub fn qualifies_as_canonical(&self) -> bool {
        !self.has_authorship() && self.rank == self.rank.canonical()
    }

    /// Canonical sibling of `name`: same parts, no authorship, collapsed rank.
    pub fn new_canonical(name: &IndexName) -> IndexName {
        IndexName {
            scientific_name: name.scientific_name.clone(),
            rank: name.rank.canonical(),
            code: name.code,
            name_type: name.name_type,
            parts: name.parts.clone(),
            ..IndexName::default()
        }
    }

    /// Validates the fields every stored record must carry.
    pub fn check(&self) -> Result<(), error::RecordError> {
        if self.key.is_none() {
            return Err(error::RecordError::MissingKey);
        }
        if self.canonical_id.is_none() {
            return Err(error::RecordError::MissingCanonicalId);
        }
        if self.scientific_name.trim().is_empty() {
            return Err(error::RecordError::MissingScientificName);
        }
        Ok(())
    }

    pub(crate) fn stamp(&mut self, now: SystemTime, user: u32) {
        self.created = Some(now);
        self.created_by = Some(user);
        self.modified = Some(now);
        self.modified_by = Some(user);
    }

    /// Converts the stored record into the public type.
    pub(crate) fn from_latest_record(record: latest_record::Record) -> Self {
        let authorship = |a: latest_record::Authorship| Authorship {
            authors: a.authors,
            ex_authors: a.ex_authors,
            year: a.year,
        };

        Self {
            key: Some(record.key),
            canonical_id: Some(record.canonical_id),
            scientific_name: record.scientific_name,
            authorship: record.authorship,
            rank: record.rank,
            code: record.code,
            name_type: record.name_type,
            parts: NameParts {
                uninomial: record.parts.uninomial,
                genus: record.parts.genus,
                infrageneric_epithet: record.parts.infrageneric_epithet,
                specific_epithet: record.parts.specific_epithet,
                infraspecific_epithet: record.parts.infraspecific_epithet,
                cultivar_epithet: record.parts.cultivar_epithet,
                candidatus: record.parts.candidatus,
                notho: record.parts.notho,
            },
            combination_authorship: authorship(record.combination_authorship),
            basionym_authorship: authorship(record.basionym_authorship),
            sanctioning_author: record.sanctioning_author,
            created: Some(record.provenance.created),
            created_by: Some(record.provenance.created_by),
            modified: Some(record.provenance.modified),
            modified_by: Some(record.provenance.modified_by),
        }
    }

    /// Converts a checked record into its stored form.
    pub(crate) fn to_latest_record(&self) -> Result<latest_record::Record, error::RecordError> {
        self.check()?;
        let (Some(key), Some(canonical_id)) = (self.key, self.canonical_id) else {
            return Err(error::RecordError::MissingKey);
        };
        let authorship = |a: &Authorship| latest_record::Authorship {
            authors: a.authors.clone(),
            ex_authors: a.ex_authors.clone(),
            year: a.year.clone(),
        };
        let now = SystemTime::now();

        Ok(latest_record::Record {
            key,
            canonical_id,
            scientific_name: self.scientific_name.clone(),
            authorship: self.authorship.clone(),
            rank: self.rank,
            code: self.code,
            name_type: self.name_type,
            parts: latest_record::Parts {
                uninomial: self.parts.uninomial.clone(),
                genus: self.parts.genus.clone(),
                infrageneric_epithet: self.parts.infrageneric_epithet.clone(),
                specific_epithet: self.parts.specific_epithet.clone(),
                infraspecific_epithet: self.parts.infraspecific_epithet.clone(),
                cultivar_epithet: self.parts.cultivar_epithet.clone(),
                candidatus: self.parts.candidatus,
                notho: self.parts.notho,
            },
            combination_authorship: authorship(&self.combination_authorship),
            basionym_authorship: authorship(&self.basionym_authorship),
            sanctioning_author: self.sanctioning_author.clone(),
            provenance: latest_record::Provenance {
                created: self.created.unwrap_or(now),
                created_by: self.created_by.unwrap_or(MATCHER_USER),
                modified: self.modified.unwrap_or(now),
                modified_by: self.modified_by.unwrap_or(MATCHER_USER),
            },
        })
    }
}

impl From<&Name> for IndexName {
    fn from(name: &Name) -> Self {
        IndexName {
            scientific_name: name.scientific_name.trim().to_string(),
            authorship: name.full_authorship(),
            rank: name.rank(),
            code: name.code,
            name_type: name.name_type,
            parts: name.parts.clone(),
            combination_authorship: name.combination_authorship.clone(),
            basionym_authorship: name.basionym_authorship.clone(),
            sanctioning_author: name.sanctioning_author.clone(),
            ..IndexName::default()
        }
    }
}

impl ScientificName for IndexName {
    fn scientific_name(&self) -> &str {
        &self.scientific_name
    }

    fn authorship_string(&self) -> Option<&str> {
        self.authorship.as_deref()
    }

    fn combination_authorship(&self) -> &Authorship {
        &self.combination_authorship
    }

    fn basionym_authorship(&self) -> &Authorship {
        &self.basionym_authorship
    }

    fn parts(&self) -> &NameParts {
        &self.parts
    }

    fn rank(&self) -> Rank {
        self.rank
    }
}

pub mod error {
    use thiserror::Error;

    #[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
    pub enum RecordError {
        #[error("record has no key")]
        MissingKey,
        #[error("record has no canonical id")]
        MissingCanonicalId,
        #[error("record has no scientific name")]
        MissingScientificName,
    }
}

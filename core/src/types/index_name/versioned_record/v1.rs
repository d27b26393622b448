use crate::types::name::NamePart;
use crate::types::rank::{NameType, NomCode, Rank};
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

use super::RecordVariant;

#[cfg_attr(test, derive(Eq, PartialEq))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    pub key: u32,
    pub canonical_id: u32,
    pub scientific_name: String,
    pub authorship: Option<String>,
    pub rank: Rank,
    pub code: Option<NomCode>,
    pub name_type: NameType,
    pub parts: Parts,
    pub combination_authorship: Authorship,
    pub basionym_authorship: Authorship,
    pub sanctioning_author: Option<String>,
    pub provenance: Provenance,
}

impl RecordVariant for Record {
    const VERSION: u8 = 1;
}

#[cfg_attr(test, derive(Eq, PartialEq))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parts {
    pub uninomial: Option<String>,
    pub genus: Option<String>,
    pub infrageneric_epithet: Option<String>,
    pub specific_epithet: Option<String>,
    pub infraspecific_epithet: Option<String>,
    pub cultivar_epithet: Option<String>,
    pub candidatus: bool,
    pub notho: Option<NamePart>,
}

#[cfg_attr(test, derive(Eq, PartialEq))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Authorship {
    pub authors: Vec<String>,
    pub ex_authors: Vec<String>,
    pub year: Option<String>,
}

#[cfg_attr(test, derive(Eq, PartialEq))]
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Provenance {
    pub created: SystemTime,
    pub created_by: u32,
    pub modified: SystemTime,
    pub modified_by: u32,
}

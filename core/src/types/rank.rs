//! Rank, name type and nomenclatural code vocabularies.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Rank assigned to queries that do not state one.
pub const CANONICAL_RANK: Rank = Rank::Unranked;

/// Taxonomic ranks, ordered from highest to lowest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rank {
    Domain,
    Kingdom,
    Phylum,
    Class,
    Order,
    Superfamily,
    Family,
    Subfamily,
    Tribe,
    Subtribe,
    SupragenericName,
    Genus,
    Subgenus,
    Section,
    Series,
    InfragenericName,
    SpeciesAggregate,
    Species,
    InfraspecificName,
    Subspecies,
    InfrasubspecificName,
    Variety,
    Subvariety,
    Form,
    Cultivar,
    Other,
    Unranked,
}

impl Rank {
    const ALL: [Rank; 27] = [
        Rank::Domain,
        Rank::Kingdom,
        Rank::Phylum,
        Rank::Class,
        Rank::Order,
        Rank::Superfamily,
        Rank::Family,
        Rank::Subfamily,
        Rank::Tribe,
        Rank::Subtribe,
        Rank::SupragenericName,
        Rank::Genus,
        Rank::Subgenus,
        Rank::Section,
        Rank::Series,
        Rank::InfragenericName,
        Rank::SpeciesAggregate,
        Rank::Species,
        Rank::InfraspecificName,
        Rank::Subspecies,
        Rank::InfrasubspecificName,
        Rank::Variety,
        Rank::Subvariety,
        Rank::Form,
        Rank::Cultivar,
        Rank::Other,
        Rank::Unranked,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Rank::Domain => "domain",
            Rank::Kingdom => "kingdom",
            Rank::Phylum => "phylum",
            Rank::Class => "class",
            Rank::Order => "order",
            Rank::Superfamily => "superfamily",
            Rank::Family => "family",
            Rank::Subfamily => "subfamily",
            Rank::Tribe => "tribe",
            Rank::Subtribe => "subtribe",
            Rank::SupragenericName => "suprageneric_name",
            Rank::Genus => "genus",
            Rank::Subgenus => "subgenus",
            Rank::Section => "section",
            Rank::Series => "series",
            Rank::InfragenericName => "infrageneric_name",
            Rank::SpeciesAggregate => "species_aggregate",
            Rank::Species => "species",
            Rank::InfraspecificName => "infraspecific_name",
            Rank::Subspecies => "subspecies",
            Rank::InfrasubspecificName => "infrasubspecific_name",
            Rank::Variety => "variety",
            Rank::Subvariety => "subvariety",
            Rank::Form => "form",
            Rank::Cultivar => "cultivar",
            Rank::Other => "other",
            Rank::Unranked => "unranked",
        }
    }

    /// Ranks above genus, excluding the unranked placeholders.
    pub fn is_suprageneric(self) -> bool {
        self <= Rank::SupragenericName
    }

    /// Ranks between genus and species, genus itself excluded.
    pub fn is_infrageneric_strictly(self) -> bool {
        (Rank::Subgenus..=Rank::InfragenericName).contains(&self)
    }

    pub fn is_uncomparable(self) -> bool {
        matches!(self, Rank::Other | Rank::Unranked)
    }

    /// Collapses ranks that are treated as equivalent for canonical records.
    pub fn canonical(self) -> Rank {
        if self.is_uncomparable() {
            Rank::Unranked
        } else if self.is_suprageneric() {
            Rank::SupragenericName
        } else if self == Rank::Genus {
            Rank::Genus
        } else if self.is_infrageneric_strictly() {
            Rank::InfragenericName
        } else if self == Rank::SpeciesAggregate || self == Rank::Species {
            Rank::Species
        } else {
            Rank::InfraspecificName
        }
    }
}

impl Default for Rank {
    fn default() -> Self {
        CANONICAL_RANK
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown {kind}: {value}")]
pub struct ParseVocabularyError {
    kind: &'static str,
    value: String,
}

impl FromStr for Rank {
    type Err = ParseVocabularyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        Rank::ALL
            .into_iter()
            .find(|r| r.as_str() == wanted)
            .ok_or_else(|| ParseVocabularyError {
                kind: "rank",
                value: s.to_string(),
            })
    }
}

/// Kind of name, as reported by the upstream parser.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameType {
    #[default]
    Scientific,
    Virus,
    HybridFormula,
    Informal,
    Otu,
    Placeholder,
    NoName,
}

impl NameType {
    /// Types that may be stored in the names index.
    pub fn is_indexable(self) -> bool {
        matches!(
            self,
            NameType::Scientific
                | NameType::HybridFormula
                | NameType::Virus
                | NameType::Otu
                | NameType::Informal
        )
    }
}

impl FromStr for NameType {
    type Err = ParseVocabularyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace([' ', '-'], "_").as_str() {
            "scientific" => Ok(NameType::Scientific),
            "virus" => Ok(NameType::Virus),
            "hybrid_formula" => Ok(NameType::HybridFormula),
            "informal" => Ok(NameType::Informal),
            "otu" => Ok(NameType::Otu),
            "placeholder" => Ok(NameType::Placeholder),
            "no_name" => Ok(NameType::NoName),
            _ => Err(ParseVocabularyError {
                kind: "name type",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NomCode {
    Bacterial,
    Botanical,
    Cultivars,
    Phytosociological,
    Virus,
    Zoological,
}

impl FromStr for NomCode {
    type Err = ParseVocabularyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bacterial" => Ok(NomCode::Bacterial),
            "botanical" => Ok(NomCode::Botanical),
            "cultivars" => Ok(NomCode::Cultivars),
            "phytosociological" => Ok(NomCode::Phytosociological),
            "virus" => Ok(NomCode::Virus),
            "zoological" => Ok(NomCode::Zoological),
            _ => Err(ParseVocabularyError {
                kind: "nomenclatural code",
                value: s.to_string(),
            }),
        }
    }
}

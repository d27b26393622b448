use crate::types::index_name::IndexName;
use serde::{Deserialize, Serialize};

/// How a query relates to the record it matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    Exact,
    Variant,
    Canonical,
    Ambiguous,
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub name: Option<IndexName>,
    #[serde(rename = "type")]
    pub kind: MatchType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternatives: Option<Vec<IndexName>>,
}

impl MatchResult {
    pub fn no_match() -> Self {
        Self {
            name: None,
            kind: MatchType::None,
            alternatives: None,
        }
    }

    pub fn matched(name: IndexName, kind: MatchType) -> Self {
        Self {
            name: Some(name),
            kind,
            alternatives: None,
        }
    }

    pub fn has_match(&self) -> bool {
        self.name.is_some()
    }

    pub fn key(&self) -> Option<u32> {
        self.name.as_ref().and_then(|n| n.key)
    }
}

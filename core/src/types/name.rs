//! Query names and the parsed pieces shared with stored records.

use crate::types::rank::{CANONICAL_RANK, NameType, NomCode, Rank};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Name part carrying a hybrid (notho) marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamePart {
    Generic,
    Infrageneric,
    Specific,
    Infraspecific,
}

/// A single author team with optional ex authors and publication year.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Authorship {
    pub authors: Vec<String>,
    pub ex_authors: Vec<String>,
    pub year: Option<String>,
}

impl Authorship {
    pub fn year_authors(year: Option<&str>, authors: &[&str]) -> Self {
        Self {
            authors: authors.iter().map(|a| a.to_string()).collect(),
            ex_authors: vec![],
            year: year.map(str::to_string),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.authors.is_empty() && self.ex_authors.is_empty() && self.year.is_none()
    }

    /// Splits an unparsed authorship string into `(combination, basionym)`.
    ///
    /// `"(L.) Mill., 1768"` yields the combination `Mill., 1768` and the
    /// basionym `L.`. Nothing beyond brackets, years and author separators
    /// is interpreted.
    pub fn parse_full(authorship: &str) -> (Authorship, Authorship) {
        let trimmed = authorship.trim();
        if let Some(rest) = trimmed.strip_prefix('(')
            && let Some(close) = rest.find(')')
        {
            let basionym = Self::parse(&rest[..close]);
            let combination = Self::parse(&rest[close + 1..]);
            return (combination, basionym);
        }
        (Self::parse(trimmed), Authorship::default())
    }

    /// Parses a single author team such as `"DC. ex Pers., 1805"`.
    pub fn parse(team: &str) -> Authorship {
        let mut rest = team.trim().trim_end_matches([',', ';']).trim().to_string();

        let mut year = None;
        if let Some((pos, sep)) = rest
            .char_indices()
            .rev()
            .find(|&(_, c)| c.is_whitespace() || c == ',')
        {
            let candidate = rest[pos + sep.len_utf8()..].trim_matches(|c: char| !c.is_ascii_digit());
            if candidate.len() == 4 && candidate.chars().all(|c| c.is_ascii_digit()) {
                year = Some(candidate.to_string());
                rest.truncate(pos);
            }
        } else {
            let candidate = rest.trim_matches(|c: char| !c.is_ascii_digit());
            if candidate.len() == 4 && rest.chars().all(|c| c.is_ascii_digit() || c == '[' || c == ']') {
                year = Some(candidate.to_string());
                rest.clear();
            }
        }

        let rest = rest.trim().trim_end_matches(',').trim();
        let (ex_part, main_part) = match split_ex(rest) {
            Some((ex, main)) => (ex, main),
            None => ("", rest),
        };

        Authorship {
            authors: split_authors(main_part),
            ex_authors: split_authors(ex_part),
            year,
        }
    }
}

fn split_ex(team: &str) -> Option<(&str, &str)> {
    let lower = team.to_ascii_lowercase();
    let pos = lower.find(" ex ")?;
    Some((&team[..pos], &team[pos + 4..]))
}

fn split_authors(team: &str) -> Vec<String> {
    team.replace(" et ", ",")
        .replace(" & ", ",")
        .replace('&', ",")
        .split(',')
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string)
        .collect()
}

fn join_authors(authors: &[String]) -> String {
    match authors {
        [] => String::new(),
        [single] => single.clone(),
        [init @ .., last] => format!("{} & {}", init.join(", "), last),
    }
}

impl fmt::Display for Authorship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        if !self.ex_authors.is_empty() {
            out.push_str(&join_authors(&self.ex_authors));
            out.push_str(" ex ");
        }
        out.push_str(&join_authors(&self.authors));
        if let Some(year) = &self.year {
            if !out.is_empty() {
                out.push_str(", ");
            }
            out.push_str(year);
        }
        f.write_str(&out)
    }
}

/// Atomized parts of a parsed name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct NameParts {
    pub uninomial: Option<String>,
    pub genus: Option<String>,
    pub infrageneric_epithet: Option<String>,
    pub specific_epithet: Option<String>,
    pub infraspecific_epithet: Option<String>,
    pub cultivar_epithet: Option<String>,
    pub candidatus: bool,
    pub notho: Option<NamePart>,
}

impl NameParts {
    pub fn is_parsed(&self) -> bool {
        self.uninomial.is_some()
            || self.genus.is_some()
            || self.infrageneric_epithet.is_some()
            || self.specific_epithet.is_some()
            || self.infraspecific_epithet.is_some()
            || self.cultivar_epithet.is_some()
    }

    /// Name without authorship, rank markers or hybrid signs.
    ///
    /// Returns `None` when nothing was parsed.
    pub fn canonical_name(&self) -> Option<String> {
        if !self.is_parsed() {
            return None;
        }

        let mut words: Vec<String> = Vec::new();
        if let Some(uninomial) = &self.uninomial {
            words.push(uninomial.clone());
        } else if let Some(genus) = &self.genus {
            words.push(genus.clone());
            if self.specific_epithet.is_none()
                && let Some(infrageneric) = &self.infrageneric_epithet
            {
                words.push(infrageneric.clone());
            }
        } else if let Some(infrageneric) = &self.infrageneric_epithet {
            words.push(infrageneric.clone());
        }
        words.extend(self.specific_epithet.iter().cloned());
        words.extend(self.infraspecific_epithet.iter().cloned());
        if let Some(cultivar) = &self.cultivar_epithet {
            words.push(format!("'{cultivar}'"));
        }

        let name = words.join(" ");
        Some(name.trim().to_string())
    }
}

/// Read access shared by query names and stored index names.
pub trait ScientificName {
    fn scientific_name(&self) -> &str;
    /// Authorship string as supplied, without formatting from parsed parts.
    fn authorship_string(&self) -> Option<&str>;
    fn combination_authorship(&self) -> &Authorship;
    fn basionym_authorship(&self) -> &Authorship;
    fn parts(&self) -> &NameParts;
    fn rank(&self) -> Rank;

    fn has_parsed_authorship(&self) -> bool {
        !self.combination_authorship().is_empty() || !self.basionym_authorship().is_empty()
    }

    fn has_authorship(&self) -> bool {
        self.has_parsed_authorship()
            || self.authorship_string().is_some_and(|a| !a.trim().is_empty())
    }

    /// Authorship string, formatted from the parsed authorship if none was given.
    fn full_authorship(&self) -> Option<String> {
        if let Some(authorship) = self.authorship_string()
            && !authorship.trim().is_empty()
        {
            return Some(authorship.trim().to_string());
        }
        if !self.has_parsed_authorship() {
            return None;
        }

        let mut out = String::new();
        if !self.basionym_authorship().is_empty() {
            out.push('(');
            out.push_str(&self.basionym_authorship().to_string());
            out.push(')');
        }
        if !self.combination_authorship().is_empty() {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(&self.combination_authorship().to_string());
        }
        Some(out)
    }

    /// Scientific name followed by its authorship, if any.
    fn label(&self) -> String {
        match self.full_authorship() {
            Some(authorship) => format!("{} {}", self.scientific_name().trim(), authorship),
            None => self.scientific_name().trim().to_string(),
        }
    }

    fn canonical_name(&self) -> String {
        self.parts()
            .canonical_name()
            .unwrap_or_else(|| self.scientific_name().trim().to_string())
    }
}

/// A name submitted for matching.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Name {
    pub scientific_name: String,
    pub authorship: Option<String>,
    pub rank: Option<Rank>,
    pub code: Option<NomCode>,
    #[serde(rename = "type")]
    pub name_type: NameType,
    #[serde(flatten)]
    pub parts: NameParts,
    pub combination_authorship: Authorship,
    pub basionym_authorship: Authorship,
    pub sanctioning_author: Option<String>,
}

impl Name {
    pub fn new(scientific_name: impl Into<String>) -> Self {
        Self {
            scientific_name: scientific_name.into(),
            ..Self::default()
        }
    }

    /// Binomial with parsed genus and specific epithet.
    pub fn binomial(genus: &str, specific_epithet: &str) -> Self {
        Self {
            scientific_name: format!("{genus} {specific_epithet}"),
            rank: Some(Rank::Species),
            parts: NameParts {
                genus: Some(genus.to_string()),
                specific_epithet: Some(specific_epithet.to_string()),
                ..NameParts::default()
            },
            ..Self::default()
        }
    }

    /// Sets the authorship string and its parsed form.
    pub fn with_authorship(mut self, authorship: &str) -> Self {
        let (combination, basionym) = Authorship::parse_full(authorship);
        self.authorship = Some(authorship.trim().to_string()).filter(|a| !a.is_empty());
        self.combination_authorship = combination;
        self.basionym_authorship = basionym;
        self
    }

    pub fn with_rank(mut self, rank: Rank) -> Self {
        self.rank = Some(rank);
        self
    }

    pub fn with_type(mut self, name_type: NameType) -> Self {
        self.name_type = name_type;
        self
    }

    pub fn with_code(mut self, code: NomCode) -> Self {
        self.code = Some(code);
        self
    }

    /// True for names without authorship at an already collapsed rank.
    pub fn qualifies_as_canonical(&self) -> bool {
        !self.has_authorship() && self.rank() == self.rank().canonical()
    }

    /// Indexable type and at least one letter or digit in the label.
    pub fn is_eligible(&self) -> bool {
        self.name_type.is_indexable() && self.label().chars().any(char::is_alphanumeric)
    }
}

impl ScientificName for Name {
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
        self.rank.unwrap_or(CANONICAL_RANK)
    }
}

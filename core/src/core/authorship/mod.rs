//! Fuzzy comparison of author teams and publication years.
//!
//! Authors are abbreviated in many ways, so two teams are considered equal as
//! soon as any single pair of authors matches. Empty teams never decide
//! anything and yield `Equality::Unknown`.

use crate::core::normalizer::fold_to_ascii;
use crate::types::{Authorship, ScientificName};
use tracing::trace;

/// Minimal shared surname prefix accepted as the same author.
const MIN_COMMON_PREFIX: usize = 4;
/// Accepted distance between two publication years.
const YEAR_TOLERANCE: i32 = 1;
/// Jaro-Winkler similarity (0..100) above which surnames are equal.
const JARO_THRESHOLD: f64 = 90.0;

/// Suffixes that mark a different person with the same surname.
const SUFFIXES: [&str; 6] = ["filius", "fil", "fl", "f", "bis", "ter"];

/// Three-valued comparison outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Equality {
    Equal,
    Different,
    Unknown,
}

impl Equality {
    /// Combines two outcomes; `Unknown` defers to the other side.
    pub fn and(self, other: Equality) -> Equality {
        match self {
            Equality::Unknown => other,
            Equality::Different => Equality::Different,
            Equality::Equal => {
                if other == Equality::Different {
                    Equality::Different
                } else {
                    Equality::Equal
                }
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuthorComparator {
    min_common_prefix: usize,
}

impl Default for AuthorComparator {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthorComparator {
    pub fn new() -> Self {
        Self {
            min_common_prefix: MIN_COMMON_PREFIX,
        }
    }

    /// Compares year first, then the author teams.
    pub fn compare(&self, a1: &Authorship, a2: &Authorship) -> Equality {
        let year = compare_years(a1.year.as_deref(), a2.year.as_deref());
        if year == Equality::Different {
            return year;
        }
        year.and(self.compare_team(a1, a2))
    }

    /// Compares combination authorship, then basionym authorship.
    ///
    /// When neither decides, authors are also compared across brackets and
    /// only a positive outcome is kept.
    pub fn compare_names<A, B>(&self, n1: &A, n2: &B) -> Equality
    where
        A: ScientificName + ?Sized,
        B: ScientificName + ?Sized,
    {
        let (comb1, bas1) = parsed_authorship(n1);
        let (comb2, bas2) = parsed_authorship(n2);

        let recomb = self.compare(&comb1, &comb2);
        if recomb != Equality::Unknown {
            return recomb;
        }

        let original = self.compare(&bas1, &bas2);
        if original == Equality::Unknown {
            let across = if comb1.is_empty() {
                self.compare(&bas1, &comb2)
            } else if bas1.is_empty() {
                self.compare(&comb1, &bas2)
            } else {
                Equality::Unknown
            };
            trace!(?across, "authorship compared across brackets");
            return if across == Equality::Equal {
                Equality::Equal
            } else {
                Equality::Unknown
            };
        }
        recomb.and(original)
    }

    fn compare_team(&self, a1: &Authorship, a2: &Authorship) -> Equality {
        let team1 = normalize_team(&a1.authors);
        let team2 = normalize_team(&a2.authors);
        if team1.is_empty() || team2.is_empty() {
            return Equality::Unknown;
        }
        if team1 == team2 {
            return Equality::Equal;
        }

        let authors2: Vec<Author> = team2.iter().map(|a| Author::parse(a)).collect();
        for author1 in team1.iter().map(|a| Author::parse(a)) {
            for author2 in &authors2 {
                if self.compare_authors(&author1, author2) == Equality::Equal {
                    return Equality::Equal;
                }
            }
        }
        Equality::Different
    }

    /// Compares two normalized single authors.
    pub(crate) fn compare_authors(&self, a1: &Author, a2: &Author) -> Equality {
        if a1.fullname == a2.fullname {
            return Equality::Equal;
        }

        let common = common_prefix(&a1.surname, &a2.surname);
        if a1.surname == a2.surname
            || jaro(&a1.surname, &a2.surname) > JARO_THRESHOLD
            || common.len() >= self.min_common_prefix
        {
            return if a1.initials_or_suffix_differ(a2) {
                Equality::Different
            } else {
                Equality::Equal
            };
        }

        let abbreviates = |short: &str, long: &str| short == common && long.starts_with(common);
        if !a1.initials_or_suffix_differ(a2)
            && (abbreviates(&a1.surname, &a2.surname) || abbreviates(&a2.surname, &a1.surname))
        {
            return Equality::Equal;
        }
        if abbreviates(&a1.fullname, &a2.surname) || abbreviates(&a2.fullname, &a1.surname) {
            return Equality::Equal;
        }

        let shared = common_prefix(&a1.fullname, &a2.fullname);
        if shared.chars().filter(|c| !c.is_whitespace()).count() > self.min_common_prefix {
            return Equality::Equal;
        }
        Equality::Different
    }
}

/// Uses parsed authorship, parsing the plain string when nothing was parsed.
fn parsed_authorship<N: ScientificName + ?Sized>(name: &N) -> (Authorship, Authorship) {
    if name.has_parsed_authorship() {
        return (
            name.combination_authorship().clone(),
            name.basionym_authorship().clone(),
        );
    }
    match name.authorship_string() {
        Some(authorship) => Authorship::parse_full(authorship),
        None => (Authorship::default(), Authorship::default()),
    }
}

fn compare_years(y1: Option<&str>, y2: Option<&str>) -> Equality {
    match (y1.and_then(parse_year), y2.and_then(parse_year)) {
        (Some(y1), Some(y2)) if (y1 - y2).abs() <= YEAR_TOLERANCE => Equality::Equal,
        (Some(_), Some(_)) => Equality::Different,
        _ => Equality::Unknown,
    }
}

/// First run of four digits, e.g. `"[1768]"` or `"1768a"`.
fn parse_year(year: &str) -> Option<i32> {
    let bytes = year.as_bytes();
    bytes
        .windows(4)
        .position(|w| w.iter().all(u8::is_ascii_digit))
        .and_then(|start| year[start..start + 4].parse().ok())
}

fn common_prefix<'a>(a: &'a str, b: &str) -> &'a str {
    let len = a
        .char_indices()
        .zip(b.chars())
        .take_while(|((_, c1), c2)| c1 == c2)
        .last()
        .map(|((i, c), _)| i + c.len_utf8())
        .unwrap_or(0);
    &a[..len]
}

/// Jaro-Winkler similarity scaled to 0..100, penalised for very short names.
fn jaro(a: &str, b: &str) -> f64 {
    let mut sim = strsim::jaro_winkler(a, b) * 100.0;
    let total = a.len() + b.len();
    if total < 10 {
        sim -= (10 - total) as f64 * 5.0;
    }
    sim
}

/// Normalizes every author of a team, dropping blanks and "et al.".
pub(crate) fn normalize_team(authors: &[String]) -> Vec<String> {
    authors
        .iter()
        .filter_map(|a| normalize_author(a))
        .filter(|a| a != "al")
        .collect()
}

/// Lower case ASCII author string without punctuation other than commas.
pub fn normalize_author(author: &str) -> Option<String> {
    if author.trim().is_empty() {
        return None;
    }
    let unified = unify_filius(author);
    let folded = fold_to_ascii(&unified);

    let mut simplified = String::with_capacity(folded.len());
    let mut prev: Option<char> = None;
    for c in folded.chars() {
        if matches!(c, 'e' | 'E') && prev.is_some_and(|p| matches!(p.to_ascii_lowercase(), 'a' | 'u' | 'o')) {
            prev = None;
            continue;
        }
        let c = if c.is_ascii_punctuation() && c != ',' { ' ' } else { c };
        simplified.push(c);
        prev = Some(c);
    }

    let normalized = simplified.split_whitespace().collect::<Vec<_>>().join(" ");
    if normalized.is_empty() {
        None
    } else {
        Some(normalized.to_lowercase())
    }
}

/// Rewrites `"Hook. f."`, `"Hook.fil."` and similar to `"Hook filius"`.
fn unify_filius(author: &str) -> String {
    let chars: Vec<char> = author.chars().collect();
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    let mut out = String::with_capacity(author.len() + 8);
    let mut i = 0;

    while i < chars.len() {
        if matches!(chars[i], '.' | ' ') && follows_capitalised_word(&chars, i) {
            let mut f = i + 1;
            while f < chars.len() && chars[f].is_whitespace() {
                f += 1;
            }
            if chars.get(f) == Some(&'f') {
                let has_il = chars.get(f + 1) == Some(&'i') && chars.get(f + 2) == Some(&'l');
                let mut ends = Vec::with_capacity(4);
                for with_il in [true, false] {
                    if with_il && !has_il {
                        continue;
                    }
                    let end = if with_il { f + 3 } else { f + 1 };
                    if chars.get(end) == Some(&'.') {
                        ends.push(end + 1);
                    }
                    ends.push(end);
                }
                let boundary = ends.into_iter().find(|&end| {
                    let before = is_word(chars[end - 1]);
                    let after = chars.get(end).is_some_and(|c| is_word(*c));
                    before != after
                });
                if let Some(end) = boundary {
                    out.push_str(" filius");
                    i = end;
                    continue;
                }
            }
        }
        out.push(chars[i]);
        i += 1;
    }
    out
}

fn follows_capitalised_word(chars: &[char], pos: usize) -> bool {
    let mut j = pos;
    while j > 0 && chars[j - 1].is_lowercase() {
        j -= 1;
    }
    j > 0 && chars[j - 1].is_uppercase()
}

/// A single normalized author split into initials, surname and suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Author {
    pub fullname: String,
    pub initials: Option<String>,
    pub surname: String,
    pub suffix: Option<String>,
}

impl Author {
    pub fn parse(normalized: &str) -> Author {
        let fullname = normalized.to_string();

        let mut rest = normalized;
        let mut initials = String::new();
        while let [first, b' ', ..] = rest.as_bytes()
            && first.is_ascii_lowercase()
        {
            initials.push(*first as char);
            initials.push(' ');
            rest = &rest[2..];
        }

        let (body, suffix) = split_suffix(rest);
        let surname_start = body
            .rfind(|c: char| !c.is_ascii_lowercase())
            .map(|p| p + 1)
            .unwrap_or(0);
        if surname_start == body.len() {
            return Author {
                surname: normalized.trim().to_string(),
                fullname,
                initials: None,
                suffix: None,
            };
        }

        let initials = initials.trim().to_string();
        Author {
            initials: Some(initials).filter(|i| !i.is_empty()),
            surname: body[surname_start..].to_string(),
            suffix: suffix.map(|s| {
                if s.starts_with('f') {
                    "filius".to_string()
                } else {
                    s.to_string()
                }
            }),
            fullname,
        }
    }

    pub fn initials_or_suffix_differ(&self, other: &Author) -> bool {
        self.initials_differ(other) || self.suffix != other.suffix
    }

    fn initials_differ(&self, other: &Author) -> bool {
        let (Some(mine), Some(theirs)) = (&self.initials, &other.initials) else {
            return false;
        };
        if mine == theirs {
            return false;
        }

        let mut smaller: Vec<char> = mine.chars().filter(|c| !c.is_whitespace()).collect();
        let mut larger: Vec<char> = theirs.chars().filter(|c| !c.is_whitespace()).collect();
        if smaller.len() > larger.len() {
            std::mem::swap(&mut smaller, &mut larger);
        }
        for c in smaller {
            match larger.iter().position(|l| *l == c) {
                Some(pos) => {
                    larger.swap_remove(pos);
                }
                None => return true,
            }
        }
        false
    }
}

/// Splits a trailing `" f"`, `" filius"`, `" bis"`... when a surname precedes it.
fn split_suffix(rest: &str) -> (&str, Option<&str>) {
    for suffix in SUFFIXES {
        for candidate in [format!(" {suffix}."), format!(" {suffix}")] {
            if let Some(body) = rest.strip_suffix(candidate.as_str())
                && body.ends_with(|c: char| c.is_ascii_lowercase())
            {
                return (body, Some(suffix));
            }
        }
    }
    (rest, None)
}

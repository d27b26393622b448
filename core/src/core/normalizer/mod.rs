//! Grouping keys and light-weight string normalization for names.
//!
//! The grouping key is a pure ASCII string derived from the canonical name.
//! It is the only lookup path into the index, so every transformation here
//! must be deterministic and total.

use crate::types::ScientificName;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Placeholder for characters with no ASCII form.
const NON_ASCII: char = '*';

/// Stemmed epithet endings, longest first. `trix` is handled separately.
const EPITHET_SUFFIXES: [&str; 11] = [
    "ae", "ei", "ii", "is", "on", "os", "um", "us", "a", "e", "i",
];

/// Pure ASCII grouping key for a name.
pub fn grouping_key<N: ScientificName + ?Sized>(name: &N) -> String {
    key_for(&name.canonical_name())
}

/// Grouping key for an already formatted canonical name.
pub fn key_for(canonical_name: &str) -> String {
    let folded = fold_to_ascii(canonical_name);
    let normalized = normalize_scientific(&folded);
    normalized
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii() { c } else { NON_ASCII })
        .collect()
}

/// Folds to ASCII where possible and collapses whitespace.
///
/// Used for case-insensitive comparisons in the matcher.
pub fn normalized_ascii(s: &str) -> String {
    collapse_whitespace(&fold_to_ascii(s))
}

/// Replaces runs of dots, spaces and hyphens by one space.
pub fn norm_exact(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_run = false;
    for c in s.chars() {
        if matches!(c, '.' | ' ' | '-') {
            if !in_run {
                out.push(' ');
                in_run = true;
            }
        } else {
            out.push(c);
            in_run = false;
        }
    }
    out.trim().to_string()
}

/// Strips diacritics and replaces letters that do not decompose.
pub fn fold_to_ascii(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.nfd().filter(|c| !is_combining_mark(*c)) {
        match c {
            'ß' => out.push_str("ss"),
            'æ' => out.push_str("ae"),
            'Æ' => out.push_str("AE"),
            'œ' => out.push_str("oe"),
            'Œ' => out.push_str("OE"),
            'ø' => out.push('o'),
            'Ø' => out.push('O'),
            'ł' => out.push('l'),
            'Ł' => out.push('L'),
            'đ' | 'ð' => out.push('d'),
            'Đ' | 'Ð' => out.push('D'),
            'þ' => out.push_str("th"),
            'Þ' => out.push_str("TH"),
            'ı' => out.push('i'),
            c => out.push(c),
        }
    }
    out
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Hybrid markers, punctuation and epithet spelling variants.
fn normalize_scientific(s: &str) -> String {
    let without_hybrids = remove_hybrid_markers(s);
    let cleaned: String = without_hybrids
        .chars()
        .map(|c| {
            if c.is_ascii_punctuation() && c != '-' {
                ' '
            } else {
                c
            }
        })
        .collect();

    let mut words = cleaned.split_whitespace();
    let Some(first) = words.next() else {
        return String::new();
    };

    let mut out = first.to_string();
    for word in words {
        out.push(' ');
        out.push_str(&normalize_epithet(&word.to_lowercase()));
    }
    out
}

fn remove_hybrid_markers(s: &str) -> String {
    let trimmed = s.trim();

    // ×Abies, xAbies, X Abies
    let mut rest = trimmed;
    if let Some(stripped) = rest
        .strip_prefix('×')
        .or_else(|| rest.strip_prefix('x'))
        .or_else(|| rest.strip_prefix('X'))
        && stripped.trim_start().starts_with(|c: char| c.is_ascii_uppercase())
    {
        rest = stripped.trim_start();
    }

    let tokens: Vec<&str> = rest.split_whitespace().collect();
    let mut out: Vec<&str> = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i];
        let next_is_epithet = tokens
            .get(i + 1)
            .is_some_and(|n| !n.starts_with(|c: char| c.is_ascii_uppercase()));

        if matches!(token, "×" | "x" | "X") && next_is_epithet {
            i += 1;
            continue;
        }
        match token.strip_prefix('×') {
            Some(epithet) if !epithet.is_empty() && !epithet.starts_with(|c: char| c.is_ascii_uppercase()) => {
                out.push(epithet)
            }
            _ => out.push(token),
        }
        i += 1;
    }
    out.join(" ")
}

fn normalize_epithet(word: &str) -> String {
    let collapsed = collapse_repeated_letters(word);
    let stemmed = stem_epithet(&collapsed);
    let unified = unify_i(&stemmed);
    unified.replace("th", "t").replace("rh", "r")
}

fn collapse_repeated_letters(word: &str) -> String {
    let mut out = String::with_capacity(word.len());
    let mut last = None;
    for c in word.chars() {
        if c.is_alphabetic() && last == Some(c) {
            continue;
        }
        out.push(c);
        last = Some(c);
    }
    out
}

/// Reduces Latin gender and case endings to a common `-a`.
pub fn stem_epithet(epithet: &str) -> String {
    if epithet.is_empty() {
        return String::new();
    }
    if let Some(stem) = epithet.strip_suffix("trix") {
        return format!("{stem}tor");
    }
    for suffix in EPITHET_SUFFIXES {
        if let Some(stem) = epithet.strip_suffix(suffix) {
            return format!("{stem}a");
        }
    }
    epithet.to_string()
}

/// Non-initial runs of `i`, `j` and `y` become a single `i`.
fn unify_i(word: &str) -> String {
    let mut out = String::with_capacity(word.len());
    let mut in_run = false;
    for (pos, c) in word.chars().enumerate() {
        if pos > 0 && matches!(c, 'i' | 'j' | 'y') {
            if !in_run {
                out.push('i');
                in_run = true;
            }
            continue;
        }
        out.push(c);
        in_run = false;
    }
    out
}

#[cfg(test)]
mod tests;

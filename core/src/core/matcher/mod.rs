//! Picks the best stored variant for a query among its grouping-key candidates.

use crate::core::authorship::{AuthorComparator, Equality};
use crate::core::normalizer::{norm_exact, normalized_ascii};
use crate::types::{CANONICAL_RANK, IndexName, MatchResult, MatchType, Name, ScientificName};
use tracing::{debug, trace};

/// Scores every candidate by rank, authorship and canonical name and returns
/// the best one.
///
/// Candidates are excluded rather than scored negatively where a match would
/// be wrong. Ties are broken towards canonical records and then towards the
/// lowest key, so the outcome does not depend on candidate order.
pub fn match_candidates(
    query: &Name,
    candidates: &[IndexName],
    comparator: &AuthorComparator,
) -> MatchResult {
    let rank = query.rank();
    let has_rank = rank != CANONICAL_RANK;
    let has_authorship = query.has_authorship();
    let query_canonical = normalized_ascii(&query.canonical_name());
    let query_label = query.label();
    let query_fullname = normalized_ascii(&query_label);
    let query_authorship = query
        .full_authorship()
        .map(|a| normalized_ascii(&a))
        .unwrap_or_default();

    let mut best_score = 0;
    let mut matches: Vec<&IndexName> = Vec::new();

    for candidate in candidates {
        let is_canonical = candidate.is_canonical();
        let mut score = 0;

        if !is_canonical && has_rank && rank != candidate.rank {
            continue;
        }
        if rank == candidate.rank {
            score += 2;
        }

        if !has_authorship && candidate.has_authorship() {
            continue;
        }
        if has_authorship && !is_canonical && !candidate.has_authorship() {
            continue;
        }

        if candidate.has_authorship()
            && query_fullname.eq_ignore_ascii_case(&normalized_ascii(&candidate.label()))
        {
            score += 4;
        } else {
            if has_authorship {
                let equality = comparator.compare_names(query, candidate);
                if equality == Equality::Different {
                    trace!(label = %candidate.label(), "authorship differs");
                    continue;
                }

                let candidate_authorship = candidate
                    .full_authorship()
                    .map(|a| normalized_ascii(&a))
                    .unwrap_or_default();
                if query_authorship.eq_ignore_ascii_case(&candidate_authorship) {
                    score += 3;
                } else if equality == Equality::Equal {
                    score += 2;
                } else if candidate.has_authorship() {
                    score -= 2;
                }
            }

            if !is_canonical
                && candidate.rank.is_infrageneric_strictly()
                && candidate.parts.infrageneric_epithet != query.parts.infrageneric_epithet
            {
                continue;
            }

            if query_canonical.eq_ignore_ascii_case(&normalized_ascii(&candidate.canonical_name()))
            {
                score += 1;
            }
        }

        best_score = add_or_remove(score, candidate, best_score, &mut matches);
    }

    match matches.as_slice() {
        [] => MatchResult::no_match(),
        [only] => {
            let kind = if norm_exact(&query_label).eq_ignore_ascii_case(&norm_exact(&only.label()))
                && rank == only.rank
            {
                MatchType::Exact
            } else if only.is_canonical()
                && (has_authorship || query_canonical != query_fullname || rank != only.rank)
            {
                MatchType::Canonical
            } else {
                MatchType::Variant
            };
            MatchResult::matched((*only).clone(), kind)
        }
        _ => {
            let mut kind = MatchType::Ambiguous;
            if matches.iter().any(|m| m.is_canonical()) {
                matches.retain(|m| m.is_canonical());
                if matches.len() == 1 {
                    kind = MatchType::Canonical;
                }
            }
            if matches.len() > 1 {
                debug!(
                    hits = matches.len(),
                    rank = %rank,
                    label = %query_label,
                    "ambiguous match"
                );
            }

            let lowest = matches
                .iter()
                .min_by_key(|m| m.key.unwrap_or(u32::MAX))
                .map(|m| (*m).clone());
            MatchResult {
                name: lowest,
                kind,
                alternatives: None,
            }
        }
    }
}

/// Keeps the running set of best scoring candidates; returns the new best score.
fn add_or_remove<'a>(
    score: i32,
    candidate: &'a IndexName,
    best_score: i32,
    matches: &mut Vec<&'a IndexName>,
) -> i32 {
    if score < best_score {
        trace!(score, best_score, label = %candidate.label(), "worse match");
        return best_score;
    }
    if score > best_score {
        trace!(score, best_score, label = %candidate.label(), "better match");
        matches.clear();
    } else {
        trace!(score, label = %candidate.label(), "same match");
    }
    matches.push(candidate);
    score
}

#[cfg(test)]
mod tests;

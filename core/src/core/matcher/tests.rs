use super::*;
use crate::types::{NameParts, Rank};

mod common {
    use super::*;

    pub(super) fn record(
        key: u32,
        canonical_id: u32,
        scientific_name: &str,
        authorship: Option<&str>,
        rank: Rank,
    ) -> IndexName {
        let mut query = Name::new(scientific_name).with_rank(rank);
        if let Some(authorship) = authorship {
            query = query.with_authorship(authorship);
        }
        let mut name = IndexName::from(&query);
        name.key = Some(key);
        name.canonical_id = Some(canonical_id);
        name
    }

    pub(super) fn canonical(key: u32, scientific_name: &str, rank: Rank) -> IndexName {
        record(key, key, scientific_name, None, rank.canonical())
    }

    pub(super) fn query(scientific_name: &str, authorship: Option<&str>, rank: Rank) -> Name {
        let query = Name::new(scientific_name).with_rank(rank);
        match authorship {
            Some(authorship) => query.with_authorship(authorship),
            None => query,
        }
    }
}

mod outcome {
    use super::common::*;
    use super::*;

    #[test]
    fn no_candidates_is_none() {
        let result = match_candidates(
            &query("Abies alba", None, Rank::Species),
            &[],
            &AuthorComparator::new(),
        );
        assert_eq!(result.kind, MatchType::None);
        assert!(!result.has_match());
    }

    #[test]
    fn bare_name_matches_canonical_exactly() {
        let candidates = vec![
            canonical(1, "Abies alba", Rank::Species),
            record(2, 1, "Abies alba", Some("Mill."), Rank::Species),
        ];
        let result = match_candidates(
            &query("Abies alba", None, Rank::Species),
            &candidates,
            &AuthorComparator::new(),
        );
        assert_eq!(result.kind, MatchType::Exact);
        assert_eq!(result.key(), Some(1));
    }

    #[test]
    fn full_label_match_wins() {
        let candidates = vec![
            canonical(1, "Abies alba", Rank::Species),
            record(2, 1, "Abies alba", Some("Mill."), Rank::Species),
        ];
        let result = match_candidates(
            &query("Abies alba", Some("Mill."), Rank::Species),
            &candidates,
            &AuthorComparator::new(),
        );
        assert_eq!(result.kind, MatchType::Exact);
        assert_eq!(result.key(), Some(2));
    }

    #[test]
    fn abbreviated_authorship_is_a_variant() {
        let candidates = vec![
            canonical(1, "Abies alba", Rank::Species),
            record(2, 1, "Abies alba", Some("Miller"), Rank::Species),
        ];
        let result = match_candidates(
            &query("Abies alba", Some("Mill."), Rank::Species),
            &candidates,
            &AuthorComparator::new(),
        );
        assert_eq!(result.kind, MatchType::Variant);
        assert_eq!(result.key(), Some(2));
    }

    #[test]
    fn different_authorship_falls_back_to_canonical() {
        let candidates = vec![
            canonical(1, "Abies alba", Rank::Species),
            record(2, 1, "Abies alba", Some("Mill."), Rank::Species),
        ];
        let result = match_candidates(
            &query("Abies alba", Some("L."), Rank::Species),
            &candidates,
            &AuthorComparator::new(),
        );
        assert_eq!(result.kind, MatchType::Canonical);
        assert_eq!(result.key(), Some(1));
    }

    #[test]
    fn unclear_authorship_prefers_canonical() {
        let candidates = vec![
            canonical(1, "Abies alba", Rank::Species),
            record(2, 1, "Abies alba", Some("1768"), Rank::Species),
        ];
        let result = match_candidates(
            &query("Abies alba", Some("Mill."), Rank::Species),
            &candidates,
            &AuthorComparator::new(),
        );
        assert_eq!(result.kind, MatchType::Canonical);
        assert_eq!(result.key(), Some(1));
    }
}

mod exclusion {
    use super::common::*;
    use super::*;

    #[test]
    fn query_without_authorship_never_matches_authored_record() {
        let candidates = vec![record(2, 1, "Abies alba", Some("Mill."), Rank::Species)];
        let result = match_candidates(
            &query("Abies alba", None, Rank::Species),
            &candidates,
            &AuthorComparator::new(),
        );
        assert_eq!(result.kind, MatchType::None);
    }

    #[test]
    fn qualified_record_with_other_rank_is_excluded() {
        let candidates = vec![
            canonical(1, "Abies alba alba", Rank::Variety),
            record(2, 1, "Abies alba alba", None, Rank::Subspecies),
        ];
        let result = match_candidates(
            &query("Abies alba alba", None, Rank::Variety),
            &candidates,
            &AuthorComparator::new(),
        );
        assert_eq!(result.kind, MatchType::Canonical);
        assert_eq!(result.key(), Some(1));
    }

    #[test]
    fn infrageneric_epithet_must_agree() {
        let parts = |epithet: &str| NameParts {
            genus: Some("Carex".into()),
            infrageneric_epithet: Some(epithet.into()),
            ..NameParts::default()
        };
        let mut stored = record(2, 1, "Carex sect. Vignea", None, Rank::Section);
        stored.parts = parts("Vignea");

        let mut wanted = query("Carex sect. Vignea", None, Rank::Section);
        wanted.parts = parts("Vignea");
        let result = match_candidates(&wanted, &[stored.clone()], &AuthorComparator::new());
        assert_eq!(result.kind, MatchType::Exact);

        wanted.parts = parts("Carex");
        let result = match_candidates(&wanted, &[stored], &AuthorComparator::new());
        assert_eq!(result.kind, MatchType::None);
    }
}

mod ambiguity {
    use super::common::*;
    use super::*;

    #[test]
    fn ties_pick_lowest_key() {
        let candidates = vec![
            record(5, 1, "Abies alba", Some("Mill., 1768"), Rank::Species),
            record(3, 1, "Abies alba", Some("Miller"), Rank::Species),
        ];
        let result = match_candidates(
            &query("Abies alba", Some("Mill."), Rank::Species),
            &candidates,
            &AuthorComparator::new(),
        );
        assert_eq!(result.kind, MatchType::Ambiguous);
        assert_eq!(result.key(), Some(3));

        let reversed: Vec<_> = candidates.into_iter().rev().collect();
        let again = match_candidates(
            &query("Abies alba", Some("Mill."), Rank::Species),
            &reversed,
            &AuthorComparator::new(),
        );
        assert_eq!(again.key(), Some(3));
    }

    #[test]
    fn canonical_breaks_ties() {
        let candidates = vec![
            record(2, 1, "Abies alba", None, Rank::Subspecies),
            canonical(1, "Abies alba", Rank::Species),
            record(3, 1, "Abies alba", None, Rank::Variety),
        ];
        let result = match_candidates(
            &Name::new("Abies alba"),
            &candidates,
            &AuthorComparator::new(),
        );
        assert_eq!(result.kind, MatchType::Canonical);
        assert_eq!(result.key(), Some(1));
    }

    #[test]
    fn qualified_ties_without_canonical_stay_ambiguous() {
        let candidates = vec![
            record(7, 1, "Abies alba", None, Rank::Subspecies),
            record(4, 1, "Abies alba", None, Rank::Variety),
        ];
        let result = match_candidates(
            &Name::new("Abies alba"),
            &candidates,
            &AuthorComparator::new(),
        );
        assert_eq!(result.kind, MatchType::Ambiguous);
        assert_eq!(result.key(), Some(4));
    }
}

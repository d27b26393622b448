use super::*;
use crate::types::{Name, NameParts};

mod grouping_key {
    use super::*;

    #[test]
    fn empty_name_gives_empty_key() {
        assert_eq!(key_for(""), "");
        assert_eq!(key_for("   "), "");
    }

    #[test]
    fn genus_is_only_folded() {
        assert_eq!(key_for("Abies "), "abies");
        assert_eq!(key_for("Abiies"), "abiies");
        assert_eq!(key_for("Abyes"), "abyes");
    }

    #[test]
    fn epithet_spelling_variants_share_a_key() {
        assert_eq!(key_for("Abyes  albus"), "abyes alba");
        assert_eq!(key_for("Abies albijeta"), "abies albieta");
        assert_eq!(key_for("Abies albyeta"), "abies albieta");
        assert_eq!(key_for("Rhachis taktos"), "rhachis takta");
        assert_eq!(key_for("Hieracium sabaudum"), "hieracium sabauda");
        assert_eq!(
            key_for("Hieracium scorzoneræfolium"),
            "hieracium scorzoneraefolia"
        );
        assert_eq!(key_for("Macrozamia platyrachis"), "macrozamia platiracha");
        assert_eq!(key_for("Macrozamia platyrhachis"), "macrozamia platiracha");
        assert_eq!(key_for("Cycas circinalis"), "cycas circinala");
        assert_eq!(key_for("Cycas circinnalis"), "cycas circinala");
        assert_eq!(key_for("Isolona perrieri"), "isolona periera");
        assert_eq!(key_for("Isolona perrierii"), "isolona periera");
        assert_eq!(key_for("Eragrostis brownii"), "eragrostis browna");
        assert_eq!(key_for("Eragrostis brownei"), "eragrostis browna");
        assert_eq!(key_for("Larus fuscus"), key_for("Larus fusca"));
    }

    #[test]
    fn hybrid_markers_are_removed() {
        assert_eq!(key_for(" \txAbies × ållbbus\t"), "abies alba");
        assert_eq!(key_for("Carex ×cayouettei"), "carex caioueta");
        assert_eq!(key_for("×Carex cayouettei"), "carex caioueta");
        assert_eq!(key_for("XCarex cayouettei"), "carex caioueta");
        assert_eq!(key_for("Platanus x hispanica"), "platanus hispanica");
        assert_eq!(key_for("×cayouettei"), "cayouettei");
    }

    #[test]
    fn glued_lowercase_x_is_kept() {
        assert_eq!(key_for("xcayouettei"), "xcayouettei");
        assert_eq!(key_for("Carex xcayouettei"), "carex xcaioueta");
        assert_eq!(key_for("xCarex xcayouettei"), "carex xcaioueta");
    }

    #[test]
    fn diacritics_are_folded() {
        assert_eq!(key_for("Çem Ándrexï"), "cem andrexa");
        assert_eq!(key_for("Œnanthe"), "oenanthe");
        assert_eq!(key_for("Łomnickia"), "lomnickia");
    }

    #[test]
    fn unfoldable_characters_become_placeholders() {
        let key = key_for("Abies ¥µ");
        assert!(key.is_ascii());
        assert!(key.starts_with("abies "));
        assert!(key.contains('*'));
    }

    #[test]
    fn key_is_always_ascii() {
        for name in ["Ørsted", "Þórr", "Agave × Yucca", "名字", "Abies 'Nana'"] {
            assert!(key_for(name).is_ascii(), "{name}");
        }
    }

    #[test]
    fn key_uses_canonical_name_from_parts() {
        let mut name = Name::new("Abies alba subsp. alba");
        name.parts = NameParts {
            genus: Some("Abies".into()),
            specific_epithet: Some("alba".into()),
            infraspecific_epithet: Some("alba".into()),
            ..NameParts::default()
        };
        assert_eq!(grouping_key(&name), "abies alba alba");
    }

    #[test]
    fn key_ignores_authorship() {
        let plain = Name::binomial("Abies", "alba");
        let authored = Name::binomial("Abies", "alba").with_authorship("Mill.");
        assert_eq!(grouping_key(&plain), grouping_key(&authored));
    }
}

mod stemming {
    use super::*;

    #[test]
    fn endings_collapse_to_a() {
        assert_eq!(stem_epithet(""), "");
        assert_eq!(stem_epithet("alba"), "alba");
        assert_eq!(stem_epithet("albus"), "alba");
        assert_eq!(stem_epithet("albon"), "alba");
        assert_eq!(stem_epithet("album"), "alba");
        assert_eq!(stem_epithet("dentatus"), "dentata");
        assert_eq!(stem_epithet("muliebris"), "muliebra");
        assert_eq!(stem_epithet("muliebre"), "muliebra");
        assert_eq!(stem_epithet("alaus"), "alaa");
        assert_eq!(stem_epithet("periculi"), "pericula");
    }

    #[test]
    fn trix_becomes_tor() {
        assert_eq!(stem_epithet("viatrix"), "viator");
        assert_eq!(stem_epithet("viator"), "viator");
        assert_eq!(stem_epithet("viatoris"), "viatora");
    }
}

mod ascii {
    use super::*;

    #[test]
    fn normalized_ascii_folds_and_collapses() {
        assert_eq!(normalized_ascii("  Abies   alba  Mill. "), "Abies alba Mill.");
        assert_eq!(normalized_ascii("Müller"), "Muller");
        assert_eq!(normalized_ascii("Gærtn."), "Gaertn.");
    }

    #[test]
    fn norm_exact_merges_separators() {
        assert_eq!(norm_exact("Abies alba Mill."), "Abies alba Mill");
        assert_eq!(norm_exact("Abies  alba  Mill"), "Abies alba Mill");
        assert_eq!(norm_exact("Abies-alba"), "Abies alba");
        assert_eq!(norm_exact("Abies  .-  alba"), "Abies alba");
    }
}

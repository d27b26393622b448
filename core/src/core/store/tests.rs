//! Behaviour shared by every `Store` implementation.

use super::*;
use crate::core::normalizer::grouping_key;
use crate::types::{Name, Rank};

mod common {
    use super::*;
    use tempfile::TempDir;

    pub(super) fn record(key: u32, canonical_id: u32, scientific_name: &str) -> IndexName {
        let mut name = IndexName::from(&Name::new(scientific_name).with_rank(Rank::Species));
        name.key = Some(key);
        name.canonical_id = Some(canonical_id);
        name.stamp(SystemTime::UNIX_EPOCH, 1);
        name
    }

    pub(super) fn authored(
        key: u32,
        canonical_id: u32,
        scientific_name: &str,
        authorship: &str,
    ) -> IndexName {
        let query = Name::new(scientific_name)
            .with_rank(Rank::Species)
            .with_authorship(authorship);
        let mut name = IndexName::from(&query);
        name.key = Some(key);
        name.canonical_id = Some(canonical_id);
        name.stamp(SystemTime::UNIX_EPOCH, 1);
        name
    }

    pub(super) fn insert(store: &dyn Store, name: &IndexName) {
        store.add(&grouping_key(name), name).unwrap();
    }

    pub(super) fn keys(names: &[IndexName]) -> Vec<u32> {
        names.iter().filter_map(|n| n.key).collect()
    }

    /// Every store flavour, started. The TempDir must outlive the store.
    pub(super) fn stores() -> Vec<(&'static str, Box<dyn Store>, Option<TempDir>)> {
        let temp = TempDir::new().unwrap();
        let on_disk = DbStore::new(Some(temp.path().to_path_buf()), 2, None);
        let stores: Vec<(&'static str, Box<dyn Store>, Option<TempDir>)> = vec![
            ("memory", Box::new(MemoryStore::new()), None),
            ("db in memory", Box::new(DbStore::new(None, 2, None)), None),
            ("db on disk", Box::new(on_disk), Some(temp)),
        ];
        for (_, store, _) in &stores {
            store.start().unwrap();
        }
        stores
    }
}

mod lifecycle {
    use super::common::*;
    use super::*;

    #[test]
    fn operations_fail_before_start() {
        let stores: Vec<Box<dyn Store>> =
            vec![Box::new(MemoryStore::new()), Box::new(DbStore::new(None, 1, None))];
        for store in stores {
            assert!(!store.has_started());
            assert!(matches!(store.get(1), Err(StoreError::Unavailable)));
            assert!(matches!(store.count(), Err(StoreError::Unavailable)));
            assert!(matches!(
                store.add("abies alba", &record(1, 1, "Abies alba")),
                Err(StoreError::Unavailable)
            ));
        }
    }

    #[test]
    fn stop_is_idempotent() {
        for (label, store, _dir) in stores() {
            assert!(store.has_started(), "{label}");
            store.stop().unwrap();
            store.stop().unwrap();
            assert!(!store.has_started(), "{label}");
            assert!(matches!(store.all(), Err(StoreError::Unavailable)), "{label}");
        }
    }

    #[test]
    fn created_is_reported() {
        for (label, store, _dir) in stores() {
            assert!(store.created().unwrap().is_some(), "{label}");
        }
    }
}

mod crud {
    use super::common::*;
    use super::*;

    #[test]
    fn add_and_get() {
        for (label, store, _dir) in stores() {
            let name = authored(2, 1, "Abies alba", "Mill.");
            insert(store.as_ref(), &record(1, 1, "Abies alba"));
            insert(store.as_ref(), &name);

            assert_eq!(store.get(2).unwrap(), Some(name), "{label}");
            assert_eq!(store.get(3).unwrap(), None, "{label}");
            assert_eq!(store.count().unwrap(), 2, "{label}");
            assert_eq!(store.max_key().unwrap(), 2, "{label}");
        }
    }

    #[test]
    fn grouping_key_lookup_returns_whole_group() {
        for (label, store, _dir) in stores() {
            insert(store.as_ref(), &record(1, 1, "Abies alba"));
            insert(store.as_ref(), &authored(2, 1, "Abies alba", "Mill."));
            insert(store.as_ref(), &record(3, 3, "Picea abies"));

            let group = store.get_by_grouping_key("abies alba").unwrap();
            assert_eq!(keys(&group), vec![1, 2], "{label}");
            assert!(store.get_by_grouping_key("pinus").unwrap().is_empty(), "{label}");
        }
    }

    #[test]
    fn canonical_group_excludes_canonical_itself() {
        for (label, store, _dir) in stores() {
            insert(store.as_ref(), &record(1, 1, "Abies alba"));
            insert(store.as_ref(), &authored(2, 1, "Abies alba", "Mill."));
            insert(store.as_ref(), &authored(3, 1, "Abies alba", "L."));

            let group = store.get_canonical_group(1).unwrap();
            assert_eq!(keys(&group), vec![2, 3], "{label}");
            assert!(store.get_canonical_group(2).unwrap().is_empty(), "{label}");
        }
    }

    #[test]
    fn re_adding_replaces_record() {
        for (label, store, _dir) in stores() {
            let mut name = record(1, 1, "Abies alba");
            insert(store.as_ref(), &name);
            name.sanctioning_author = Some("Fr.".to_string());
            insert(store.as_ref(), &name);

            assert_eq!(store.count().unwrap(), 1, "{label}");
            assert_eq!(store.get_by_grouping_key("abies alba").unwrap().len(), 1, "{label}");
            assert_eq!(store.get(1).unwrap(), Some(name), "{label}");
        }
    }

    #[test]
    fn all_is_sorted_by_key() {
        for (label, store, _dir) in stores() {
            insert(store.as_ref(), &record(3, 3, "Picea abies"));
            insert(store.as_ref(), &record(1, 1, "Abies alba"));
            insert(store.as_ref(), &authored(2, 1, "Abies alba", "Mill."));

            assert_eq!(keys(&store.all().unwrap()), vec![1, 2, 3], "{label}");
        }
    }

    #[test]
    fn add_all_writes_every_record_or_none() {
        for (label, store, _dir) in stores() {
            let canonical = record(1, 1, "Abies alba");
            let mut broken = authored(2, 1, "Abies alba", "Mill.");
            broken.canonical_id = None;

            let result = store.add_all("abies alba", &[canonical.clone(), broken]);
            assert!(matches!(result, Err(StoreError::InvalidRecord(_))), "{label}");
            assert_eq!(store.count().unwrap(), 0, "{label}");
            assert!(store.get_by_grouping_key("abies alba").unwrap().is_empty(), "{label}");

            let qualified = authored(2, 1, "Abies alba", "Mill.");
            store.add_all("abies alba", &[canonical, qualified]).unwrap();
            assert_eq!(keys(&store.all().unwrap()), vec![1, 2], "{label}");
            assert_eq!(keys(&store.get_canonical_group(1).unwrap()), vec![2], "{label}");
        }
    }

    #[test]
    fn empty_store_has_max_key_zero() {
        for (label, store, _dir) in stores() {
            assert_eq!(store.max_key().unwrap(), 0, "{label}");
            assert!(store.all().unwrap().is_empty(), "{label}");
        }
    }
}

mod validation {
    use super::common::*;
    use super::*;

    #[test]
    fn non_ascii_grouping_key_is_rejected() {
        for (label, store, _dir) in stores() {
            let result = store.add("abies álba", &record(1, 1, "Abies álba"));
            assert!(matches!(result, Err(StoreError::InvalidGroupingKey(_))), "{label}");
            assert_eq!(store.count().unwrap(), 0, "{label}");
        }
    }

    #[test]
    fn incomplete_records_are_rejected() {
        for (label, store, _dir) in stores() {
            let mut missing_key = record(1, 1, "Abies alba");
            missing_key.key = None;
            assert!(matches!(
                store.add("abies alba", &missing_key),
                Err(StoreError::InvalidRecord(RecordError::MissingKey))
            ), "{label}");

            let mut missing_canonical = record(1, 1, "Abies alba");
            missing_canonical.canonical_id = None;
            assert!(matches!(
                store.add("abies alba", &missing_canonical),
                Err(StoreError::InvalidRecord(RecordError::MissingCanonicalId))
            ), "{label}");
        }
    }
}

mod deletion {
    use super::common::*;
    use super::*;

    #[test]
    fn deleting_qualified_record_keeps_canonical() {
        for (label, store, _dir) in stores() {
            insert(store.as_ref(), &record(1, 1, "Abies alba"));
            insert(store.as_ref(), &authored(2, 1, "Abies alba", "Mill."));

            let removed = store.delete(2).unwrap();
            assert_eq!(keys(&removed), vec![2], "{label}");
            assert!(store.get(1).unwrap().is_some(), "{label}");
            assert!(store.get_canonical_group(1).unwrap().is_empty(), "{label}");
            let group = store.get_by_grouping_key("abies alba").unwrap();
            assert_eq!(keys(&group), vec![1], "{label}");
        }
    }

    #[test]
    fn deleting_canonical_cascades() {
        for (label, store, _dir) in stores() {
            insert(store.as_ref(), &record(1, 1, "Abies alba"));
            insert(store.as_ref(), &authored(2, 1, "Abies alba", "Mill."));
            insert(store.as_ref(), &authored(3, 1, "Abies alba", "L."));
            insert(store.as_ref(), &record(4, 4, "Picea abies"));

            let removed = store.delete(1).unwrap();
            assert_eq!(keys(&removed), vec![1, 2, 3], "{label}");
            assert_eq!(keys(&store.all().unwrap()), vec![4], "{label}");
            assert!(store.get_by_grouping_key("abies alba").unwrap().is_empty(), "{label}");
            assert!(store.get_canonical_group(1).unwrap().is_empty(), "{label}");
        }
    }

    #[test]
    fn max_key_is_not_lowered_by_delete() {
        for (label, store, _dir) in stores() {
            insert(store.as_ref(), &record(1, 1, "Abies alba"));
            insert(store.as_ref(), &record(2, 2, "Picea abies"));
            store.delete(2).unwrap();
            assert_eq!(store.max_key().unwrap(), 2, "{label}");

            store.clear().unwrap();
            assert_eq!(store.max_key().unwrap(), 0, "{label}");
        }
    }

    #[test]
    fn deleting_unknown_key_removes_nothing() {
        for (label, store, _dir) in stores() {
            insert(store.as_ref(), &record(1, 1, "Abies alba"));
            assert!(store.delete(9).unwrap().is_empty(), "{label}");
            assert_eq!(store.count().unwrap(), 1, "{label}");
        }
    }
}

mod maintenance {
    use super::common::*;
    use super::*;

    #[test]
    fn clear_empties_every_map() {
        for (label, store, _dir) in stores() {
            insert(store.as_ref(), &record(1, 1, "Abies alba"));
            insert(store.as_ref(), &authored(2, 1, "Abies alba", "Mill."));

            store.clear().unwrap();
            assert_eq!(store.count().unwrap(), 0, "{label}");
            assert!(store.get_by_grouping_key("abies alba").unwrap().is_empty(), "{label}");
            assert!(store.get_canonical_group(1).unwrap().is_empty(), "{label}");
            assert!(store.created().unwrap().is_some(), "{label}");

            insert(store.as_ref(), &record(5, 5, "Picea abies"));
            assert_eq!(store.count().unwrap(), 1, "{label}");
        }
    }

    #[test]
    fn compact_keeps_content() {
        for (label, store, _dir) in stores() {
            insert(store.as_ref(), &record(1, 1, "Abies alba"));
            insert(store.as_ref(), &authored(2, 1, "Abies alba", "Mill."));
            insert(store.as_ref(), &record(3, 3, "Picea abies"));
            store.delete(3).unwrap();

            store.compact().unwrap();
            assert_eq!(keys(&store.all().unwrap()), vec![1, 2], "{label}");
            assert_eq!(keys(&store.get_canonical_group(1).unwrap()), vec![2], "{label}");
        }
    }
}

use super::*;
use std::path::PathBuf;
use tempfile::TempDir;

mod file {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let config = IndexConfig::load(&IndexConfig::path(temp.path())).unwrap();
        assert_eq!(config, IndexConfig::default());
        assert_eq!(config.backend, BackendKind::Embedded);
        assert!(config.file.is_none());
    }

    #[test]
    fn test_save_and_load() {
        let temp = TempDir::new().unwrap();
        let path = IndexConfig::path(temp.path());
        let config = IndexConfig {
            backend: BackendKind::Large,
            max_entries: 5_000_000,
            verify: false,
            ..IndexConfig::embedded("/var/lib/nidx")
        };
        config.save(&path).unwrap();
        assert_eq!(IndexConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let temp = TempDir::new().unwrap();
        let path = IndexConfig::path(temp.path());
        std::fs::write(&path, "backend = \"memory\"\n").unwrap();

        let config = IndexConfig::load(&path).unwrap();
        assert_eq!(config.backend, BackendKind::Memory);
        assert_eq!(config.pool_size, 8);
        assert_eq!(config.max_entries, 1_000_000);
        assert!(config.verify);
    }

    #[test]
    fn test_unknown_backend_is_parse_error() {
        let temp = TempDir::new().unwrap();
        let path = IndexConfig::path(temp.path());
        std::fs::write(&path, "backend = \"mapdb\"\n").unwrap();
        assert!(matches!(
            IndexConfig::load(&path),
            Err(IndexConfigError::Parse(_))
        ));
    }
}

mod validation {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(IndexConfig::default().validate().is_empty());
        assert!(IndexConfig::memory().validate().is_empty());
    }

    #[test]
    fn test_invalid_values_are_replaced() {
        let config = IndexConfig {
            backend: BackendKind::Memory,
            file: Some(PathBuf::from("/tmp/nidx")),
            pool_size: 0,
            max_entries: 0,
            verify: false,
        };
        assert_eq!(config.validate().len(), 3);

        let fixed = config.with_defaults_for_invalid();
        assert!(fixed.validate().is_empty());
        assert!(fixed.file.is_none());
        assert_eq!(fixed.pool_size, 8);
        assert!(!fixed.verify);
    }

    #[test]
    fn test_db_path_inside_dir() {
        let config = IndexConfig::embedded("/data");
        assert_eq!(config.db_path(), Some(PathBuf::from("/data/nidx.redb")));
        assert_eq!(IndexConfig::memory().db_path(), None);
    }
}

mod backend {
    use super::*;

    #[test]
    fn test_only_large_sizes_cache() {
        assert_eq!(BackendKind::Memory.cache_size(1_000_000), None);
        assert_eq!(BackendKind::Embedded.cache_size(1_000_000), None);
        assert_eq!(
            BackendKind::Large.cache_size(1_000_000),
            Some(512 * 1_000_000)
        );
    }

    #[test]
    fn test_large_cache_is_clamped() {
        assert_eq!(BackendKind::Large.cache_size(1), Some(64 * 1024 * 1024));
        assert_eq!(
            BackendKind::Large.cache_size(u64::MAX),
            usize::try_from(4u64 * 1024 * 1024 * 1024).ok()
        );
    }
}

//! Integration tests for fscache

mod store_tests {
    use fscache::{Cache, CacheConfig, NEVER_EXPIRES};
    use serde::{Deserialize, Serialize};
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
    struct Report {
        title: String,
        rows: Vec<u64>,
        tags: HashMap<String, String>,
    }

    fn sample_report() -> Report {
        let mut tags = HashMap::new();
        tags.insert("lang".to_string(), "en".to_string());
        Report {
            title: "monthly".to_string(),
            rows: vec![1, 2, 3],
            tags,
        }
    }

    #[test]
    fn config_builds_working_store() {
        let temp = TempDir::new().unwrap();
        let config = CacheConfig {
            path: temp.path().join("cache"),
            timeout: 120,
        };
        let cache = Cache::new(config);

        cache.set("reports:monthly", &sample_report()).unwrap();
        let loaded: Report = cache.get("reports:monthly", Report::default());
        assert_eq!(loaded, sample_report());
    }

    #[test]
    fn structured_values_roundtrip() {
        let temp = TempDir::new().unwrap();
        let cache = Cache::with_root(temp.path().join("cache"), 60);

        cache.set("r", &sample_report()).unwrap();
        let loaded: Report = cache.get("r", Report::default());
        assert_eq!(loaded, sample_report());

        cache.set("n", &42u64).unwrap();
        assert_eq!(cache.get("n", 0u64), 42);

        cache.set("s", &"text".to_string()).unwrap();
        assert_eq!(cache.get("s", String::new()), "text");

        cache.set("v", &vec![1i32, -2, 3]).unwrap();
        assert_eq!(cache.get("v", Vec::<i32>::new()), vec![1, -2, 3]);
    }

    #[test]
    fn nested_keys_build_directories() {
        let temp = TempDir::new().unwrap();
        let cache = Cache::with_root(temp.path().join("cache"), 60);

        cache.set("a:b:c:d", &1u32).unwrap();

        assert!(temp.path().join("cache/a/b/c").is_dir());
        assert!(temp.path().join("cache/a/b/c/d").is_file());
        assert_eq!(cache.get("a/b/c/d", 0u32), 1);
    }

    #[test]
    fn default_ttl_of_zero_pins_entries() {
        let temp = TempDir::new().unwrap();
        let cache = Cache::with_root(temp.path().join("cache"), 0);

        cache.set("pinned", &"v").unwrap();

        let (expires_at, _) = cache.load_value("pinned").unwrap();
        assert_eq!(expires_at, NEVER_EXPIRES);
    }

    #[test]
    fn flush_then_repopulate() {
        let temp = TempDir::new().unwrap();
        let cache = Cache::with_root(temp.path().join("cache"), 60);

        for i in 0..5 {
            cache.set(&format!("batch:{i}"), &i).unwrap();
        }
        cache.flush().unwrap();
        for i in 0..5 {
            assert!(!cache.has(&format!("batch:{i}")));
        }

        cache.set("batch:0", &99i32).unwrap();
        assert_eq!(cache.get("batch:0", 0i32), 99);
    }
}

mod tracker_tests {
    use fscache::{Cache, ModificationTracker, SourceRegistry};
    use std::fs;
    use std::thread;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn cold_start_then_steady_state() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("report.rs");
        fs::write(&source, "pub struct Report;").unwrap();

        // let the source file age past one clock second, so its mtime is
        // strictly older than the upcoming validation instant
        thread::sleep(Duration::from_millis(1100));

        let cache = Cache::with_root(temp.path().join("cache"), 60);
        let mut registry = SourceRegistry::new();
        registry.register("report", &source);
        let tracker = ModificationTracker::new(cache, registry);

        // first check after cold start always invalidates
        assert!(tracker.is_modified("report", true).unwrap());

        // unchanged sources now read as validated
        assert!(!tracker.is_modified("report", true).unwrap());
        assert!(!tracker.is_modified("report", false).unwrap());
    }

    #[test]
    fn rewriting_a_source_invalidates() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("report.rs");
        fs::write(&source, "pub struct Report;").unwrap();

        thread::sleep(Duration::from_millis(1100));

        let cache = Cache::with_root(temp.path().join("cache"), 60);
        let mut registry = SourceRegistry::new();
        registry.register("report", &source);
        let tracker = ModificationTracker::new(cache, registry);

        assert!(tracker.is_modified("report", true).unwrap());
        assert!(!tracker.is_modified("report", true).unwrap());

        // touch the source; its mtime now ties or beats the record
        fs::write(&source, "pub struct Report { pub wide: bool }").unwrap();
        assert!(tracker.is_modified("report", true).unwrap());
    }

    #[test]
    fn tracker_records_live_beside_general_entries() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("unit.rs");
        fs::write(&source, "fn f() {}").unwrap();

        let cache = Cache::with_root(temp.path().join("cache"), 60);
        let mut registry = SourceRegistry::new();
        registry.register("unit", &source);
        let tracker = ModificationTracker::new(cache.clone(), registry);

        cache.set("general", &"value").unwrap();
        tracker.mark_validated("unit").unwrap();

        // both coexist; the tracker uses its own namespace
        assert_eq!(cache.get("general", String::new()), "value");
        assert!(cache.has("class-modified/unit"));

        // flushing the store also clears validation records
        cache.flush().unwrap();
        assert!(tracker.is_modified("unit", false).unwrap());
    }
}

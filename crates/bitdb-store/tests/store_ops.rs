//! Store behaviour through the public API: lookups, deletes, reopen and
//! batched set-op counts.

use bitdb_core::{BitError, BitVector, SetOp};
use bitdb_store::{BitStore, StoreConfig, StoreError};
use bitdb_test_utils::{sample_vectors, ScratchDir, VectorGen};

fn v(universe: usize, indices: &[usize]) -> BitVector {
    BitVector::from_indices(universe, indices).unwrap()
}

fn open(scratch: &ScratchDir) -> BitStore {
    BitStore::open_with(scratch.store_path(), StoreConfig::testing()).unwrap()
}

#[test]
fn put_get_delete_get() {
    let scratch = ScratchDir::new();
    let mut store = open(&scratch);

    store.put("alpha", &v(16, &[2, 5, 9])).unwrap();
    assert_eq!(store.get("alpha").unwrap().to_index_list(), vec![2, 5, 9]);

    store.delete("alpha").unwrap();
    assert!(matches!(
        store.get("alpha"),
        Err(StoreError::KeyNotFound { key }) if key == "alpha"
    ));
    assert!(store.is_empty());
}

#[test]
fn missing_key_errors() {
    let scratch = ScratchDir::new();
    let mut store = open(&scratch);
    assert!(matches!(store.get("nope"), Err(StoreError::KeyNotFound { .. })));
    assert!(matches!(store.delete("nope"), Err(StoreError::KeyNotFound { .. })));
    assert!(matches!(store.count_at("nope"), Err(StoreError::KeyNotFound { .. })));
}

#[test]
fn last_write_wins() {
    let scratch = ScratchDir::new();
    let mut store = open(&scratch);
    store.put("k", &v(8, &[0])).unwrap();
    store.put("k", &v(32, &[31])).unwrap();
    assert_eq!(store.len(), 1);
    assert_eq!(store.get("k").unwrap(), v(32, &[31]));
}

#[test]
fn invalid_keys_touch_nothing() {
    let scratch = ScratchDir::new();
    let config = StoreConfig {
        max_key_len: 4,
        ..StoreConfig::testing()
    };
    let mut store = BitStore::open_with(scratch.store_path(), config).unwrap();
    let before = std::fs::metadata(scratch.store_path()).unwrap().len();

    assert!(matches!(store.put("", &v(8, &[])), Err(StoreError::InvalidKey { .. })));
    assert!(matches!(
        store.put("toolong", &v(8, &[])),
        Err(StoreError::InvalidKey { .. })
    ));
    assert!(matches!(
        store.put("a\0b", &v(8, &[])),
        Err(StoreError::InvalidKey { .. })
    ));
    assert_eq!(std::fs::metadata(scratch.store_path()).unwrap().len(), before);
    assert_eq!(store.metrics().puts, 0);
}

#[test]
fn keys_over_a_lowered_limit_stay_reachable() {
    let scratch = ScratchDir::new();
    let long = "k".repeat(100);
    {
        let mut store = open(&scratch);
        store.put(&long, &v(8, &[3])).unwrap();
        store.put("short", &v(8, &[4])).unwrap();
        store.close().unwrap();
    }

    let config = StoreConfig {
        max_key_len: 16,
        ..StoreConfig::testing()
    };
    let mut store = BitStore::open_with(scratch.store_path(), config).unwrap();
    assert!(store.list().contains(&long));
    assert_eq!(store.get(&long).unwrap(), v(8, &[3]));
    assert_eq!(store.count_at(&long).unwrap(), 1);
    assert!(matches!(
        store.get(&"x".repeat(100)),
        Err(StoreError::KeyNotFound { .. })
    ));

    // New writes still honour the configured limit.
    assert!(matches!(
        store.put(&long, &v(8, &[5])),
        Err(StoreError::InvalidKey { .. })
    ));
    store.delete(&long).unwrap();
    assert_eq!(store.list(), vec!["short".to_string()]);
}

#[test]
fn values_survive_reopen() {
    let scratch = ScratchDir::new();
    let fixtures = sample_vectors();
    {
        let mut store = open(&scratch);
        for (name, vector) in &fixtures {
            store.put(name, vector).unwrap();
        }
        store.delete("empty_0").unwrap();
        store.close().unwrap();
    }

    let store = open(&scratch);
    assert_eq!(store.len(), fixtures.len() - 1);
    assert!(!store.contains("empty_0"));
    for (name, vector) in fixtures.iter().filter(|(n, _)| n != "empty_0") {
        assert_eq!(&store.get(name).unwrap(), vector, "{name}");
    }
    assert_eq!(store.metrics().records_replayed, fixtures.len() as u64 + 1);
    assert_eq!(store.metrics().torn_bytes_discarded, 0);
}

#[test]
fn list_returns_live_keys() {
    let scratch = ScratchDir::new();
    let mut store = open(&scratch);
    for key in ["a", "b", "c"] {
        store.put(key, &v(4, &[1])).unwrap();
    }
    store.delete("b").unwrap();
    let mut keys = store.list();
    keys.sort();
    assert_eq!(keys, vec!["a".to_string(), "c".to_string()]);
}

#[test]
fn count_at_matches_stored_vector() {
    let scratch = ScratchDir::new();
    let mut store = open(&scratch);
    let vector = VectorGen::new(11).vector(1000, 0.2);
    store.put("random", &vector).unwrap();
    assert_eq!(store.count_at("random").unwrap(), vector.count());
}

#[test]
fn setop_counts_against_every_key() {
    let scratch = ScratchDir::new();
    let mut store = open(&scratch);
    store.put("low", &v(16, &[0, 1, 2, 3])).unwrap();
    store.put("high", &v(16, &[12, 13, 14, 15])).unwrap();
    store.put("mid", &v(16, &[2, 3, 12])).unwrap();

    let query = v(16, &[2, 3, 4, 12]);
    let mut counts = store.setop_counts(&query, SetOp::Intersect).unwrap();
    counts.sort();
    assert_eq!(
        counts,
        vec![
            ("high".to_string(), 1),
            ("low".to_string(), 2),
            ("mid".to_string(), 3),
        ]
    );

    for (key, count) in store.setop_counts(&query, SetOp::Union).unwrap() {
        let stored = store.get(&key).unwrap();
        assert_eq!(count, query.union(&stored).unwrap().count());
    }
}

#[test]
fn setop_counts_reports_size_mismatch() {
    let scratch = ScratchDir::new();
    let mut store = open(&scratch);
    store.put("small", &v(8, &[1])).unwrap();
    let err = store
        .setop_counts(&v(9, &[1]), SetOp::Difference)
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::Bit(BitError::SizeMismatch { left: 9, right: 8 })
    ));
}

#[test]
fn non_store_file_fails_to_open() {
    let scratch = ScratchDir::new();
    std::fs::write(scratch.store_path(), b"definitely not a store").unwrap();
    assert!(matches!(
        BitStore::open(scratch.store_path()),
        Err(StoreError::Open { .. })
    ));
}

#[test]
fn unopenable_path_fails_with_open_error() {
    let scratch = ScratchDir::new();
    let path = scratch.path().join("missing-dir").join("bits.db");
    assert!(matches!(BitStore::open(path), Err(StoreError::Open { .. })));
}

#[test]
fn invalid_config_rejected_before_touching_disk() {
    let scratch = ScratchDir::new();
    let config = StoreConfig {
        compaction_ratio: 2.0,
        ..StoreConfig::default()
    };
    assert!(matches!(
        BitStore::open_with(scratch.store_path(), config),
        Err(StoreError::InvalidConfig { .. })
    ));
    assert!(!scratch.store_path().exists());
}

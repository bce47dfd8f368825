//! Extendible Hash Table Tests
//!
//! Scenario tests plus property tests against a `HashMap` model.

use pagecache::container::hash::{BuildIdentityHasher, ExtendibleHashTable};
use proptest::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;
use std::thread;

type IdentityTable<V> = ExtendibleHashTable<u64, V, BuildIdentityHasher>;

fn identity_table<V: Clone>(bucket_size: usize) -> IdentityTable<V> {
    ExtendibleHashTable::with_hasher(bucket_size, BuildIdentityHasher::default())
}

/// Check that every slot's bucket depth is within the global depth and that
/// the directory is exactly `2^global_depth` long.
fn assert_directory_invariant<V: Clone>(table: &IdentityTable<V>) {
    let global = table.global_depth();
    assert_eq!(table.dir_len(), 1usize << global);
    for i in 0..table.dir_len() {
        assert!(table.local_depth(i) <= global, "slot {} too deep", i);
    }
}

#[test]
fn test_sample() {
    let table = identity_table::<String>(2);

    table.insert(1, "a".to_string());
    table.insert(2, "b".to_string());
    table.insert(3, "c".to_string());
    table.insert(4, "d".to_string());
    table.insert(5, "e".to_string());
    table.insert(6, "f".to_string());
    table.insert(7, "g".to_string());
    table.insert(8, "h".to_string());
    table.insert(9, "i".to_string());

    assert_eq!(table.local_depth(0), 2);
    assert_eq!(table.local_depth(1), 3);
    assert_eq!(table.local_depth(2), 2);
    assert_eq!(table.local_depth(3), 2);

    assert_eq!(table.find(&9).as_deref(), Some("i"));
    assert_eq!(table.find(&8).as_deref(), Some("h"));
    assert_eq!(table.find(&2).as_deref(), Some("b"));
    assert_eq!(table.find(&10), None);

    assert!(table.remove(&8));
    assert!(table.remove(&4));
    assert!(table.remove(&1));
    assert!(!table.remove(&20));
}

#[test]
fn test_one_split_keeps_earlier_entries() {
    let table = identity_table::<u64>(4);

    for key in 0..5 {
        table.insert(key, key + 100);
    }

    assert_eq!(table.global_depth(), 1);
    assert_eq!(table.num_buckets(), 2);
    for key in 0..5 {
        assert_eq!(table.find(&key), Some(key + 100));
    }
}

#[test]
fn test_remove_does_not_shrink() {
    let table = identity_table::<u64>(2);
    for key in 0..32 {
        table.insert(key, key);
    }
    let depth = table.global_depth();
    let buckets = table.num_buckets();

    for key in 0..32 {
        assert!(table.remove(&key));
    }

    assert!(table.is_empty());
    assert_eq!(table.global_depth(), depth);
    assert_eq!(table.num_buckets(), buckets);
}

#[test]
fn test_concurrent_insert_and_find() {
    const THREADS: u64 = 4;
    const PER_THREAD: u64 = 500;

    let table = Arc::new(identity_table::<u64>(4));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let table = Arc::clone(&table);
            thread::spawn(move || {
                for i in 0..PER_THREAD {
                    let key = i * THREADS + t;
                    table.insert(key, key * 10);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(table.len(), (THREADS * PER_THREAD) as usize);
    for key in 0..THREADS * PER_THREAD {
        assert_eq!(table.find(&key), Some(key * 10));
    }
    assert_directory_invariant(&table);
}

#[derive(Debug, Clone)]
enum Op {
    Insert(u64, u32),
    Remove(u64),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => ((0u64..512), any::<u32>()).prop_map(|(k, v)| Op::Insert(k, v)),
        1 => (0u64..512).prop_map(Op::Remove),
    ]
}

proptest! {
    #[test]
    fn prop_matches_hashmap_model(
        bucket_size in 1usize..8,
        ops in prop::collection::vec(op_strategy(), 1..300),
    ) {
        let table = identity_table::<u32>(bucket_size);
        let mut model = HashMap::new();

        for op in ops {
            match op {
                Op::Insert(k, v) => {
                    table.insert(k, v);
                    model.insert(k, v);
                }
                Op::Remove(k) => {
                    prop_assert_eq!(table.remove(&k), model.remove(&k).is_some());
                }
            }
        }

        prop_assert_eq!(table.len(), model.len());
        for (k, v) in &model {
            prop_assert_eq!(table.find(k), Some(*v));
        }
        assert_directory_invariant(&table);
    }

    #[test]
    fn prop_random_hasher_round_trip(keys in prop::collection::hash_set(any::<u64>(), 0..200)) {
        let table = ExtendibleHashTable::new(3);
        for &k in &keys {
            table.insert(k, k.wrapping_mul(31));
        }
        for &k in &keys {
            prop_assert_eq!(table.find(&k), Some(k.wrapping_mul(31)));
            prop_assert!(table.remove(&k));
            prop_assert_eq!(table.find(&k), None);
        }
    }
}

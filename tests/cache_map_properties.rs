// ==============================================
// CACHE MAP PROPERTY TESTS (integration)
// ==============================================
//
// Random operation sequences checked against a simple model of which keys
// are pinned and against the structural invariants after every step.

use std::collections::{HashMap, HashSet};

use proptest::prelude::*;
use tiercache::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Put(u8, u16),
    Get(u8),
    Remove(u8),
    Pin(u8),
    Unpin(u8),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0u8..32, any::<u16>()).prop_map(|(k, v)| Op::Put(k, v)),
        3 => (0u8..32).prop_map(Op::Get),
        1 => (0u8..32).prop_map(Op::Remove),
        1 => (0u8..32).prop_map(Op::Pin),
        1 => (0u8..32).prop_map(Op::Unpin),
    ]
}

proptest! {
    /// Property: tier bounds and cross-tier uniqueness hold after every operation,
    /// pinned values are never lost, and pin registrations follow pin/unpin/remove.
    #[cfg_attr(miri, ignore)]
    #[test]
    fn prop_operations_preserve_invariants(
        lru in any::<bool>(),
        cache_size in 0usize..8,
        soft in 0usize..8,
        ops in prop::collection::vec(op_strategy(), 0..200)
    ) {
        let cache: CacheMap<u8, u16> = CacheMapBuilder::new()
            .lru(lru)
            .cache_size(cache_size)
            .soft_reference_size(soft)
            .build();

        let mut pinned: HashSet<u8> = HashSet::new();
        let mut pinned_values: HashMap<u8, u16> = HashMap::new();

        for op in ops {
            match op {
                Op::Put(k, v) => {
                    cache.put(k, v).unwrap();
                    if pinned.contains(&k) {
                        pinned_values.insert(k, v);
                    }
                    // The entry just written is retrievable unless both
                    // bounded tiers have zero capacity.
                    if pinned.contains(&k) || cache_size + soft > 0 {
                        prop_assert_eq!(cache.get(&k).unwrap().map(|v| *v), Some(v));
                    }
                },
                Op::Get(k) => {
                    let got = cache.get(&k).unwrap().map(|v| *v);
                    if let Some(expected) = pinned_values.get(&k) {
                        prop_assert_eq!(got, Some(*expected));
                    }
                },
                Op::Remove(k) => {
                    cache.remove(&k).unwrap();
                    pinned.remove(&k);
                    pinned_values.remove(&k);
                    prop_assert!(!cache.contains_key(&k).unwrap());
                },
                Op::Pin(k) => {
                    let found = cache.pin(k).unwrap();
                    prop_assert_eq!(found, cache.contains_key(&k).unwrap());
                    if found && !pinned_values.contains_key(&k) {
                        let value = cache.get(&k).unwrap().map(|v| *v);
                        prop_assert!(value.is_some());
                        if let Some(value) = value {
                            pinned_values.insert(k, value);
                        }
                    }
                    pinned.insert(k);
                },
                Op::Unpin(k) => {
                    let was = cache.unpin(&k).unwrap();
                    prop_assert_eq!(was, pinned.remove(&k));
                    pinned_values.remove(&k);
                },
            }

            prop_assert!(cache.check_invariants().unwrap().is_ok());
            let unpinned_len = cache.len().unwrap() - pinned_values.len();
            prop_assert!(unpinned_len <= cache_size + soft);
            let mut keys = cache.pinned_keys().unwrap();
            keys.sort_unstable();
            let mut expected: Vec<u8> = pinned.iter().copied().collect();
            expected.sort_unstable();
            prop_assert_eq!(keys, expected);
        }
    }

    /// Property: contains_key agrees with the key snapshot and contains_value
    /// agrees with the entry snapshot.
    #[cfg_attr(miri, ignore)]
    #[test]
    fn prop_contains_agrees_with_snapshot(
        cache_size in 0usize..6,
        soft in 0usize..6,
        puts in prop::collection::vec((0u8..16, 0u16..64), 0..60)
    ) {
        let cache: CacheMap<u8, u16> = CacheMapBuilder::new()
            .lru(true)
            .cache_size(cache_size)
            .soft_reference_size(soft)
            .build();
        for (k, v) in puts {
            cache.put(k, v).unwrap();
        }

        let keys: HashSet<u8> = cache.keys().unwrap().into_iter().collect();
        let values: HashSet<u16> = cache.entries().unwrap().into_iter().map(|(_, v)| *v).collect();
        for k in 0u8..16 {
            prop_assert_eq!(cache.contains_key(&k).unwrap(), keys.contains(&k));
        }
        for v in 0u16..64 {
            prop_assert_eq!(cache.contains_value(&v).unwrap(), values.contains(&v));
        }
        prop_assert_eq!(keys.len(), cache.len().unwrap());
    }

    /// Property: put_all without replace never overwrites, with replace always does.
    #[cfg_attr(miri, ignore)]
    #[test]
    fn prop_put_all_replace_flag(
        existing in prop::collection::vec(0u8..16, 0..8),
        incoming in prop::collection::vec(0u8..16, 0..8),
        replace in any::<bool>()
    ) {
        let dst: CacheMap<u8, u16> = CacheMapBuilder::new().cache_size(64).build();
        let src: CacheMap<u8, u16> = CacheMapBuilder::new().cache_size(64).build();
        for &k in &existing {
            dst.put(k, 1).unwrap();
        }
        for &k in &incoming {
            src.put(k, 2).unwrap();
        }
        dst.put_all(&src, replace).unwrap();

        for k in 0u8..16 {
            let got = dst.get(&k).unwrap().map(|v| *v);
            let expected = match (existing.contains(&k), incoming.contains(&k)) {
                (true, true) if replace => Some(2),
                (true, _) => Some(1),
                (false, true) => Some(2),
                (false, false) => None,
            };
            prop_assert_eq!(got, expected);
        }
    }
}

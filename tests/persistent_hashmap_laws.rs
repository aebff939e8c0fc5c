//! Property-based tests for PersistentHashMap laws.
//!
//! This module verifies the map invariants of PersistentHashMap using
//! proptest, with `std::collections::HashMap` as the model.

use persistent_trie::persistent::PersistentHashMap;
use proptest::prelude::*;
use std::collections::HashMap;

fn build(entries: &[(u16, i32)]) -> PersistentHashMap<u16, i32> {
    entries.iter().copied().collect()
}

fn model(entries: &[(u16, i32)]) -> HashMap<u16, i32> {
    entries.iter().copied().collect()
}

// =============================================================================
// put / get Laws
// =============================================================================

proptest! {
    /// Put-Get Law: a key reads back the value just bound to it
    #[test]
    fn prop_put_get_law(
        entries in prop::collection::vec(any::<(u16, i32)>(), 0..300),
        key: u16,
        value: i32
    ) {
        let map = build(&entries);
        let updated = map.put(key, value);

        prop_assert_eq!(updated.get(&key), Some(&value));
        prop_assert_eq!(
            updated.len(),
            map.len() + usize::from(!map.contains_key(&key))
        );
    }

    /// Put Idempotence Law: rebinding an equal value returns the same map
    #[test]
    fn prop_put_idempotence_law(
        entries in prop::collection::vec(any::<(u16, i32)>(), 1..300),
        pick in any::<prop::sample::Index>()
    ) {
        let map = build(&entries);
        let (key, _) = entries[pick.index(entries.len())];
        let value = *map.get(&key).unwrap();

        prop_assert!(map.put(key, value).ptr_eq(&map));
    }

    /// Model Law: the map agrees with std's HashMap after any put sequence
    #[test]
    fn prop_agrees_with_model(
        entries in prop::collection::vec(any::<(u16, i32)>(), 0..500)
    ) {
        let map = build(&entries);
        let expected = model(&entries);

        prop_assert_eq!(map.len(), expected.len());
        prop_assert!(map == expected);
        prop_assert_eq!(map.iter().count(), expected.len());
    }
}

// =============================================================================
// remove Laws
// =============================================================================

proptest! {
    /// Round-Trip Law: put then remove of an absent key restores the map
    #[test]
    fn prop_put_remove_round_trip(
        entries in prop::collection::vec(any::<(u16, i32)>(), 0..300),
        key: u16,
        value: i32
    ) {
        let map = build(&entries);
        prop_assume!(!map.contains_key(&key));

        let round_trip = map.put(key, value).remove(&key);
        prop_assert_eq!(&round_trip, &map);
        prop_assert_eq!(round_trip.len(), map.len());
    }

    /// Remove Law: removed keys disappear, other keys survive
    #[test]
    fn prop_remove_matches_model(
        entries in prop::collection::vec(any::<(u16, i32)>(), 0..300),
        removals in prop::collection::vec(any::<u16>(), 0..100)
    ) {
        let mut expected = model(&entries);
        let map = removals.iter().fold(build(&entries), |map, key| {
            expected.remove(key);
            map.remove(key)
        });

        prop_assert!(map == expected);
        if expected.is_empty() {
            prop_assert!(map.ptr_eq(&PersistentHashMap::EMPTY));
        }
    }

    /// Persistence Law: remove leaves the original untouched
    #[test]
    fn prop_remove_preserves_original(
        entries in prop::collection::vec(any::<(u16, i32)>(), 1..300),
        pick in any::<prop::sample::Index>()
    ) {
        let map = build(&entries);
        let (key, _) = entries[pick.index(entries.len())];
        let removed = map.remove(&key);

        prop_assert!(map.contains_key(&key));
        prop_assert!(!removed.contains_key(&key));
        prop_assert!(map == model(&entries));
    }
}

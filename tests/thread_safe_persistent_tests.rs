//! Integration tests for thread-safe persistent data structures.
//!
//! These tests verify that the collections work correctly with the `arc`
//! feature enabled, sharing immutable data across threads.

#![cfg(feature = "arc")]
#![allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]

use persistent_trie::persistent::{
    LazyMapView, PersistentHashMap, PersistentMap, PersistentVector, Retention,
};
use rstest::rstest;
use std::collections::HashMap;
use std::sync::Arc;
use std::thread;

// =============================================================================
// PersistentVector Integration Tests
// =============================================================================

#[rstest]
fn test_vector_cross_thread_structural_sharing() {
    let original: Arc<PersistentVector<i32>> = Arc::new((0..100).collect());

    let handles: Vec<_> = (0..4)
        .map(|index| {
            let vector_clone = Arc::clone(&original);
            thread::spawn(move || {
                let extended = vector_clone.add(index * 10);
                assert_eq!(extended.len(), 101);
                assert_eq!(extended.get(100), Ok(&(index * 10)));
                assert_eq!(vector_clone.len(), 100);
                extended
            })
        })
        .collect();

    let results: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().expect("Thread panicked"))
        .collect();

    for (index, vector) in results.iter().enumerate() {
        assert_eq!(vector.last(), Some(&((index * 10) as i32)));
    }
    assert_eq!(original.len(), 100);
}

#[rstest]
fn test_vector_moved_between_threads() {
    let vector: PersistentVector<String> = (0..1000).map(|index| index.to_string()).collect();
    let handle = thread::spawn(move || vector.add("tail".to_string()));
    let extended = handle.join().expect("Thread panicked");
    assert_eq!(extended.last(), Some(&"tail".to_string()));
}

// =============================================================================
// PersistentHashMap Integration Tests
// =============================================================================

#[rstest]
fn test_hashmap_cross_thread_structural_sharing() {
    let original: PersistentHashMap<i32, i32> = (0..1000).map(|index| (index, index)).collect();

    let results: Vec<PersistentHashMap<i32, i32>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|index| {
                let map = original.clone();
                scope.spawn(move || map.put(index, -index).remove(&(index + 500)))
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("Thread panicked"))
            .collect()
    });

    for (index, map) in results.iter().enumerate() {
        let index = index as i32;
        assert_eq!(map.len(), 999);
        assert_eq!(map.get(&index), Some(&-index));
        assert_eq!(map.get(&(index + 500)), None);
    }
    assert_eq!(original.len(), 1000);
    assert_eq!(original.get(&0), Some(&0));
}

// =============================================================================
// LazyMapView Integration Tests
// =============================================================================

#[rstest]
#[case(Retention::Strong)]
#[case(Retention::Weak)]
fn test_view_shared_across_threads(#[case] retention: Retention) {
    let source: HashMap<i32, i32> = (0..2000).map(|index| (index, index)).collect();
    let view = LazyMapView::with_retention(&source, retention);

    thread::scope(|scope| {
        for index in 0..8 {
            let view = &view;
            let source = &source;
            scope.spawn(move || {
                assert_eq!(view.get(&index), Some(&index));
                let promoted = view.promoted();
                assert!(promoted == *source);
                let map: PersistentMap<i32, i32> = view.clone().into();
                assert_eq!(map.put(-1, index).len(), 2001);
            });
        }
    });

    assert_eq!(view, source);
}

#![cfg(feature = "serde")]

//! Integration tests for serde support.
//!
//! These tests verify that the collections serialize and deserialize
//! through JSON.

use persistent_trie::persistent::{
    PersistentEntry, PersistentHashMap, PersistentMap, PersistentVector, factory,
};
use rstest::rstest;
use std::collections::HashMap;

// =============================================================================
// PersistentVector Integration Tests
// =============================================================================

#[rstest]
fn test_vector_json_roundtrip() {
    let vector: PersistentVector<i32> = (1..=100).collect();
    let json = serde_json::to_string(&vector).unwrap();
    let restored: PersistentVector<i32> = serde_json::from_str(&json).unwrap();
    assert_eq!(vector, restored);
}

#[rstest]
fn test_vector_json_format() {
    let vector = factory::sequence_from_slice(&[1, 2, 3]);
    assert_eq!(serde_json::to_string(&vector).unwrap(), "[1,2,3]");
}

#[rstest]
fn test_empty_vector_deserializes_to_canonical_empty() {
    let restored: PersistentVector<i32> = serde_json::from_str("[]").unwrap();
    assert!(restored.ptr_eq(&PersistentVector::EMPTY));
}

// =============================================================================
// PersistentHashMap Integration Tests
// =============================================================================

#[rstest]
fn test_hashmap_json_roundtrip() {
    let map: PersistentHashMap<String, i32> =
        (0..50).map(|index| (format!("key{index}"), index)).collect();
    let json = serde_json::to_string(&map).unwrap();
    let restored: PersistentHashMap<String, i32> = serde_json::from_str(&json).unwrap();
    assert_eq!(map, restored);
}

#[rstest]
fn test_hashmap_json_format() {
    let map = PersistentHashMap::singleton("key".to_string(), 1);
    assert_eq!(serde_json::to_string(&map).unwrap(), r#"{"key":1}"#);
}

#[rstest]
fn test_view_serializes_like_trie() {
    let plain: HashMap<String, i32> = [("a".to_string(), 1)].into_iter().collect();
    let view = factory::map_from(&plain);
    let json = serde_json::to_string(&view).unwrap();
    assert_eq!(json, r#"{"a":1}"#);

    let restored: PersistentMap<String, i32> = serde_json::from_str(&json).unwrap();
    assert!(!restored.is_view());
    assert_eq!(restored, view);
}

// =============================================================================
// PersistentEntry Integration Tests
// =============================================================================

#[rstest]
fn test_entry_json_format() {
    let entry = PersistentEntry::new("k".to_string(), 7);
    let json = serde_json::to_string(&entry).unwrap();
    assert_eq!(json, r#"{"key":"k","value":7}"#);

    let restored: PersistentEntry<String, i32> = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, entry);
}

//! Construction entry points for sequences and maps.
//!
//! These functions are the preferred way to obtain collections. Empty
//! results are always the canonical empty instances.
//!
//! # Examples
//!
//! ```rust
//! use persistent_trie::persistent::factory;
//! use std::collections::HashMap;
//!
//! let sequence = factory::sequence_from_slice(&[1, 2, 3]);
//! assert_eq!(sequence.to_vec(), vec![1, 2, 3]);
//!
//! let plain: HashMap<&str, i32> = [("a", 1)].into_iter().collect();
//! let map = factory::map_from(&plain);
//! assert_eq!(map.get("a"), Some(&1));
//!
//! assert!(factory::empty_sequence::<i32>().ptr_eq(&factory::empty_sequence()));
//! ```

use std::collections::HashMap;
use std::hash::Hash;

use super::{PersistentHashMap, PersistentMap, PersistentVector};

/// Returns the canonical empty sequence.
#[inline]
#[must_use]
pub const fn empty_sequence<T>() -> PersistentVector<T> {
    PersistentVector::EMPTY
}

/// Returns the canonical empty map.
#[inline]
#[must_use]
pub const fn empty_map<K, V>() -> PersistentMap<K, V> {
    PersistentMap::Trie(PersistentHashMap::EMPTY)
}

/// Builds a sequence holding a copy of `elements`, in order.
#[must_use]
pub fn sequence_from_slice<T: Clone>(elements: &[T]) -> PersistentVector<T> {
    PersistentVector::from_slice(elements)
}

/// Builds a sequence by adding each element of `elements` in turn.
///
/// Works for iterators of unknown length; use
/// [`sequence_from_collection`] when the length is known up front.
#[must_use]
pub fn sequence_from_iter<T, I>(elements: I) -> PersistentVector<T>
where
    T: Clone,
    I: IntoIterator<Item = T>,
{
    PersistentVector::EMPTY.add_all(elements)
}

/// Builds a sequence from a sized collection in one bottom-up pass.
///
/// # Examples
///
/// ```rust
/// use persistent_trie::persistent::factory;
///
/// let sequence = factory::sequence_from_collection(vec!["x", "y"]);
/// assert_eq!(sequence.len(), 2);
/// assert_eq!(sequence.last(), Some(&"y"));
/// ```
#[must_use]
pub fn sequence_from_collection<T, C>(collection: C) -> PersistentVector<T>
where
    C: IntoIterator<Item = T>,
    C::IntoIter: ExactSizeIterator,
{
    collection.into_iter().collect()
}

/// Wraps a plain map in a lazily promoted view.
///
/// The map is copied once; an empty input yields the canonical empty map.
#[must_use]
pub fn map_from<K, V, S>(source: &HashMap<K, V, S>) -> PersistentMap<K, V>
where
    K: Clone + Hash + Eq,
    V: Clone,
{
    PersistentMap::from_std(source)
}

/// Returns a map holding the single binding `key -> value`.
#[must_use]
pub fn singleton_map<K, V>(key: K, value: V) -> PersistentMap<K, V>
where
    K: Clone + Hash + Eq,
    V: Clone + PartialEq,
{
    PersistentMap::Trie(PersistentHashMap::singleton(key, value))
}

//! The map capability shared by tries and lazy views.
//!
//! [`PersistentMap`] is what the construction functions hand out: either a
//! [`PersistentHashMap`] or a [`LazyMapView`] that has not been promoted
//! yet. Every operation dispatches to the wrapped variant; structural
//! changes on a view promote it and always yield the `Trie` variant.
//!
//! # Examples
//!
//! ```rust
//! use persistent_trie::persistent::PersistentMap;
//! use std::collections::HashMap;
//!
//! let plain: HashMap<&str, i32> = [("a", 1), ("b", 2)].into_iter().collect();
//! let map = PersistentMap::from_std(&plain);
//! assert!(map.is_view());
//!
//! let updated = map.put("c", 3);
//! assert!(!updated.is_view());
//! assert_eq!(updated.len(), 3);
//! assert_eq!(map, plain);
//! ```

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::iter::FromIterator;

use super::{
    LazyMapView, LazyMapViewIterator, PersistentEntry, PersistentHashMap,
    PersistentHashMapIterator, PersistentVector,
};
use crate::CollectionError;

/// A persistent map: a HAMT or a not-yet-promoted view over a plain map.
pub enum PersistentMap<K, V> {
    /// A hash array mapped trie
    Trie(PersistentHashMap<K, V>),
    /// A read-through view that promotes on the first structural change
    View(LazyMapView<K, V>),
}

impl<K, V> PersistentMap<K, V> {
    /// Returns the canonical empty map.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self::Trie(PersistentHashMap::EMPTY)
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Trie(map) => map.len(),
            Self::View(view) => view.len(),
        }
    }

    /// Returns `true` if the map has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` for the not-yet-promoted `View` variant.
    #[must_use]
    pub const fn is_view(&self) -> bool {
        matches!(self, Self::View(_))
    }

    /// Always fails: persistent maps have no hash code.
    ///
    /// # Errors
    ///
    /// Always returns [`CollectionError::UnsupportedOperation`].
    pub const fn try_hash(&self) -> Result<u64, CollectionError> {
        Err(CollectionError::UnsupportedOperation { operation: "hash" })
    }

    /// Returns an iterator over the entries.
    #[must_use]
    pub fn iter(&self) -> PersistentMapIterator<'_, K, V> {
        match self {
            Self::Trie(map) => PersistentMapIterator::Trie(map.iter()),
            Self::View(view) => PersistentMapIterator::View(view.iter()),
        }
    }
}

impl<K: Clone + Hash + Eq, V: Clone> PersistentMap<K, V> {
    /// Wraps a plain map without converting it.
    ///
    /// An empty input yields the canonical empty map.
    #[must_use]
    pub fn from_std<S>(source: &HashMap<K, V, S>) -> Self {
        if source.is_empty() {
            Self::new()
        } else {
            Self::View(LazyMapView::new(source))
        }
    }

    /// Returns every key as a persistent sequence.
    #[must_use]
    pub fn key_sequence(&self) -> PersistentVector<K> {
        match self {
            Self::Trie(map) => map.key_sequence(),
            Self::View(view) => view.key_sequence(),
        }
    }

    /// Returns every value as a persistent sequence.
    #[must_use]
    pub fn value_sequence(&self) -> PersistentVector<V> {
        match self {
            Self::Trie(map) => map.value_sequence(),
            Self::View(view) => view.value_sequence(),
        }
    }

    /// Returns every entry as a persistent sequence.
    #[must_use]
    pub fn entry_sequence(&self) -> PersistentVector<PersistentEntry<K, V>> {
        match self {
            Self::Trie(map) => map.entry_sequence(),
            Self::View(view) => view.entry_sequence(),
        }
    }
}

impl<K: Hash + Eq, V> PersistentMap<K, V> {
    /// Returns a reference to the value corresponding to the key.
    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self {
            Self::Trie(map) => map.get(key),
            Self::View(view) => view.get(key),
        }
    }

    /// Returns `true` if the map contains a value for the specified key.
    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key).is_some()
    }
}

impl<K: Clone + Hash + Eq, V: Clone + PartialEq> PersistentMap<K, V> {
    /// Converts into a trie, promoting a view if necessary.
    #[must_use]
    pub fn into_trie(self) -> PersistentHashMap<K, V> {
        match self {
            Self::Trie(map) => map,
            Self::View(view) => view.promoted(),
        }
    }

    /// Binds `key` to `value`.
    ///
    /// On a trie whose binding already holds an equal value, the same trie is
    /// returned.
    #[must_use]
    pub fn put(&self, key: K, value: V) -> Self {
        match self {
            Self::Trie(map) => Self::Trie(map.put(key, value)),
            Self::View(view) => Self::Trie(view.put(key, value)),
        }
    }

    /// Removes `key`.
    #[must_use]
    pub fn remove<Q>(&self, key: &Q) -> Self
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self {
            Self::Trie(map) => Self::Trie(map.remove(key)),
            Self::View(view) => Self::Trie(view.remove(key)),
        }
    }

    /// Adds every binding of `other`.
    #[must_use]
    pub fn put_all(&self, other: &Self) -> Self {
        match self {
            Self::Trie(map) => Self::Trie(map.put_all(other)),
            Self::View(view) => Self::Trie(view.promoted().put_all(other)),
        }
    }

    /// Adds every binding produced by `entries`.
    #[must_use]
    pub fn put_all_from<I>(&self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
    {
        match self {
            Self::Trie(map) => Self::Trie(map.put_all_from(entries)),
            Self::View(view) => Self::Trie(view.promoted().put_all_from(entries)),
        }
    }
}

// =============================================================================
// Iterator Implementation
// =============================================================================

/// An iterator over the entries of a [`PersistentMap`].
pub enum PersistentMapIterator<'a, K, V> {
    /// Iterating a trie
    Trie(PersistentHashMapIterator<'a, K, V>),
    /// Iterating a view
    View(LazyMapViewIterator<'a, K, V>),
}

impl<'a, K, V> Iterator for PersistentMapIterator<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Self::Trie(iterator) => iterator.next(),
            Self::View(iterator) => iterator.next(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            Self::Trie(iterator) => iterator.size_hint(),
            Self::View(iterator) => iterator.size_hint(),
        }
    }
}

impl<K, V> ExactSizeIterator for PersistentMapIterator<'_, K, V> {}

// =============================================================================
// Standard Trait Implementations
// =============================================================================

impl<K, V> Clone for PersistentMap<K, V> {
    fn clone(&self) -> Self {
        match self {
            Self::Trie(map) => Self::Trie(map.clone()),
            Self::View(view) => Self::View(view.clone()),
        }
    }
}

impl<K, V> Default for PersistentMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> From<PersistentHashMap<K, V>> for PersistentMap<K, V> {
    fn from(map: PersistentHashMap<K, V>) -> Self {
        Self::Trie(map)
    }
}

impl<K, V> From<LazyMapView<K, V>> for PersistentMap<K, V> {
    fn from(view: LazyMapView<K, V>) -> Self {
        Self::View(view)
    }
}

impl<K: Clone + Hash + Eq, V: Clone + PartialEq> FromIterator<(K, V)> for PersistentMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::Trie(iter.into_iter().collect())
    }
}

impl<'a, K, V> IntoIterator for &'a PersistentMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = PersistentMapIterator<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: Hash + Eq, V: PartialEq> PartialEq for PersistentMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Trie(left), Self::Trie(right)) => left == right,
            (Self::View(left), Self::View(right)) => left == right,
            _ => {
                self.len() == other.len()
                    && self
                        .iter()
                        .all(|(key, value)| other.get(key) == Some(value))
            }
        }
    }
}

impl<K: Hash + Eq, V: Eq> Eq for PersistentMap<K, V> {}

impl<K: Hash + Eq, V: PartialEq> PartialEq<PersistentHashMap<K, V>> for PersistentMap<K, V> {
    fn eq(&self, other: &PersistentHashMap<K, V>) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(key, value)| other.get(key) == Some(value))
    }
}

impl<K, V, S> PartialEq<HashMap<K, V, S>> for PersistentMap<K, V>
where
    K: Hash + Eq,
    V: PartialEq,
    S: BuildHasher,
{
    fn eq(&self, other: &HashMap<K, V, S>) -> bool {
        match self {
            Self::Trie(map) => map == other,
            Self::View(view) => view == other,
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for PersistentMap<K, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_map().entries(self.iter()).finish()
    }
}

// =============================================================================
// Serde Support
// =============================================================================

#[cfg(feature = "serde")]
impl<K: serde::Serialize, V: serde::Serialize> serde::Serialize for PersistentMap<K, V> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_map(self.iter())
    }
}

#[cfg(feature = "serde")]
impl<'de, K, V> serde::Deserialize<'de> for PersistentMap<K, V>
where
    K: serde::Deserialize<'de> + Clone + Hash + Eq,
    V: serde::Deserialize<'de> + Clone + PartialEq,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        <PersistentHashMap<K, V> as serde::Deserialize>::deserialize(deserializer).map(Self::Trie)
    }
}

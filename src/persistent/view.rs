//! Read-through view over an ordinary hash map with lazy promotion.
//!
//! [`LazyMapView`] wraps a defensive copy of a [`HashMap`] and answers every
//! read directly from that copy. The first structural change (`put` or
//! `remove`) promotes the copy into a [`PersistentHashMap`], which is then
//! memoized in a promotion slot shared by all clones of the view.
//!
//! # Examples
//!
//! ```rust
//! use persistent_trie::persistent::LazyMapView;
//! use std::collections::HashMap;
//!
//! let source: HashMap<&str, i32> = [("a", 1), ("b", 2)].into_iter().collect();
//! let view = LazyMapView::new(&source);
//! assert_eq!(view.get("a"), Some(&1));
//! assert!(!view.is_promoted());
//!
//! let updated = view.put("c", 3);
//! assert_eq!(updated.len(), 3);
//! assert_eq!(view.len(), 2);
//! assert!(view.is_promoted());
//! ```
//!
//! # Retention
//!
//! The slot keeps the promoted map according to its [`Retention`]:
//!
//! - [`Retention::Strong`] keeps it until [`LazyMapView::reclaim`] is called
//! - [`Retention::Weak`] keeps only a weak handle, so the promoted map is
//!   released as soon as no caller holds it any more
//!
//! Either way a missing map is rebuilt from the defensive copy on demand, and
//! the rebuilt map is equal to every earlier one.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::collections::hash_map;
use std::fmt;
use std::hash::{BuildHasher, Hash};

use parking_lot::RwLock;
use tracing::{debug, trace};

use super::hashmap::WeakHashMap;
use super::{KeyHasher, PersistentEntry, PersistentHashMap, PersistentVector, ReferenceCounter};

/// How a [`LazyMapView`] holds on to its promoted map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Retention {
    /// Keep the promoted map until [`LazyMapView::reclaim`] is called.
    #[default]
    Strong,
    /// Keep a weak handle; the map is dropped with its last outside owner.
    Weak,
}

/// Content of the promotion slot.
enum Cached<K, V> {
    Vacant,
    Strong(PersistentHashMap<K, V>),
    Weak(WeakHashMap<K, V>),
}

/// Memoized promotion result, shared by every clone of one view.
struct PromotionSlot<K, V> {
    retention: Retention,
    cached: RwLock<Cached<K, V>>,
}

impl<K, V> PromotionSlot<K, V> {
    fn new(retention: Retention) -> Self {
        Self {
            retention,
            cached: RwLock::new(Cached::Vacant),
        }
    }

    fn load(&self) -> Option<PersistentHashMap<K, V>> {
        match &*self.cached.read() {
            Cached::Vacant => None,
            Cached::Strong(map) => Some(map.clone()),
            Cached::Weak(handle) => {
                let map = handle.upgrade();
                if map.is_none() {
                    debug!("promoted map was reclaimed, rebuilding");
                }
                map
            }
        }
    }

    fn store(&self, map: &PersistentHashMap<K, V>) {
        let cached = match self.retention {
            Retention::Strong => Cached::Strong(map.clone()),
            Retention::Weak => Cached::Weak(map.downgrade()),
        };
        *self.cached.write() = cached;
    }

    fn clear(&self) -> bool {
        let previous = std::mem::replace(&mut *self.cached.write(), Cached::Vacant);
        !matches!(previous, Cached::Vacant)
    }

    fn is_live(&self) -> bool {
        match &*self.cached.read() {
            Cached::Vacant => false,
            Cached::Strong(_) => true,
            Cached::Weak(handle) => handle.upgrade().is_some(),
        }
    }
}

/// A read-only map that promotes itself to a [`PersistentHashMap`] on the
/// first structural change.
///
/// Clones share both the defensive copy and the promotion slot, so a map
/// promoted through one clone is reused by all of them.
pub struct LazyMapView<K, V> {
    source: ReferenceCounter<HashMap<K, V, KeyHasher>>,
    promotion: ReferenceCounter<PromotionSlot<K, V>>,
}

impl<K: Clone + Hash + Eq, V: Clone> LazyMapView<K, V> {
    /// Wraps a copy of `source` with [`Retention::Strong`].
    ///
    /// Later changes to `source` are not visible through the view.
    #[must_use]
    pub fn new<S>(source: &HashMap<K, V, S>) -> Self {
        Self::with_retention(source, Retention::default())
    }

    /// Wraps a copy of `source` with the given retention policy.
    #[must_use]
    pub fn with_retention<S>(source: &HashMap<K, V, S>, retention: Retention) -> Self {
        let copy: HashMap<K, V, KeyHasher> = source
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        Self {
            source: ReferenceCounter::new(copy),
            promotion: ReferenceCounter::new(PromotionSlot::new(retention)),
        }
    }
}

impl<K, V> LazyMapView<K, V> {
    /// Returns the number of entries.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.source.len()
    }

    /// Returns `true` if the view has no entries.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    /// Returns the retention policy of the promotion slot.
    #[must_use]
    pub fn retention(&self) -> Retention {
        self.promotion.retention
    }

    /// Returns an iterator over the entries of the wrapped copy.
    #[must_use]
    pub fn iter(&self) -> LazyMapViewIterator<'_, K, V> {
        LazyMapViewIterator {
            inner: self.source.iter(),
        }
    }

    /// Returns `true` if the promotion slot currently holds a live map.
    #[must_use]
    pub fn is_promoted(&self) -> bool {
        self.promotion.is_live()
    }

    /// Drops the memoized promoted map, if any.
    ///
    /// Callers that still hold the promoted map keep it; the view rebuilds a
    /// new one on the next promotion.
    pub fn reclaim(&self) {
        if self.promotion.clear() {
            debug!(entries = self.source.len(), "reclaimed promoted map");
        }
    }
}

impl<K: Hash + Eq, V> LazyMapView<K, V> {
    /// Returns a reference to the value corresponding to the key.
    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.source.get(key)
    }

    /// Returns `true` if the view contains a value for the specified key.
    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.source.contains_key(key)
    }
}

impl<K: Clone, V: Clone> LazyMapView<K, V> {
    /// Returns every key as a persistent sequence.
    #[must_use]
    pub fn key_sequence(&self) -> PersistentVector<K> {
        self.source.keys().cloned().collect()
    }

    /// Returns every value as a persistent sequence.
    #[must_use]
    pub fn value_sequence(&self) -> PersistentVector<V> {
        self.source.values().cloned().collect()
    }

    /// Returns every entry as a persistent sequence.
    #[must_use]
    pub fn entry_sequence(&self) -> PersistentVector<PersistentEntry<K, V>> {
        self.source
            .iter()
            .map(|(key, value)| PersistentEntry::new(key.clone(), value.clone()))
            .collect()
    }
}

impl<K: Clone + Hash + Eq, V: Clone + PartialEq> LazyMapView<K, V> {
    /// Returns the promoted map, building it on first use.
    ///
    /// Concurrent callers may each build a map; all results are equal and the
    /// last one stored wins the slot.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_trie::persistent::LazyMapView;
    /// use std::collections::HashMap;
    ///
    /// let source: HashMap<i32, i32> = (0..10).map(|index| (index, index)).collect();
    /// let view = LazyMapView::new(&source);
    ///
    /// let first = view.promoted();
    /// let second = view.promoted();
    /// assert!(first.ptr_eq(&second));
    /// assert_eq!(first, source);
    /// ```
    #[must_use]
    pub fn promoted(&self) -> PersistentHashMap<K, V> {
        if let Some(map) = self.promotion.load() {
            trace!(entries = map.len(), "promotion cache hit");
            return map;
        }

        let map: PersistentHashMap<K, V> = self
            .source
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        debug!(
            entries = map.len(),
            retention = ?self.promotion.retention,
            "promoted lazy map view"
        );
        self.promotion.store(&map);
        map
    }

    /// Promotes the view and binds `key` to `value` in the result.
    #[must_use]
    pub fn put(&self, key: K, value: V) -> PersistentHashMap<K, V> {
        self.promoted().put(key, value)
    }

    /// Promotes the view and removes `key` from the result.
    #[must_use]
    pub fn remove<Q>(&self, key: &Q) -> PersistentHashMap<K, V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.promoted().remove(key)
    }
}

// =============================================================================
// Iterator Implementation
// =============================================================================

/// An iterator over the entries of a [`LazyMapView`].
pub struct LazyMapViewIterator<'a, K, V> {
    inner: hash_map::Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for LazyMapViewIterator<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for LazyMapViewIterator<'_, K, V> {}

// =============================================================================
// Standard Trait Implementations
// =============================================================================

impl<K, V> Clone for LazyMapView<K, V> {
    fn clone(&self) -> Self {
        Self {
            source: ReferenceCounter::clone(&self.source),
            promotion: ReferenceCounter::clone(&self.promotion),
        }
    }
}

impl<'a, K, V> IntoIterator for &'a LazyMapView<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = LazyMapViewIterator<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: Hash + Eq, V: PartialEq> PartialEq for LazyMapView<K, V> {
    fn eq(&self, other: &Self) -> bool {
        ReferenceCounter::ptr_eq(&self.source, &other.source) || *self.source == *other.source
    }
}

impl<K: Hash + Eq, V: Eq> Eq for LazyMapView<K, V> {}

impl<K, V, S> PartialEq<HashMap<K, V, S>> for LazyMapView<K, V>
where
    K: Hash + Eq,
    V: PartialEq,
    S: BuildHasher,
{
    fn eq(&self, other: &HashMap<K, V, S>) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(key, value)| other.get(key) == Some(value))
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for LazyMapView<K, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_map().entries(self.iter()).finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

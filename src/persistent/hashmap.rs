//! Persistent (immutable) hash map based on HAMT.
//!
//! This module provides [`PersistentHashMap`], an immutable hash map
//! that uses structural sharing for efficient operations.
//!
//! # Overview
//!
//! `PersistentHashMap` is a Hash Array Mapped Trie: a 32-way branching trie
//! navigated by successive 5-bit groups of the key hash.
//!
//! - O(log32 N) get, put and remove (effectively O(1) for practical sizes)
//! - O(1) len and `is_empty`
//!
//! # Examples
//!
//! ```rust
//! use persistent_trie::persistent::PersistentHashMap;
//!
//! let map = PersistentHashMap::new()
//!     .put("one".to_string(), 1)
//!     .put("two".to_string(), 2);
//!
//! assert_eq!(map.get("one"), Some(&1));
//! assert_eq!(map.get("three"), None);
//!
//! // Structural sharing: the original map is preserved
//! let updated = map.put("one".to_string(), 100);
//! assert_eq!(map.get("one"), Some(&1));
//! assert_eq!(updated.get("one"), Some(&100));
//! ```
//!
//! # Internal Structure
//!
//! - Bitmap-indexed nodes whose slot arrays hold exactly the occupied slots,
//!   each slot being an inline leaf or a child node
//! - Collision nodes for keys whose full 64-bit hashes are identical,
//!   created only once every hash bit has been consumed
//! - The empty map has no root at all

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::iter::FromIterator;

use smallvec::SmallVec;
use tracing::trace;

use super::node::{self, BITS_PER_LEVEL, HASH_BITS};
use super::{PersistentEntry, PersistentVector, ReferenceCounter, WeakReferenceCounter};
use crate::CollectionError;

/// Upper bound on the trie depth: 13 bitmap levels plus a collision node.
const MAX_DEPTH: usize = HASH_BITS.div_ceil(BITS_PER_LEVEL) + 1;

// =============================================================================
// Node Definition
// =============================================================================

/// A key-value pair stored inline together with the key hash.
#[derive(Clone)]
struct Leaf<K, V> {
    hash: u64,
    key: K,
    value: V,
}

/// A slot of a bitmap node.
#[derive(Clone)]
enum Slot<K, V> {
    /// An inline entry
    Leaf(Leaf<K, V>),
    /// A sub-node one level deeper
    Node(ReferenceCounter<Node<K, V>>),
}

/// Internal node structure for the HAMT.
enum Node<K, V> {
    /// Bitmap-indexed branch; `slots.len() == bitmap.count_ones()`
    Bitmap {
        bitmap: u32,
        slots: ReferenceCounter<[Slot<K, V>]>,
    },
    /// Two or more entries sharing one full hash
    Collision {
        hash: u64,
        entries: ReferenceCounter<[Leaf<K, V>]>,
    },
}

impl<K, V> Node<K, V> {
    fn single(leaf: Leaf<K, V>, shift: usize) -> Self {
        Self::Bitmap {
            bitmap: node::bit_for(leaf.hash, shift),
            slots: ReferenceCounter::from(vec![Slot::Leaf(leaf)]),
        }
    }
}

/// Outcome of removing a key from a subtree.
enum Removal<K, V> {
    /// The key was not present; nothing changed
    Absent,
    /// The subtree became empty and must be pruned
    Emptied,
    /// Only one entry is left; the parent stores it inline
    Collapsed(Leaf<K, V>),
    /// The subtree was rebuilt along the path
    Updated(ReferenceCounter<Node<K, V>>),
}

// =============================================================================
// PersistentHashMap Definition
// =============================================================================

/// A persistent (immutable) hash map based on HAMT.
///
/// # Time Complexity
///
/// | Operation      | Complexity        |
/// |----------------|-------------------|
/// | `new`          | O(1)              |
/// | `get`          | O(log32 N)        |
/// | `put`          | O(log32 N)        |
/// | `remove`       | O(log32 N)        |
/// | `contains_key` | O(log32 N)        |
/// | `len`          | O(1)              |
///
/// Maps deliberately do not implement [`Hash`]: there is no hash function
/// compatible with their value equality that does not depend on bucket
/// layout. See [`try_hash`](Self::try_hash).
///
/// # Examples
///
/// ```rust
/// use persistent_trie::persistent::PersistentHashMap;
///
/// let map = PersistentHashMap::singleton("key".to_string(), 42);
/// assert_eq!(map.get("key"), Some(&42));
/// ```
pub struct PersistentHashMap<K, V> {
    /// Root node of the trie, absent for the empty map
    root: Option<ReferenceCounter<Node<K, V>>>,
    /// Number of entries
    length: usize,
}

impl<K, V> PersistentHashMap<K, V> {
    /// The canonical empty map.
    pub const EMPTY: Self = Self {
        root: None,
        length: 0,
    };

    /// Creates a new empty map.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_trie::persistent::PersistentHashMap;
    ///
    /// let map: PersistentHashMap<String, i32> = PersistentHashMap::new();
    /// assert!(map.is_empty());
    /// ```
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self::EMPTY
    }

    /// Builds a non-empty map from its root.
    fn assemble(root: ReferenceCounter<Node<K, V>>, length: usize) -> Self {
        debug_assert!(
            length > 0,
            "{}",
            CollectionError::IllegalConstruction { structure: "map" }
        );
        Self {
            root: Some(root),
            length,
        }
    }

    /// Returns the number of entries in the map.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.length
    }

    /// Returns `true` if the map contains no entries.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Returns `true` if both maps share the same root node.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_trie::persistent::PersistentHashMap;
    ///
    /// let map = PersistentHashMap::singleton("key", 1);
    /// assert!(map.put("key", 1).ptr_eq(&map));
    /// assert!(!map.put("key", 2).ptr_eq(&map));
    /// ```
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.length == other.length && node::same_node(self.root.as_ref(), other.root.as_ref())
    }

    /// Always fails: persistent maps have no hash code.
    ///
    /// # Errors
    ///
    /// Always returns [`CollectionError::UnsupportedOperation`]. Maps must not
    /// be used as keys of hash-based containers.
    pub const fn try_hash(&self) -> Result<u64, CollectionError> {
        Err(CollectionError::UnsupportedOperation { operation: "hash" })
    }

    /// Returns an iterator over the entries in bucket order.
    ///
    /// The order is deterministic for one structural history but is not
    /// guaranteed to match between equal maps built differently.
    #[must_use]
    pub fn iter(&self) -> PersistentHashMapIterator<'_, K, V> {
        let mut stack = SmallVec::new();
        if let Some(root) = &self.root {
            stack.push(Cursor::of(root));
        }
        PersistentHashMapIterator {
            stack,
            remaining: self.length,
        }
    }

    /// Returns an iterator over the keys in bucket order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.iter().map(|(key, _)| key)
    }

    /// Returns an iterator over the values in bucket order.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, value)| value)
    }

    /// Returns a weak handle that does not keep the root alive.
    pub(crate) fn downgrade(&self) -> WeakHashMap<K, V> {
        WeakHashMap {
            root: self.root.as_ref().map(ReferenceCounter::downgrade),
            length: self.length,
        }
    }
}

impl<K: Hash + Eq, V> PersistentHashMap<K, V> {
    /// Returns a reference to the value corresponding to the key.
    ///
    /// A missing key yields `None`; lookups never fail. The key may be any
    /// borrowed form of the map's key type.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_trie::persistent::PersistentHashMap;
    ///
    /// let map = PersistentHashMap::new().put("hello".to_string(), 42);
    /// assert_eq!(map.get("hello"), Some(&42));
    /// assert_eq!(map.get("world"), None);
    /// ```
    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = node::hash_key(key);
        let mut current = self.root.as_deref()?;
        let mut shift = 0;

        loop {
            match current {
                Node::Bitmap { bitmap, slots } => {
                    let bit = node::bit_for(hash, shift);
                    if bitmap & bit == 0 {
                        return None;
                    }
                    match &slots[node::sparse_index(*bitmap, bit)] {
                        Slot::Leaf(leaf) => {
                            return (leaf.hash == hash && leaf.key.borrow() == key)
                                .then_some(&leaf.value);
                        }
                        Slot::Node(child) => {
                            current = &**child;
                            shift += BITS_PER_LEVEL;
                        }
                    }
                }
                Node::Collision {
                    hash: collision_hash,
                    entries,
                } => {
                    if *collision_hash != hash {
                        return None;
                    }
                    return entries
                        .iter()
                        .find(|leaf| leaf.key.borrow() == key)
                        .map(|leaf| &leaf.value);
                }
            }
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

impl<K: Clone + Hash + Eq, V: Clone> PersistentHashMap<K, V> {
    /// Removes a key from the map.
    ///
    /// Nodes emptied by the removal are pruned all the way up; removing the
    /// last entry returns [`Self::EMPTY`]. Removing an absent key returns the
    /// map unchanged.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_trie::persistent::PersistentHashMap;
    ///
    /// let map = PersistentHashMap::new().put("a", 1).put("b", 2);
    /// let removed = map.remove("a");
    ///
    /// assert_eq!(map.len(), 2);
    /// assert_eq!(removed.len(), 1);
    /// assert_eq!(removed.get("a"), None);
    /// assert!(removed.remove("a").ptr_eq(&removed));
    /// ```
    #[must_use]
    pub fn remove<Q>(&self, key: &Q) -> Self
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let Some(root) = &self.root else {
            return Self::EMPTY;
        };
        let hash = node::hash_key(key);

        match Self::remove_from(root, 0, hash, key) {
            Removal::Absent => self.clone(),
            Removal::Emptied => Self::EMPTY,
            Removal::Collapsed(leaf) => {
                Self::assemble(ReferenceCounter::new(Node::single(leaf, 0)), self.length - 1)
            }
            Removal::Updated(root) => Self::assemble(root, self.length - 1),
        }
    }

    fn remove_from<Q>(node: &Node<K, V>, shift: usize, hash: u64, key: &Q) -> Removal<K, V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match node {
            Node::Bitmap { bitmap, slots } => {
                let bit = node::bit_for(hash, shift);
                if bitmap & bit == 0 {
                    return Removal::Absent;
                }
                let position = node::sparse_index(*bitmap, bit);

                match &slots[position] {
                    Slot::Leaf(leaf) => {
                        if leaf.hash == hash && leaf.key.borrow() == key {
                            Self::without_slot(*bitmap, slots, bit, position)
                        } else {
                            Removal::Absent
                        }
                    }
                    Slot::Node(child) => {
                        match Self::remove_from(child, shift + BITS_PER_LEVEL, hash, key) {
                            Removal::Absent => Removal::Absent,
                            Removal::Emptied => Self::without_slot(*bitmap, slots, bit, position),
                            Removal::Collapsed(leaf) if slots.len() == 1 => {
                                Removal::Collapsed(leaf)
                            }
                            Removal::Collapsed(leaf) => Removal::Updated(ReferenceCounter::new(
                                Node::Bitmap {
                                    bitmap: *bitmap,
                                    slots: node::replaced(slots, position, Slot::Leaf(leaf)),
                                },
                            )),
                            Removal::Updated(child) => Removal::Updated(ReferenceCounter::new(
                                Node::Bitmap {
                                    bitmap: *bitmap,
                                    slots: node::replaced(slots, position, Slot::Node(child)),
                                },
                            )),
                        }
                    }
                }
            }
            Node::Collision {
                hash: collision_hash,
                entries,
            } => {
                if *collision_hash != hash {
                    return Removal::Absent;
                }
                let Some(position) = entries.iter().position(|leaf| leaf.key.borrow() == key)
                else {
                    return Removal::Absent;
                };
                match entries.len() {
                    1 => Removal::Emptied,
                    2 => Removal::Collapsed(entries[1 - position].clone()),
                    _ => Removal::Updated(ReferenceCounter::new(Node::Collision {
                        hash: *collision_hash,
                        entries: node::removed(entries, position),
                    })),
                }
            }
        }
    }

    /// Drops the slot at `position`, pruning the node if it becomes empty.
    fn without_slot(
        bitmap: u32,
        slots: &[Slot<K, V>],
        bit: u32,
        position: usize,
    ) -> Removal<K, V> {
        let bitmap = bitmap & !bit;
        if bitmap == 0 {
            return Removal::Emptied;
        }
        let slots = node::removed(slots, position);
        if let [Slot::Leaf(leaf)] = &*slots {
            return Removal::Collapsed(leaf.clone());
        }
        Removal::Updated(ReferenceCounter::new(Node::Bitmap { bitmap, slots }))
    }

    /// Returns every key as a persistent sequence, in bucket order.
    #[must_use]
    pub fn key_sequence(&self) -> PersistentVector<K> {
        self.keys().cloned().collect()
    }

    /// Returns every value as a persistent sequence, in bucket order.
    #[must_use]
    pub fn value_sequence(&self) -> PersistentVector<V> {
        self.values().cloned().collect()
    }

    /// Returns every entry as a persistent sequence, in bucket order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_trie::persistent::{PersistentEntry, PersistentHashMap};
    ///
    /// let map = PersistentHashMap::singleton("a", 1);
    /// let entries = map.entry_sequence();
    /// assert_eq!(entries.get(0), Ok(&PersistentEntry::new("a", 1)));
    /// ```
    #[must_use]
    pub fn entry_sequence(&self) -> PersistentVector<PersistentEntry<K, V>> {
        self.iter()
            .map(|(key, value)| PersistentEntry::new(key.clone(), value.clone()))
            .collect()
    }
}

impl<K: Clone + Hash + Eq, V: Clone + PartialEq> PersistentHashMap<K, V> {
    /// Creates a map containing a single key-value pair.
    #[inline]
    #[must_use]
    pub fn singleton(key: K, value: V) -> Self {
        Self::new().put(key, value)
    }

    /// Binds `key` to `value`.
    ///
    /// If the key is already bound to an equal value, the map is returned
    /// unchanged and no path is copied.
    ///
    /// # Complexity
    ///
    /// O(log32 N)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_trie::persistent::PersistentHashMap;
    ///
    /// let map1 = PersistentHashMap::new().put("key".to_string(), 1);
    /// let map2 = map1.put("key".to_string(), 2);
    ///
    /// assert_eq!(map1.get("key"), Some(&1)); // Original unchanged
    /// assert_eq!(map2.get("key"), Some(&2)); // New version
    /// assert_eq!(map2.len(), 1);
    /// ```
    #[must_use]
    pub fn put(&self, key: K, value: V) -> Self {
        let hash = node::hash_key(&key);
        let leaf = Leaf { hash, key, value };

        match &self.root {
            None => Self::assemble(ReferenceCounter::new(Node::single(leaf, 0)), 1),
            Some(root) => match Self::put_into(root, 0, leaf) {
                None => self.clone(),
                Some((root, added)) => Self::assemble(root, self.length + usize::from(added)),
            },
        }
    }

    /// Returns the rebuilt node and whether a new key was added, or `None`
    /// when the binding already existed with an equal value.
    fn put_into(
        node: &Node<K, V>,
        shift: usize,
        leaf: Leaf<K, V>,
    ) -> Option<(ReferenceCounter<Node<K, V>>, bool)> {
        match node {
            Node::Bitmap { bitmap, slots } => {
                let bit = node::bit_for(leaf.hash, shift);
                let position = node::sparse_index(*bitmap, bit);

                if bitmap & bit == 0 {
                    let slots = node::inserted(slots, position, Slot::Leaf(leaf));
                    let node = Node::Bitmap {
                        bitmap: bitmap | bit,
                        slots,
                    };
                    return Some((ReferenceCounter::new(node), true));
                }

                let (slot, added) = match &slots[position] {
                    Slot::Leaf(existing) if existing.hash == leaf.hash && existing.key == leaf.key => {
                        if existing.value == leaf.value {
                            return None;
                        }
                        (Slot::Leaf(leaf), false)
                    }
                    Slot::Leaf(existing) => (
                        Slot::Node(Self::pair(
                            shift + BITS_PER_LEVEL,
                            existing.clone(),
                            leaf,
                        )),
                        true,
                    ),
                    Slot::Node(child) => {
                        let (child, added) = Self::put_into(child, shift + BITS_PER_LEVEL, leaf)?;
                        (Slot::Node(child), added)
                    }
                };

                let node = Node::Bitmap {
                    bitmap: *bitmap,
                    slots: node::replaced(slots, position, slot),
                };
                Some((ReferenceCounter::new(node), added))
            }
            Node::Collision { hash, entries } => {
                debug_assert_eq!(*hash, leaf.hash);
                match entries.iter().position(|existing| existing.key == leaf.key) {
                    Some(position) if entries[position].value == leaf.value => None,
                    Some(position) => {
                        let node = Node::Collision {
                            hash: *hash,
                            entries: node::replaced(entries, position, leaf),
                        };
                        Some((ReferenceCounter::new(node), false))
                    }
                    None => {
                        let node = Node::Collision {
                            hash: *hash,
                            entries: node::pushed(entries, leaf),
                        };
                        Some((ReferenceCounter::new(node), true))
                    }
                }
            }
        }
    }

    /// Builds the smallest subtree at `shift` holding two distinct keys.
    fn pair(shift: usize, first: Leaf<K, V>, second: Leaf<K, V>) -> ReferenceCounter<Node<K, V>> {
        if shift >= HASH_BITS {
            trace!(hash = first.hash, "creating collision node");
            return ReferenceCounter::new(Node::Collision {
                hash: first.hash,
                entries: ReferenceCounter::from(vec![first, second]),
            });
        }

        let first_bit = node::bit_for(first.hash, shift);
        let second_bit = node::bit_for(second.hash, shift);

        let node = if first_bit == second_bit {
            Node::Bitmap {
                bitmap: first_bit,
                slots: ReferenceCounter::from(vec![Slot::Node(Self::pair(
                    shift + BITS_PER_LEVEL,
                    first,
                    second,
                ))]),
            }
        } else {
            let slots = if first_bit < second_bit {
                vec![Slot::Leaf(first), Slot::Leaf(second)]
            } else {
                vec![Slot::Leaf(second), Slot::Leaf(first)]
            };
            Node::Bitmap {
                bitmap: first_bit | second_bit,
                slots: ReferenceCounter::from(slots),
            }
        };
        ReferenceCounter::new(node)
    }

    /// Adds every borrowed binding of `other`, one [`put`](Self::put) at a time.
    ///
    /// `other` may be a `&PersistentHashMap`, a `&PersistentMap` or a
    /// `&HashMap`; later bindings win.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_trie::persistent::PersistentHashMap;
    ///
    /// let left = PersistentHashMap::new().put("a", 1).put("b", 2);
    /// let right = PersistentHashMap::new().put("b", 20).put("c", 30);
    /// let merged = left.put_all(&right);
    ///
    /// assert_eq!(merged.len(), 3);
    /// assert_eq!(merged.get("b"), Some(&20));
    /// ```
    #[must_use]
    pub fn put_all<'a, I>(&self, other: I) -> Self
    where
        I: IntoIterator<Item = (&'a K, &'a V)>,
        K: 'a,
        V: 'a,
    {
        other.into_iter().fold(self.clone(), |map, (key, value)| {
            map.put(key.clone(), value.clone())
        })
    }

    /// Adds every binding produced by `entries`, one [`put`](Self::put) at a time.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_trie::persistent::PersistentHashMap;
    /// use std::collections::HashMap;
    ///
    /// let plain: HashMap<&str, i32> = [("a", 1), ("b", 2)].into_iter().collect();
    /// let map = PersistentHashMap::singleton("c", 3).put_all_from(plain);
    /// assert_eq!(map.len(), 3);
    /// ```
    #[must_use]
    pub fn put_all_from<I>(&self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
    {
        entries
            .into_iter()
            .fold(self.clone(), |map, (key, value)| map.put(key, value))
    }
}

// =============================================================================
// Weak handle
// =============================================================================

/// A non-owning handle to a map root, used by reclaimable caches.
pub(crate) struct WeakHashMap<K, V> {
    root: Option<WeakReferenceCounter<Node<K, V>>>,
    length: usize,
}

impl<K, V> WeakHashMap<K, V> {
    /// Returns the map if its root is still alive.
    pub(crate) fn upgrade(&self) -> Option<PersistentHashMap<K, V>> {
        match &self.root {
            None => Some(PersistentHashMap::EMPTY),
            Some(root) => root.upgrade().map(|root| PersistentHashMap {
                root: Some(root),
                length: self.length,
            }),
        }
    }
}

// =============================================================================
// Iterator Implementation
// =============================================================================

/// Traversal position inside one node.
enum Cursor<'a, K, V> {
    Slots(std::slice::Iter<'a, Slot<K, V>>),
    Collision(std::slice::Iter<'a, Leaf<K, V>>),
}

/// Result of advancing a cursor by one slot.
enum Step<'a, K, V> {
    Entry(&'a Leaf<K, V>),
    Descend(&'a Node<K, V>),
    Exhausted,
}

impl<'a, K, V> Cursor<'a, K, V> {
    fn of(node: &'a Node<K, V>) -> Self {
        match node {
            Node::Bitmap { slots, .. } => Self::Slots(slots.iter()),
            Node::Collision { entries, .. } => Self::Collision(entries.iter()),
        }
    }

    fn advance(&mut self) -> Step<'a, K, V> {
        match self {
            Self::Slots(slots) => match slots.next() {
                Some(Slot::Leaf(leaf)) => Step::Entry(leaf),
                Some(Slot::Node(child)) => Step::Descend(&**child),
                None => Step::Exhausted,
            },
            Self::Collision(entries) => entries.next().map_or(Step::Exhausted, Step::Entry),
        }
    }
}

/// An iterator over the entries of a [`PersistentHashMap`], depth-first in
/// bitmap order.
pub struct PersistentHashMapIterator<'a, K, V> {
    stack: SmallVec<[Cursor<'a, K, V>; MAX_DEPTH]>,
    remaining: usize,
}

impl<'a, K, V> Iterator for PersistentHashMapIterator<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.stack.last_mut()?.advance() {
                Step::Entry(leaf) => {
                    self.remaining -= 1;
                    return Some((&leaf.key, &leaf.value));
                }
                Step::Descend(child) => self.stack.push(Cursor::of(child)),
                Step::Exhausted => {
                    self.stack.pop();
                }
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for PersistentHashMapIterator<'_, K, V> {
    fn len(&self) -> usize {
        self.remaining
    }
}

/// An owning iterator over the entries of a [`PersistentHashMap`].
pub struct PersistentHashMapIntoIterator<K, V> {
    entries: std::vec::IntoIter<(K, V)>,
}

impl<K, V> Iterator for PersistentHashMapIntoIterator<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.entries.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}

impl<K, V> ExactSizeIterator for PersistentHashMapIntoIterator<K, V> {}

// =============================================================================
// Standard Trait Implementations
// =============================================================================

impl<K, V> Clone for PersistentHashMap<K, V> {
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
            length: self.length,
        }
    }
}

impl<K, V> Default for PersistentHashMap<K, V> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone + Hash + Eq, V: Clone + PartialEq> FromIterator<(K, V)> for PersistentHashMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::new().put_all_from(iter)
    }
}

impl<K: Clone + Hash + Eq, V: Clone + PartialEq> FromIterator<PersistentEntry<K, V>>
    for PersistentHashMap<K, V>
{
    fn from_iter<I: IntoIterator<Item = PersistentEntry<K, V>>>(iter: I) -> Self {
        Self::new().put_all_from(iter.into_iter().map(PersistentEntry::into_pair))
    }
}

impl<K: Clone, V: Clone> IntoIterator for PersistentHashMap<K, V> {
    type Item = (K, V);
    type IntoIter = PersistentHashMapIntoIterator<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        let entries: Vec<(K, V)> = self
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        PersistentHashMapIntoIterator {
            entries: entries.into_iter(),
        }
    }
}

impl<'a, K, V> IntoIterator for &'a PersistentHashMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = PersistentHashMapIterator<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: Hash + Eq, V: PartialEq> PartialEq for PersistentHashMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        if self.length != other.length {
            return false;
        }
        self.ptr_eq(other)
            || self
                .iter()
                .all(|(key, value)| other.get(key) == Some(value))
    }
}

impl<K: Hash + Eq, V: Eq> Eq for PersistentHashMap<K, V> {}

impl<K, V, S> PartialEq<HashMap<K, V, S>> for PersistentHashMap<K, V>
where
    K: Hash + Eq,
    V: PartialEq,
    S: BuildHasher,
{
    fn eq(&self, other: &HashMap<K, V, S>) -> bool {
        self.length == other.len()
            && self
                .iter()
                .all(|(key, value)| other.get(key) == Some(value))
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for PersistentHashMap<K, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_map().entries(self.iter()).finish()
    }
}

// =============================================================================
// Serde Support
// =============================================================================

#[cfg(feature = "serde")]
impl<K: serde::Serialize, V: serde::Serialize> serde::Serialize for PersistentHashMap<K, V> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_map(self.iter())
    }
}

#[cfg(feature = "serde")]
struct PersistentHashMapVisitor<K, V> {
    marker: std::marker::PhantomData<(K, V)>,
}

#[cfg(feature = "serde")]
impl<'de, K, V> serde::de::Visitor<'de> for PersistentHashMapVisitor<K, V>
where
    K: serde::Deserialize<'de> + Clone + Hash + Eq,
    V: serde::Deserialize<'de> + Clone + PartialEq,
{
    type Value = PersistentHashMap<K, V>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map")
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: serde::de::MapAccess<'de>,
    {
        let mut map = PersistentHashMap::new();
        while let Some((key, value)) = access.next_entry()? {
            map = map.put(key, value);
        }
        Ok(map)
    }
}

#[cfg(feature = "serde")]
impl<'de, K, V> serde::Deserialize<'de> for PersistentHashMap<K, V>
where
    K: serde::Deserialize<'de> + Clone + Hash + Eq,
    V: serde::Deserialize<'de> + Clone + PartialEq,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_map(PersistentHashMapVisitor {
            marker: std::marker::PhantomData,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::hash::Hasher;

    /// Key whose hash only depends on `bucket`, forcing full-hash collisions.
    #[derive(Clone, Debug, PartialEq, Eq)]
    struct CollidingKey {
        identifier: u32,
        bucket: u32,
    }

    impl Hash for CollidingKey {
        fn hash<H: Hasher>(&self, state: &mut H) {
            self.bucket.hash(state);
        }
    }

    const fn colliding(identifier: u32) -> CollidingKey {
        CollidingKey {
            identifier,
            bucket: 0,
        }
    }

    fn depth_of<K, V>(node: &Node<K, V>) -> usize {
        match node {
            Node::Bitmap { slots, .. } => {
                1 + slots
                    .iter()
                    .map(|slot| match slot {
                        Slot::Leaf(_) => 0,
                        Slot::Node(child) => depth_of(child),
                    })
                    .max()
                    .unwrap_or(0)
            }
            Node::Collision { .. } => 1,
        }
    }

    #[rstest]
    fn test_new_creates_empty() {
        let map: PersistentHashMap<String, i32> = PersistentHashMap::new();
        assert!(map.is_empty());
        assert!(map.root.is_none());
        assert!(map.ptr_eq(&PersistentHashMap::EMPTY));
    }

    #[rstest]
    fn test_put_existing_equal_value_is_identity() {
        let map = PersistentHashMap::new().put("a", 1).put("b", 2);
        let same = map.put("a", 1);
        assert!(same.ptr_eq(&map));
    }

    #[rstest]
    fn test_full_hash_collisions_reach_collision_node() {
        let map = PersistentHashMap::new()
            .put(colliding(1), "one")
            .put(colliding(2), "two")
            .put(colliding(3), "three");

        assert_eq!(map.len(), 3);
        assert_eq!(map.get(&colliding(2)), Some(&"two"));
        assert_eq!(map.get(&colliding(4)), None);
        let root = map.root.as_deref().unwrap();
        assert_eq!(depth_of(root), MAX_DEPTH);
    }

    #[rstest]
    fn test_collision_node_update_and_noop() {
        let map = PersistentHashMap::new()
            .put(colliding(1), 1)
            .put(colliding(2), 2);

        let same = map.put(colliding(2), 2);
        assert!(same.ptr_eq(&map));

        let updated = map.put(colliding(2), 20);
        assert_eq!(updated.len(), 2);
        assert_eq!(updated.get(&colliding(2)), Some(&20));
        assert_eq!(map.get(&colliding(2)), Some(&2));
    }

    #[rstest]
    fn test_removing_from_collision_collapses_to_single_leaf() {
        let map = PersistentHashMap::new()
            .put(colliding(1), 1)
            .put(colliding(2), 2);
        let removed = map.remove(&colliding(1));

        assert_eq!(removed.len(), 1);
        assert_eq!(removed.get(&colliding(2)), Some(&2));
        let root = removed.root.as_deref().unwrap();
        assert_eq!(depth_of(root), 1);
    }

    #[rstest]
    fn test_remove_last_entry_returns_empty_singleton() {
        let map = PersistentHashMap::singleton("only".to_string(), 1);
        let removed = map.remove("only");
        assert!(removed.is_empty());
        assert!(removed.ptr_eq(&PersistentHashMap::new()));
    }

    #[rstest]
    fn test_remove_absent_key_is_identity() {
        let map: PersistentHashMap<i32, i32> = (0..100).map(|index| (index, index)).collect();
        assert!(map.remove(&1000).ptr_eq(&map));
    }

    #[rstest]
    fn test_remove_prunes_every_level() {
        let map: PersistentHashMap<i32, i32> = (0..2000).map(|index| (index, index)).collect();
        let emptied = (0..2000).fold(map, |map, index| map.remove(&index));
        assert!(emptied.ptr_eq(&PersistentHashMap::EMPTY));
    }

    #[rstest]
    fn test_iterator_is_exact_size() {
        let map: PersistentHashMap<i32, i32> = (0..500).map(|index| (index, index * 2)).collect();
        let mut iterator = map.iter();
        assert_eq!(iterator.len(), 500);
        iterator.next();
        assert_eq!(iterator.len(), 499);
        assert_eq!(iterator.count(), 499);
    }

    #[rstest]
    fn test_weak_handle_follows_root_lifetime() {
        let map = PersistentHashMap::singleton("a", 1);
        let weak = map.downgrade();
        assert_eq!(weak.upgrade(), Some(map.clone()));
        drop(map);
        assert!(weak.upgrade().is_none());
    }

    #[cfg(debug_assertions)]
    #[rstest]
    #[should_panic(expected = "non unique empty map")]
    fn test_assembling_zero_size_map_is_illegal() {
        let root = ReferenceCounter::new(Node::single(
            Leaf {
                hash: node::hash_key(&1),
                key: 1,
                value: 1,
            },
            0,
        ));
        let _ = PersistentHashMap::assemble(root, 0);
    }

    #[rstest]
    fn test_try_hash_is_unsupported() {
        let map = PersistentHashMap::singleton(1, 1);
        assert_eq!(
            map.try_hash(),
            Err(CollectionError::UnsupportedOperation { operation: "hash" })
        );
    }
}

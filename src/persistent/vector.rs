//! Persistent (immutable) vector based on a 32-way trie with a tail buffer.
//!
//! This module provides [`PersistentVector`], an immutable sequence that
//! uses structural sharing so every earlier version stays valid after an
//! update.
//!
//! # Overview
//!
//! - O(log32 N) indexed access (effectively O(1) for practical sizes)
//! - amortized O(1) [`add`](PersistentVector::add) thanks to the tail buffer
//! - O(1) `len` and `is_empty`
//!
//! # Internal Structure
//!
//! The vector consists of:
//! - An optional root node (32-way branching trie of full leaves)
//! - A tail buffer (1 to 32 elements) that absorbs recent appends
//!
//! Branch arrays hold exactly the occupied children, so the trie is always
//! left-packed. The tree only grows in height when the root is full, and
//! then by exactly one level.
//!
//! # Examples
//!
//! ```rust
//! use persistent_trie::persistent::PersistentVector;
//!
//! let vector = PersistentVector::new().add(1).add(2).add(3);
//!
//! assert_eq!(vector.get(0), Ok(&1));
//! assert_eq!(vector.get(2), Ok(&3));
//!
//! // Structural sharing: the original vector is preserved
//! let extended = vector.add(4);
//! assert_eq!(vector.len(), 3);
//! assert_eq!(extended.len(), 4);
//! ```

use std::fmt;
use std::hash::{Hash, Hasher};
use std::iter::FromIterator;
use std::ops::Index;

use tracing::trace;

use super::ReferenceCounter;
use super::node::{self, BITS_PER_LEVEL, BRANCHING_FACTOR, MASK};
use crate::CollectionError;

// =============================================================================
// Node Definition
// =============================================================================

/// Internal node structure for the trie.
enum Node<T> {
    /// Branch node holding 1 to 32 children
    Branch(ReferenceCounter<[ReferenceCounter<Self>]>),
    /// Leaf node holding exactly 32 elements
    Leaf(ReferenceCounter<[T]>),
}

// =============================================================================
// PersistentVector Definition
// =============================================================================

/// A persistent (immutable) vector based on a 32-way trie.
///
/// # Time Complexity
///
/// | Operation   | Complexity                |
/// |-------------|---------------------------|
/// | `new`       | O(1)                      |
/// | `get`       | O(log32 N)                |
/// | `add`       | O(log32 N) amortized O(1) |
/// | `append`    | O(M log32 N)              |
/// | `index_of`  | O(N)                      |
/// | `len`       | O(1)                      |
/// | `iter`      | O(1) to create, O(N) to iterate |
///
/// # Examples
///
/// ```rust
/// use persistent_trie::persistent::PersistentVector;
///
/// let vector: PersistentVector<i32> = (0..100).collect();
/// assert_eq!(vector.len(), 100);
/// assert_eq!(vector.get(50), Ok(&50));
/// ```
pub struct PersistentVector<T> {
    /// Total number of elements
    length: usize,
    /// Shift amount for the root level: `depth * BITS_PER_LEVEL`
    shift: usize,
    /// Root node of the trie, absent while every element fits in the tail
    root: Option<ReferenceCounter<Node<T>>>,
    /// Tail buffer, absent only for the empty vector
    tail: Option<ReferenceCounter<[T]>>,
}

impl<T> PersistentVector<T> {
    /// The canonical empty vector.
    ///
    /// Every operation that produces an empty vector returns this value; it
    /// owns no allocation, so all empty vectors are indistinguishable.
    pub const EMPTY: Self = Self {
        length: 0,
        shift: BITS_PER_LEVEL,
        root: None,
        tail: None,
    };

    /// Creates a new empty vector.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_trie::persistent::PersistentVector;
    ///
    /// let vector: PersistentVector<i32> = PersistentVector::new();
    /// assert!(vector.is_empty());
    /// assert!(vector.ptr_eq(&PersistentVector::EMPTY));
    /// ```
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self::EMPTY
    }

    /// Creates a vector containing a single element.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_trie::persistent::PersistentVector;
    ///
    /// let vector = PersistentVector::singleton(42);
    /// assert_eq!(vector.len(), 1);
    /// assert_eq!(vector.get(0), Ok(&42));
    /// ```
    #[inline]
    #[must_use]
    pub fn singleton(element: T) -> Self {
        Self::assemble(
            1,
            BITS_PER_LEVEL,
            None,
            ReferenceCounter::from(vec![element]),
        )
    }

    /// Builds a non-empty vector from its parts.
    ///
    /// A zero-size vector must always be [`Self::EMPTY`].
    fn assemble(
        length: usize,
        shift: usize,
        root: Option<ReferenceCounter<Node<T>>>,
        tail: ReferenceCounter<[T]>,
    ) -> Self {
        debug_assert!(
            length > 0,
            "{}",
            CollectionError::IllegalConstruction { structure: "vector" }
        );
        Self {
            length,
            shift,
            root,
            tail: Some(tail),
        }
    }

    /// Returns the number of elements in the vector.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.length
    }

    /// Returns `true` if the vector contains no elements.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Returns `true` if both vectors share the same root and tail.
    ///
    /// Empty vectors are always pointer-equal to each other.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.length == other.length
            && node::same_node(self.root.as_ref(), other.root.as_ref())
            && node::same_node(self.tail.as_ref(), other.tail.as_ref())
    }

    /// Returns the starting index of the tail buffer.
    #[inline]
    const fn tail_offset(&self) -> usize {
        if self.length < BRANCHING_FACTOR {
            0
        } else {
            ((self.length - 1) >> BITS_PER_LEVEL) << BITS_PER_LEVEL
        }
    }

    /// Returns a reference to the element at the given index.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::IndexOutOfRange`] if `index >= len()`.
    ///
    /// # Complexity
    ///
    /// O(log32 N), O(1) when the index falls in the tail
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_trie::CollectionError;
    /// use persistent_trie::persistent::PersistentVector;
    ///
    /// let vector: PersistentVector<i32> = (1..=5).collect();
    /// assert_eq!(vector.get(4), Ok(&5));
    /// assert_eq!(
    ///     vector.get(10),
    ///     Err(CollectionError::IndexOutOfRange { index: 10, length: 5 })
    /// );
    /// ```
    pub fn get(&self, index: usize) -> Result<&T, CollectionError> {
        self.lookup(index)
            .ok_or(CollectionError::IndexOutOfRange {
                index,
                length: self.length,
            })
    }

    fn lookup(&self, index: usize) -> Option<&T> {
        if index >= self.length {
            return None;
        }
        self.chunk_for(index).get(index & MASK)
    }

    /// Returns the 32-element chunk (leaf or tail) holding `index`.
    fn chunk_for(&self, index: usize) -> &[T] {
        if index >= self.tail_offset() {
            self.tail.as_deref().unwrap_or(&[])
        } else {
            self.leaf_for(index).map_or(&[][..], |leaf| &**leaf)
        }
    }

    /// Descends the trie to the leaf holding `index`.
    fn leaf_for(&self, index: usize) -> Option<&ReferenceCounter<[T]>> {
        let mut node = self.root.as_ref()?;
        let mut level = self.shift;

        loop {
            match node.as_ref() {
                Node::Branch(children) => {
                    node = children.get((index >> level) & MASK)?;
                    level = level.saturating_sub(BITS_PER_LEVEL);
                }
                Node::Leaf(elements) => return Some(elements),
            }
        }
    }

    /// Returns a reference to the first element, or `None` if empty.
    #[inline]
    #[must_use]
    pub fn first(&self) -> Option<&T> {
        self.lookup(0)
    }

    /// Returns a reference to the last element, or `None` if empty.
    ///
    /// # Complexity
    ///
    /// O(1) - the last element is always in the tail
    #[inline]
    #[must_use]
    pub fn last(&self) -> Option<&T> {
        self.tail.as_deref().and_then(<[T]>::last)
    }

    /// Returns an iterator over references to the elements in index order.
    ///
    /// Each call starts a fresh traversal. The iterator is read-only.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_trie::persistent::PersistentVector;
    ///
    /// let vector: PersistentVector<i32> = (1..=5).collect();
    /// let collected: Vec<&i32> = vector.iter().collect();
    /// assert_eq!(collected, vec![&1, &2, &3, &4, &5]);
    /// ```
    #[must_use]
    pub fn iter(&self) -> PersistentVectorIterator<'_, T> {
        PersistentVectorIterator {
            vector: self,
            chunk: &[],
            index: 0,
        }
    }

    /// Returns the index of the first element equal to `element`.
    ///
    /// # Complexity
    ///
    /// O(N)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_trie::persistent::PersistentVector;
    ///
    /// let vector: PersistentVector<&str> = ["a", "b", "c"].into_iter().collect();
    /// assert_eq!(vector.index_of(&"c"), Some(2));
    /// assert_eq!(vector.index_of(&"z"), None);
    /// ```
    #[must_use]
    pub fn index_of(&self, element: &T) -> Option<usize>
    where
        T: PartialEq,
    {
        self.iter().position(|candidate| candidate == element)
    }

    /// Returns `true` if the vector contains an element equal to `element`.
    #[must_use]
    pub fn contains(&self, element: &T) -> bool
    where
        T: PartialEq,
    {
        self.index_of(element).is_some()
    }

    /// Computes a content hash that ignores the internal tree shape.
    ///
    /// The hash accumulates left to right as `hash * 31 + element_hash`,
    /// seeded with 1, so vectors with equal content always agree.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_trie::persistent::PersistentVector;
    ///
    /// let built: PersistentVector<i32> = (0..100).collect();
    /// let added = (0..100).fold(PersistentVector::new(), |vector, item| vector.add(item));
    /// assert_eq!(built.sequence_hash(), added.sequence_hash());
    /// assert_eq!(PersistentVector::<i32>::new().sequence_hash(), 1);
    /// ```
    #[must_use]
    pub fn sequence_hash(&self) -> u64
    where
        T: Hash,
    {
        self.iter().fold(1u64, |hash, element| {
            hash.wrapping_mul(31).wrapping_add(node::hash_key(element))
        })
    }
}

impl<T: Clone> PersistentVector<T> {
    /// Appends an element to the back of the vector.
    ///
    /// # Complexity
    ///
    /// O(log32 N) amortized O(1) due to the tail buffer
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_trie::persistent::PersistentVector;
    ///
    /// let vector = PersistentVector::new().add(1).add(2).add(3);
    /// assert_eq!(vector.len(), 3);
    /// assert_eq!(vector.get(2), Ok(&3));
    /// ```
    #[must_use]
    pub fn add(&self, item: T) -> Self {
        match &self.tail {
            None => Self::singleton(item),
            Some(tail) if tail.len() < BRANCHING_FACTOR => Self::assemble(
                self.length + 1,
                self.shift,
                self.root.clone(),
                node::pushed(tail, item),
            ),
            Some(tail) => self.push_tail(tail, item),
        }
    }

    /// Folds the full tail into the trie and starts a new tail with `item`.
    fn push_tail(&self, tail: &ReferenceCounter<[T]>, item: T) -> Self {
        let leaf = ReferenceCounter::new(Node::Leaf(tail.clone()));

        let (root, shift) = match &self.root {
            None => (Self::new_path(BITS_PER_LEVEL, leaf), BITS_PER_LEVEL),
            Some(root) if (self.length >> BITS_PER_LEVEL) > (1 << self.shift) => {
                let shift = self.shift + BITS_PER_LEVEL;
                trace!(length = self.length, shift, "vector trie grew by one level");
                let children = ReferenceCounter::from(vec![
                    root.clone(),
                    Self::new_path(self.shift, leaf),
                ]);
                (ReferenceCounter::new(Node::Branch(children)), shift)
            }
            Some(root) => (
                Self::push_leaf(root, self.shift, self.length - 1, leaf),
                self.shift,
            ),
        };

        Self::assemble(
            self.length + 1,
            shift,
            Some(root),
            ReferenceCounter::from(vec![item]),
        )
    }

    /// Wraps `node` in single-child branches up to `level`.
    fn new_path(level: usize, node: ReferenceCounter<Node<T>>) -> ReferenceCounter<Node<T>> {
        if level == 0 {
            node
        } else {
            let child = Self::new_path(level - BITS_PER_LEVEL, node);
            ReferenceCounter::new(Node::Branch(ReferenceCounter::from(vec![child])))
        }
    }

    /// Copies the path to the last leaf slot and places `leaf` there.
    fn push_leaf(
        parent: &ReferenceCounter<Node<T>>,
        level: usize,
        index: usize,
        leaf: ReferenceCounter<Node<T>>,
    ) -> ReferenceCounter<Node<T>> {
        let Node::Branch(children) = parent.as_ref() else {
            return leaf;
        };
        let slot = (index >> level) & MASK;

        let child = if level == BITS_PER_LEVEL {
            leaf
        } else if let Some(existing) = children.get(slot) {
            Self::push_leaf(existing, level - BITS_PER_LEVEL, index, leaf)
        } else {
            Self::new_path(level - BITS_PER_LEVEL, leaf)
        };

        let children = if slot < children.len() {
            node::replaced(children, slot, child)
        } else {
            node::pushed(children, child)
        };
        ReferenceCounter::new(Node::Branch(children))
    }

    /// Appends every element of `sequence` to this vector.
    ///
    /// This is a sequential fold of [`add`](Self::add); no bulk merge of the
    /// two tries is attempted.
    ///
    /// # Complexity
    ///
    /// O(M log32 N) where M = `sequence.len()`
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_trie::persistent::PersistentVector;
    ///
    /// let left: PersistentVector<i32> = (1..=3).collect();
    /// let right: PersistentVector<i32> = (4..=6).collect();
    /// let combined = left.append(&right);
    ///
    /// assert_eq!(combined.to_vec(), vec![1, 2, 3, 4, 5, 6]);
    /// assert_eq!(left.len(), 3);
    /// ```
    #[must_use]
    pub fn append(&self, sequence: &Self) -> Self {
        self.add_all(sequence.iter().cloned())
    }

    /// Appends every element produced by `iter`, one [`add`](Self::add) at a time.
    #[must_use]
    pub fn add_all<I>(&self, iter: I) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        iter.into_iter()
            .fold(self.clone(), |vector, item| vector.add(item))
    }

    /// Creates a vector from a slice, building the trie bottom-up.
    ///
    /// # Complexity
    ///
    /// O(N)
    #[must_use]
    pub fn from_slice(slice: &[T]) -> Self {
        build_from_vec(slice.to_vec())
    }

    /// Materializes the vector into a `Vec` in index order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }
}

// =============================================================================
// Bulk construction
// =============================================================================

/// Builds a vector from owned elements with the same layout `add` produces.
fn build_from_vec<T>(mut elements: Vec<T>) -> PersistentVector<T> {
    let length = elements.len();
    if length == 0 {
        return PersistentVector::EMPTY;
    }

    let tail_length = match length % BRANCHING_FACTOR {
        0 => BRANCHING_FACTOR,
        remainder => remainder,
    };
    let tail = ReferenceCounter::from(elements.split_off(length - tail_length));

    if elements.is_empty() {
        return PersistentVector::assemble(length, BITS_PER_LEVEL, None, tail);
    }

    let mut level: Vec<ReferenceCounter<Node<T>>> =
        Vec::with_capacity(elements.len() / BRANCHING_FACTOR);
    let mut remaining = elements.into_iter();
    loop {
        let chunk: Vec<T> = remaining.by_ref().take(BRANCHING_FACTOR).collect();
        if chunk.is_empty() {
            break;
        }
        level.push(ReferenceCounter::new(Node::Leaf(ReferenceCounter::from(
            chunk,
        ))));
    }

    let mut shift = BITS_PER_LEVEL;
    while level.len() > BRANCHING_FACTOR {
        level = level
            .chunks(BRANCHING_FACTOR)
            .map(|children| ReferenceCounter::new(Node::Branch(ReferenceCounter::from(children))))
            .collect();
        shift += BITS_PER_LEVEL;
    }

    let root = ReferenceCounter::new(Node::Branch(ReferenceCounter::from(level)));
    PersistentVector::assemble(length, shift, Some(root), tail)
}

// =============================================================================
// Iterator Implementation
// =============================================================================

/// An iterator over references to elements of a [`PersistentVector`].
///
/// The iterator resolves one 32-element chunk at a time, so a full pass
/// costs O(N) plus one trie descent per leaf.
pub struct PersistentVectorIterator<'a, T> {
    vector: &'a PersistentVector<T>,
    /// Chunk holding `index`, refreshed at every 32-element boundary
    chunk: &'a [T],
    index: usize,
}

impl<'a, T> Iterator for PersistentVectorIterator<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.vector.length {
            return None;
        }
        if self.index & MASK == 0 {
            self.chunk = self.vector.chunk_for(self.index);
        }
        let element = self.chunk.get(self.index & MASK)?;
        self.index += 1;
        Some(element)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.vector.length.saturating_sub(self.index);
        (remaining, Some(remaining))
    }
}

impl<T> ExactSizeIterator for PersistentVectorIterator<'_, T> {
    fn len(&self) -> usize {
        self.vector.length.saturating_sub(self.index)
    }
}

/// An owning iterator over the elements of a [`PersistentVector`].
///
/// Elements are cloned out of the shared chunks.
pub struct PersistentVectorIntoIterator<T> {
    vector: PersistentVector<T>,
    chunk: Option<ReferenceCounter<[T]>>,
    index: usize,
}

impl<T: Clone> Iterator for PersistentVectorIntoIterator<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.vector.length {
            return None;
        }
        if self.index & MASK == 0 || self.chunk.is_none() {
            self.chunk = if self.index >= self.vector.tail_offset() {
                self.vector.tail.clone()
            } else {
                self.vector.leaf_for(self.index).cloned()
            };
        }
        let element = self.chunk.as_ref()?.get(self.index & MASK)?.clone();
        self.index += 1;
        Some(element)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.vector.length.saturating_sub(self.index);
        (remaining, Some(remaining))
    }
}

impl<T: Clone> ExactSizeIterator for PersistentVectorIntoIterator<T> {
    fn len(&self) -> usize {
        self.vector.length.saturating_sub(self.index)
    }
}

// =============================================================================
// Standard Trait Implementations
// =============================================================================

impl<T> Clone for PersistentVector<T> {
    fn clone(&self) -> Self {
        Self {
            length: self.length,
            shift: self.shift,
            root: self.root.clone(),
            tail: self.tail.clone(),
        }
    }
}

impl<T> Default for PersistentVector<T> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<T> for PersistentVector<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        build_from_vec(iter.into_iter().collect())
    }
}

impl<T: Clone> IntoIterator for PersistentVector<T> {
    type Item = T;
    type IntoIter = PersistentVectorIntoIterator<T>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        PersistentVectorIntoIterator {
            vector: self,
            chunk: None,
            index: 0,
        }
    }
}

impl<'a, T> IntoIterator for &'a PersistentVector<T> {
    type Item = &'a T;
    type IntoIter = PersistentVectorIterator<'a, T>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T> Index<usize> for PersistentVector<T> {
    type Output = T;

    /// # Panics
    ///
    /// Panics with [`CollectionError::IndexOutOfRange`] if `index >= len()`.
    fn index(&self, index: usize) -> &Self::Output {
        match self.get(index) {
            Ok(element) => element,
            Err(error) => panic!("{error}"),
        }
    }
}

impl<T: PartialEq> PartialEq for PersistentVector<T> {
    fn eq(&self, other: &Self) -> bool {
        if self.length != other.length {
            return false;
        }
        self.ptr_eq(other) || self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl<T: Eq> Eq for PersistentVector<T> {}

/// Hashes the length followed by every element in index order, so equal
/// vectors hash identically whatever their construction history.
impl<T: Hash> Hash for PersistentVector<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.length.hash(state);
        for element in self {
            element.hash(state);
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for PersistentVector<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_list().entries(self.iter()).finish()
    }
}

impl<T: fmt::Display> fmt::Display for PersistentVector<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "[")?;
        let mut first = true;
        for element in self {
            if first {
                first = false;
            } else {
                write!(formatter, ", ")?;
            }
            write!(formatter, "{element}")?;
        }
        write!(formatter, "]")
    }
}

// =============================================================================
// Serde Support
// =============================================================================

#[cfg(feature = "serde")]
impl<T: serde::Serialize> serde::Serialize for PersistentVector<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeSeq;
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for element in self {
            seq.serialize_element(element)?;
        }
        seq.end()
    }
}

#[cfg(feature = "serde")]
struct PersistentVectorVisitor<T> {
    marker: std::marker::PhantomData<T>,
}

#[cfg(feature = "serde")]
impl<'de, T> serde::de::Visitor<'de> for PersistentVectorVisitor<T>
where
    T: serde::Deserialize<'de>,
{
    type Value = PersistentVector<T>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a sequence")
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: serde::de::SeqAccess<'de>,
    {
        let mut elements = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(element) = seq.next_element()? {
            elements.push(element);
        }
        Ok(build_from_vec(elements))
    }
}

#[cfg(feature = "serde")]
impl<'de, T> serde::Deserialize<'de> for PersistentVector<T>
where
    T: serde::Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_seq(PersistentVectorVisitor {
            marker: std::marker::PhantomData,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

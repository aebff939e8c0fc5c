//! Shared node primitives for the vector trie and the HAMT.
//!
//! Both tries are built from immutable, arity-bounded arrays that are
//! exactly as long as the number of occupied slots. A node is never
//! modified after it is published: every update goes through one of the
//! copy helpers below, which allocate a fresh array and leave the input
//! untouched. The element clones are cheap for trie children because they
//! are reference-counted pointers.

use std::hash::{BuildHasher, Hash};

use super::ReferenceCounter;

// =============================================================================
// Constants
// =============================================================================

/// Bits of index or hash consumed per trie level.
pub(crate) const BITS_PER_LEVEL: usize = 5;

/// Branching factor (2^5 = 32).
pub(crate) const BRANCHING_FACTOR: usize = 1 << BITS_PER_LEVEL;

/// Bit mask for extracting the slot within a node.
pub(crate) const MASK: usize = BRANCHING_FACTOR - 1;

/// Number of hash bits available before a HAMT falls back to a collision node.
pub(crate) const HASH_BITS: usize = u64::BITS as usize;

// =============================================================================
// Key hashing
// =============================================================================

/// Hasher used for map keys and for [`PersistentVector::sequence_hash`].
///
/// The hasher is always deterministic so that two maps holding equal keys
/// place them identically, whichever process built them.
///
/// [`PersistentVector::sequence_hash`]: super::PersistentVector::sequence_hash
#[cfg(feature = "fxhash")]
pub type KeyHasher = rustc_hash::FxBuildHasher;

/// Hasher used for map keys and for [`PersistentVector::sequence_hash`].
///
/// [`PersistentVector::sequence_hash`]: super::PersistentVector::sequence_hash
#[cfg(all(feature = "ahash", not(feature = "fxhash")))]
pub type KeyHasher = std::hash::BuildHasherDefault<ahash::AHasher>;

/// Hasher used for map keys and for [`PersistentVector::sequence_hash`].
///
/// SipHash with fixed keys, so hashes are stable across map instances.
///
/// [`PersistentVector::sequence_hash`]: super::PersistentVector::sequence_hash
#[cfg(not(any(feature = "fxhash", feature = "ahash")))]
pub type KeyHasher = std::hash::BuildHasherDefault<std::collections::hash_map::DefaultHasher>;

/// Computes the 64-bit hash of a key.
#[inline]
pub(crate) fn hash_key<Q: Hash + ?Sized>(key: &Q) -> u64 {
    KeyHasher::default().hash_one(key)
}

// =============================================================================
// Bitmap helpers
// =============================================================================

/// Returns the bitmap bit selected by the hash bits at `shift`.
#[inline]
pub(crate) const fn bit_for(hash: u64, shift: usize) -> u32 {
    1u32 << ((hash >> shift) as usize & MASK)
}

/// Returns the compacted array position of `bit` in `bitmap`.
#[inline]
pub(crate) const fn sparse_index(bitmap: u32, bit: u32) -> usize {
    (bitmap & (bit - 1)).count_ones() as usize
}

// =============================================================================
// Copy-on-write array helpers
// =============================================================================

/// Returns a copy of `items` with `item` appended.
pub(crate) fn pushed<T: Clone>(items: &[T], item: T) -> ReferenceCounter<[T]> {
    let mut copy = Vec::with_capacity(items.len() + 1);
    copy.extend_from_slice(items);
    copy.push(item);
    ReferenceCounter::from(copy)
}

/// Returns a copy of `items` with the slot at `position` replaced.
pub(crate) fn replaced<T: Clone>(items: &[T], position: usize, item: T) -> ReferenceCounter<[T]> {
    let mut copy = items.to_vec();
    copy[position] = item;
    ReferenceCounter::from(copy)
}

/// Returns a copy of `items` with `item` inserted before `position`.
pub(crate) fn inserted<T: Clone>(items: &[T], position: usize, item: T) -> ReferenceCounter<[T]> {
    let mut copy = Vec::with_capacity(items.len() + 1);
    copy.extend_from_slice(&items[..position]);
    copy.push(item);
    copy.extend_from_slice(&items[position..]);
    ReferenceCounter::from(copy)
}

/// Returns a copy of `items` without the slot at `position`.
pub(crate) fn removed<T: Clone>(items: &[T], position: usize) -> ReferenceCounter<[T]> {
    let mut copy = Vec::with_capacity(items.len().saturating_sub(1));
    copy.extend_from_slice(&items[..position]);
    copy.extend_from_slice(&items[position + 1..]);
    ReferenceCounter::from(copy)
}

/// Returns `true` when both optional nodes are absent or share one allocation.
pub(crate) fn same_node<U: ?Sized>(
    left: Option<&ReferenceCounter<U>>,
    right: Option<&ReferenceCounter<U>>,
) -> bool {
    match (left, right) {
        (None, None) => true,
        (Some(left), Some(right)) => ReferenceCounter::ptr_eq(left, right),
        _ => false,
    }
}

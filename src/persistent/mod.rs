//! Persistent (immutable) data structures.
//!
//! This module provides immutable collections that use structural sharing
//! to minimize copying:
//!
//! - [`PersistentVector`]: Persistent vector (32-way trie with a tail buffer)
//! - [`PersistentHashMap`]: Persistent hash map (HAMT)
//! - [`LazyMapView`]: Read-through view over a plain `HashMap` that promotes
//!   itself to a [`PersistentHashMap`] on the first structural change
//! - [`PersistentMap`]: Either of the two map representations above
//!
//! The [`factory`] module gathers the construction entry points.
//!
//! # Structural Sharing
//!
//! Every "mutation" returns a new value. Only the nodes on the path to the
//! change are copied; everything else is shared with the previous version,
//! which stays valid and unchanged.
//!
//! # Examples
//!
//! ## `PersistentVector`
//!
//! ```rust
//! use persistent_trie::persistent::PersistentVector;
//!
//! let vector: PersistentVector<i32> = (0..100).collect();
//! assert_eq!(vector.get(50), Ok(&50));
//!
//! // Structural sharing: the original vector is preserved
//! let extended = vector.add(100);
//! assert_eq!(vector.len(), 100);   // Original unchanged
//! assert_eq!(extended.len(), 101); // New version
//! ```
//!
//! ## `PersistentHashMap`
//!
//! ```rust
//! use persistent_trie::persistent::PersistentHashMap;
//!
//! let map = PersistentHashMap::new()
//!     .put("one".to_string(), 1)
//!     .put("two".to_string(), 2);
//! assert_eq!(map.get("one"), Some(&1));
//!
//! // Structural sharing: the original map is preserved
//! let updated = map.put("one".to_string(), 100);
//! assert_eq!(map.get("one"), Some(&1));       // Original unchanged
//! assert_eq!(updated.get("one"), Some(&100)); // New version
//! ```
//!
//! ## `PersistentMap`
//!
//! ```rust
//! use persistent_trie::persistent::factory;
//! use std::collections::HashMap;
//!
//! let plain: HashMap<&str, i32> = [("a", 1), ("b", 2)].into_iter().collect();
//! let map = factory::map_from(&plain);
//!
//! let updated = map.put("c", 3);
//! assert_eq!(map.len(), 2);
//! assert_eq!(updated.len(), 3);
//! ```

// =============================================================================
// Reference Counter Type Alias
// =============================================================================

/// Reference-counted smart pointer type.
///
/// When the `arc` feature is enabled (default), this is `std::sync::Arc`,
/// which is thread-safe but has slightly higher overhead.
///
/// When the `arc` feature is disabled, this is `std::rc::Rc`,
/// which is faster but not thread-safe.
#[cfg(feature = "arc")]
pub(crate) type ReferenceCounter<T> = std::sync::Arc<T>;

#[cfg(not(feature = "arc"))]
pub(crate) type ReferenceCounter<T> = std::rc::Rc<T>;

/// Non-owning counterpart of [`ReferenceCounter`].
#[cfg(feature = "arc")]
pub(crate) type WeakReferenceCounter<T> = std::sync::Weak<T>;

#[cfg(not(feature = "arc"))]
pub(crate) type WeakReferenceCounter<T> = std::rc::Weak<T>;

mod entry;
pub mod factory;
mod hashmap;
mod map;
mod node;
mod vector;
mod view;

pub use entry::PersistentEntry;
pub use hashmap::PersistentHashMap;
pub use hashmap::PersistentHashMapIntoIterator;
pub use hashmap::PersistentHashMapIterator;
pub use map::PersistentMap;
pub use map::PersistentMapIterator;
pub use node::KeyHasher;
pub use vector::PersistentVector;
pub use vector::PersistentVectorIntoIterator;
pub use vector::PersistentVectorIterator;
pub use view::LazyMapView;
pub use view::LazyMapViewIterator;
pub use view::Retention;

// =============================================================================
// Thread Safety
// =============================================================================

#[cfg(feature = "arc")]
static_assertions::assert_impl_all!(PersistentVector<i32>: Send, Sync);
#[cfg(feature = "arc")]
static_assertions::assert_impl_all!(PersistentHashMap<String, i32>: Send, Sync);
#[cfg(feature = "arc")]
static_assertions::assert_impl_all!(LazyMapView<String, i32>: Send, Sync);
#[cfg(feature = "arc")]
static_assertions::assert_impl_all!(PersistentMap<String, i32>: Send, Sync);

#[cfg(not(feature = "arc"))]
static_assertions::assert_not_impl_any!(PersistentVector<i32>: Send, Sync);
#[cfg(not(feature = "arc"))]
static_assertions::assert_not_impl_any!(PersistentHashMap<String, i32>: Send, Sync);

// =============================================================================
// Tests
// =============================================================================

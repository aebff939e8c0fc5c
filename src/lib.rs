//! # persistent-trie
//!
//! Persistent (fully immutable, structurally shared) collections for Rust.
//!
//! ## Overview
//!
//! Every "mutation" returns a new collection and leaves all earlier versions
//! observable and unchanged. The crate provides:
//!
//! - **Sequences**: [`PersistentVector`](persistent::PersistentVector), a
//!   32-way trie with a tail buffer for amortized O(1) append and
//!   O(log32 N) indexed access
//! - **Maps**: [`PersistentHashMap`](persistent::PersistentHashMap), a Hash
//!   Array Mapped Trie with O(log32 N) put, get and remove
//! - **Lazy views**: [`LazyMapView`](persistent::LazyMapView), which wraps an
//!   existing `HashMap` and only builds a trie on the first structural change
//!
//! ## Feature Flags
//!
//! - `arc`: Use `Arc` instead of `Rc` so collections are `Send + Sync` (default)
//! - `serde`: Serialization support
//! - `fxhash`: Hash keys with `rustc-hash`
//! - `ahash`: Hash keys with `ahash`
//! - `full`: Enable `arc` and `serde`
//!
//! ## Example
//!
//! ```rust
//! use persistent_trie::prelude::*;
//!
//! let vector = factory::sequence_from_slice(&[1, 2, 3]);
//! let longer = vector.add(4);
//! assert_eq!(vector.len(), 3);
//! assert_eq!(longer.get(3), Ok(&4));
//!
//! let map = factory::singleton_map("key", 1);
//! assert_eq!(map.put("other", 2).len(), 2);
//! assert!(map.try_hash().is_err());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
// Note: Disabling redundant_closure_for_method_calls due to clippy 0.1.92 panic bug
#![allow(clippy::redundant_closure_for_method_calls)]

/// Prelude module for convenient imports.
///
/// Re-exports commonly used types.
///
/// # Usage
///
/// ```rust
/// use persistent_trie::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::CollectionError;
    pub use crate::persistent::*;
}

pub mod error;
pub mod persistent;

pub use error::CollectionError;

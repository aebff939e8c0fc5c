//! Error types for the persistent collections.
//!
//! Map lookups never fail (they return `None`), so the only fallible
//! operations are indexed reads on a vector and hashing a map. The
//! `IllegalConstruction` variant describes a broken internal invariant and
//! is only ever raised through a debug assertion.

use thiserror::Error;

/// Represents errors that can occur when working with persistent collections.
///
/// # Examples
///
/// ```rust
/// use persistent_trie::CollectionError;
/// use persistent_trie::persistent::PersistentVector;
///
/// let vector: PersistentVector<i32> = (1..=3).collect();
/// assert_eq!(
///     vector.get(5),
///     Err(CollectionError::IndexOutOfRange { index: 5, length: 3 })
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollectionError {
    /// An indexed read was outside `0..length`.
    #[error("index {index} out of range for sequence of length {length}")]
    IndexOutOfRange {
        /// The requested index.
        index: usize,
        /// The length of the sequence at the time of the call.
        length: usize,
    },

    /// A zero-size value was assembled instead of using the canonical empty instance.
    #[error("non unique empty {structure}: use the canonical empty instance")]
    IllegalConstruction {
        /// The kind of structure being constructed (`"vector"` or `"map"`).
        structure: &'static str,
    },

    /// The requested operation is deliberately not supported.
    #[error("{operation} is not supported: no hash compatible with map value equality exists")]
    UnsupportedOperation {
        /// The name of the rejected operation.
        operation: &'static str,
    },
}

//! Immutable key-value pair handed out by the persistent maps.

use std::fmt;

/// A key-value pair taken from a persistent map.
///
/// Entries are plain values: equality and hashing are structural over both
/// fields, and nothing can change an entry once it has been built.
///
/// # Examples
///
/// ```rust
/// use persistent_trie::persistent::PersistentEntry;
///
/// let entry = PersistentEntry::new("key", 1);
/// assert_eq!(entry.key(), &"key");
/// assert_eq!(entry.value(), &1);
/// assert_eq!(entry, PersistentEntry::from(("key", 1)));
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PersistentEntry<K, V> {
    key: K,
    value: V,
}

impl<K, V> PersistentEntry<K, V> {
    /// Creates an entry.
    #[inline]
    #[must_use]
    pub const fn new(key: K, value: V) -> Self {
        Self { key, value }
    }

    /// Returns the key.
    #[inline]
    #[must_use]
    pub const fn key(&self) -> &K {
        &self.key
    }

    /// Returns the value.
    #[inline]
    #[must_use]
    pub const fn value(&self) -> &V {
        &self.value
    }

    /// Splits the entry into its key and value.
    #[inline]
    #[must_use]
    pub fn into_pair(self) -> (K, V) {
        (self.key, self.value)
    }
}

impl<K, V> From<(K, V)> for PersistentEntry<K, V> {
    fn from((key, value): (K, V)) -> Self {
        Self::new(key, value)
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for PersistentEntry<K, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{:?}: {:?}", self.key, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashSet;

    #[rstest]
    fn test_equality_covers_both_fields() {
        assert_eq!(PersistentEntry::new("a", 1), PersistentEntry::new("a", 1));
        assert_ne!(PersistentEntry::new("a", 1), PersistentEntry::new("a", 2));
        assert_ne!(PersistentEntry::new("a", 1), PersistentEntry::new("b", 1));
    }

    #[rstest]
    fn test_absent_values_compare_equal() {
        let first: PersistentEntry<Option<&str>, Option<i32>> = PersistentEntry::new(None, None);
        let second = PersistentEntry::new(None, None);
        assert_eq!(first, second);
    }

    #[rstest]
    fn test_equal_entries_share_a_hash_set_slot() {
        let set: HashSet<PersistentEntry<&str, i32>> = [
            PersistentEntry::new("a", 1),
            PersistentEntry::new("a", 1),
            PersistentEntry::new("b", 2),
        ]
        .into_iter()
        .collect();
        assert_eq!(set.len(), 2);
    }

    #[rstest]
    fn test_debug_and_into_pair() {
        let entry = PersistentEntry::new("x", 7);
        assert_eq!(format!("{entry:?}"), "\"x\": 7");
        assert_eq!(entry.into_pair(), ("x", 7));
    }
}

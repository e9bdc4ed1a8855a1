//! Atlas: Mapping sample keys to contiguous slices of a flat value buffer.
//!
//! Every sample of a field (a node, a centroid, or one integration point of
//! an element) owns one slice of the buffer holding its component-vector. The
//! atlas records `(offset, len)` per key and keeps insertion order, which is
//! the order records arrived from the database.

use crate::debug_invariants::{DebugInvariants, ensure};
use crate::result_error::ResultSieveError;
use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;

/// Keys usable in an [`Atlas`].
pub trait AtlasKey: Copy + Eq + Hash + Debug {}
impl<T: Copy + Eq + Hash + Debug> AtlasKey for T {}

/// Insertion-ordered map from key to `(offset, len)`.
///
/// # Invariants
/// - Each key appears exactly once in `order`, and `map` holds exactly those keys.
/// - Every slice has `len > 0`.
/// - Offsets are contiguous in insertion order and `total_len` is their sum.
#[derive(Clone, Debug)]
pub struct Atlas<K: AtlasKey> {
    map: HashMap<K, (usize, usize)>,
    order: Vec<K>,
    total_len: usize,
}

impl<K: AtlasKey> Default for Atlas<K> {
    fn default() -> Self {
        Self {
            map: HashMap::new(),
            order: Vec::new(),
            total_len: 0,
        }
    }
}

impl<K: AtlasKey> Atlas<K> {
    /// Registers `key` with a slice of `len` values and returns its offset.
    ///
    /// # Errors
    /// `InvariantViolation` if `len == 0` or `key` is already present;
    /// callers that need a domain error check [`contains`](Self::contains) first.
    ///
    /// # Complexity
    /// Amortized **O(1)**.
    pub fn try_insert(&mut self, key: K, len: usize) -> Result<usize, ResultSieveError> {
        ensure(len > 0, || format!("zero-length slice for {key:?}"))?;
        ensure(!self.map.contains_key(&key), || {
            format!("{key:?} already registered in atlas")
        })?;
        let offset = self.total_len;
        self.map.insert(key, (offset, len));
        self.order.push(key);
        self.total_len += len;
        Ok(offset)
    }

    /// `(offset, len)` for `key`, if registered.
    #[inline]
    pub fn get(&self, key: &K) -> Option<(usize, usize)> {
        self.map.get(key).copied()
    }

    #[inline]
    pub fn contains(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    /// Number of keys (not values; see [`total_len`](Self::total_len)).
    #[inline]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Length of the value buffer the atlas describes.
    #[inline]
    pub fn total_len(&self) -> usize {
        self.total_len
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = K> + '_ {
        self.order.iter().copied()
    }

    /// `(key, (offset, len))` in insertion order.
    pub fn iter_entries(&self) -> impl Iterator<Item = (K, (usize, usize))> + '_ {
        self.order.iter().map(move |k| (*k, self.map[k]))
    }
}

impl<K: AtlasKey> DebugInvariants for Atlas<K> {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "Atlas invalid");
    }

    fn validate_invariants(&self) -> Result<(), ResultSieveError> {
        let unique: HashSet<&K> = self.order.iter().collect();
        ensure(unique.len() == self.order.len(), || {
            "atlas order lists a key twice".to_string()
        })?;
        ensure(unique.len() == self.map.len(), || {
            format!(
                "atlas order has {} keys, map has {}",
                unique.len(),
                self.map.len()
            )
        })?;
        let mut expected = 0usize;
        for key in &self.order {
            let (offset, len) = self.map.get(key).copied().ok_or_else(|| {
                ResultSieveError::InvariantViolation(format!("{key:?} missing from atlas map"))
            })?;
            ensure(len > 0, || format!("zero-length slice for {key:?}"))?;
            ensure(offset == expected, || {
                format!("{key:?} at offset {offset}, expected {expected}")
            })?;
            expected += len;
        }
        ensure(expected == self.total_len, || {
            format!("atlas spans {expected} values, total_len is {}", self.total_len)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_are_contiguous() {
        let mut a: Atlas<(u64, u16)> = Atlas::default();
        assert_eq!(a.try_insert((1, 1), 6).unwrap(), 0);
        assert_eq!(a.try_insert((1, 2), 6).unwrap(), 6);
        assert_eq!(a.try_insert((9, 1), 1).unwrap(), 12);
        assert_eq!(a.get(&(1, 2)), Some((6, 6)));
        assert_eq!(a.total_len(), 13);
        assert_eq!(a.keys().collect::<Vec<_>>(), vec![(1, 1), (1, 2), (9, 1)]);
        a.validate_invariants().unwrap();
    }

    #[test]
    fn zero_length_and_duplicates_rejected() {
        let mut a: Atlas<u64> = Atlas::default();
        assert!(a.try_insert(3, 0).is_err());
        a.try_insert(3, 2).unwrap();
        assert!(a.try_insert(3, 2).is_err());
        assert_eq!(a.len(), 1);
    }
}

//! Section: component-vector storage over an [`Atlas`].
//!
//! A `Section<K>` couples an atlas with a flat `Vec<f64>`. Component order
//! inside each slice is exactly the order the values were inserted with.

use crate::data::atlas::{Atlas, AtlasKey};
use crate::debug_invariants::{DebugInvariants, ensure};
use crate::result_error::ResultSieveError;

/// Per-key component-vectors in one contiguous buffer.
#[derive(Clone, Debug)]
pub struct Section<K: AtlasKey> {
    atlas: Atlas<K>,
    data: Vec<f64>,
}

impl<K: AtlasKey> Default for Section<K> {
    fn default() -> Self {
        Self {
            atlas: Atlas::default(),
            data: Vec::new(),
        }
    }
}

impl<K: AtlasKey> Section<K> {
    /// Appends a new key with its values.
    ///
    /// # Errors
    /// Propagates atlas failures (empty slice, duplicate key).
    pub fn try_push(&mut self, key: K, values: &[f64]) -> Result<(), ResultSieveError> {
        self.atlas.try_insert(key, values.len())?;
        self.data.extend_from_slice(values);
        Ok(())
    }

    /// Read-only view of the values for `key`, or `None` if absent.
    #[inline]
    pub fn try_restrict(&self, key: &K) -> Option<&[f64]> {
        self.atlas
            .get(key)
            .map(|(offset, len)| &self.data[offset..offset + len])
    }

    #[inline]
    pub fn contains(&self, key: &K) -> bool {
        self.atlas.contains(key)
    }

    pub fn atlas(&self) -> &Atlas<K> {
        &self.atlas
    }

    pub fn len(&self) -> usize {
        self.atlas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atlas.is_empty()
    }

    /// `(key, values)` in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (K, &[f64])> + '_ {
        self.atlas
            .iter_entries()
            .map(move |(k, (offset, len))| (k, &self.data[offset..offset + len]))
    }

    /// New section with the same keys and `f` applied to every slice.
    pub fn try_map<F>(&self, mut f: F) -> Result<Section<K>, ResultSieveError>
    where
        F: FnMut(K, &[f64]) -> Result<Vec<f64>, ResultSieveError>,
    {
        let mut out = Section::default();
        for (key, values) in self.iter() {
            let mapped = f(key, values)?;
            out.try_push(key, &mapped)?;
        }
        Ok(out)
    }
}

impl<K: AtlasKey> DebugInvariants for Section<K> {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "Section invalid");
    }

    fn validate_invariants(&self) -> Result<(), ResultSieveError> {
        self.atlas.validate_invariants()?;
        ensure(self.atlas.total_len() == self.data.len(), || {
            format!(
                "section buffer holds {} values, atlas expects {}",
                self.data.len(),
                self.atlas.total_len()
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_and_restrict_preserve_component_order() {
        let mut s: Section<u64> = Section::default();
        s.try_push(2, &[3.0, 1.0, 2.0]).unwrap();
        s.try_push(1, &[9.0]).unwrap();
        assert_eq!(s.try_restrict(&2), Some(&[3.0, 1.0, 2.0][..]));
        assert_eq!(s.try_restrict(&1), Some(&[9.0][..]));
        assert_eq!(s.try_restrict(&5), None);
        let keys: Vec<_> = s.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![2, 1]);
        s.validate_invariants().unwrap();
    }

    #[test]
    fn map_keeps_keys() {
        let mut s: Section<u64> = Section::default();
        s.try_push(1, &[1.0, 2.0]).unwrap();
        s.try_push(4, &[3.0, 4.0]).unwrap();
        let sums = s.try_map(|_, v| Ok(vec![v.iter().sum()])).unwrap();
        assert_eq!(sums.try_restrict(&4), Some(&[7.0][..]));
        assert_eq!(sums.len(), 2);
    }
}

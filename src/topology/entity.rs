//! `EntityId`: a strong, zero-cost handle for node and element labels
//!
//! Result databases number nodes and elements with positive integer labels
//! that are unique only inside one instance. `EntityId` wraps a `NonZeroU64`
//! so that the reserved label 0 can never circulate through the reduction
//! code, and so that `Option<EntityId>` costs no extra space.

use crate::result_error::ResultSieveError;
use std::{fmt, num::NonZeroU64};

/// Instance-local node or element label.
///
/// `repr(transparent)` keeps the layout identical to `u64`.
#[derive(
    Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[repr(transparent)]
pub struct EntityId(NonZeroU64);

impl EntityId {
    /// Creates an `EntityId` from a raw label.
    ///
    /// # Errors
    /// Returns `Err(InvalidEntityId)` if `raw == 0`.
    ///
    /// # Example
    /// ```rust
    /// use result_sieve::topology::entity::EntityId;
    /// let n = EntityId::new(12).unwrap();
    /// assert_eq!(n.get(), 12);
    /// assert!(EntityId::new(0).is_err());
    /// ```
    #[inline]
    pub fn new(raw: u64) -> Result<Self, ResultSieveError> {
        NonZeroU64::new(raw)
            .map(EntityId)
            .ok_or(ResultSieveError::InvalidEntityId)
    }

    /// Returns the raw label.
    #[inline]
    pub const fn get(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EntityId").field(&self.get()).finish()
    }
}

/// Prints only the raw label, the way reports list node/element numbers.
impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

impl TryFrom<u64> for EntityId {
    type Error = ResultSieveError;

    fn try_from(raw: u64) -> Result<Self, Self::Error> {
        EntityId::new(raw)
    }
}

/// Whether an id or a set refers to nodes or to elements.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub enum EntityKind {
    Node,
    Element,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Node => f.write_str("node"),
            EntityKind::Element => f.write_str("element"),
        }
    }
}

#[cfg(test)]
mod layout_tests {
    use super::*;
    use static_assertions::assert_eq_size;

    assert_eq_size!(EntityId, u64);
    assert_eq_size!(Option<EntityId>, u64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_rejected() {
        assert_eq!(EntityId::new(0), Err(ResultSieveError::InvalidEntityId));
        assert!(EntityId::try_from(0u64).is_err());
    }

    #[test]
    fn display_and_debug() {
        let id = EntityId::new(7).unwrap();
        assert_eq!(format!("{id}"), "7");
        assert_eq!(format!("{id:?}"), "EntityId(7)");
        assert_eq!(EntityKind::Element.to_string(), "element");
    }

    #[test]
    fn ordering_follows_labels() {
        let mut ids: Vec<_> = [5u64, 1, 3]
            .into_iter()
            .map(|r| EntityId::new(r).unwrap())
            .collect();
        ids.sort();
        let raw: Vec<_> = ids.iter().map(|id| id.get()).collect();
        assert_eq!(raw, vec![1, 3, 5]);
    }
}

//! Invariant checking for derived structures (adjacency indices, field tables).

use crate::result_error::ResultSieveError;

/// Structures that can verify their own internal consistency.
pub trait DebugInvariants {
    /// Panic on a broken invariant in debug builds or with `check-invariants`.
    fn debug_assert_invariants(&self);
    /// Check every invariant and report the first violation.
    fn validate_invariants(&self) -> Result<(), ResultSieveError>;
}

/// Returns `InvariantViolation` built from `msg` when `holds` is false.
#[inline]
pub fn ensure(holds: bool, msg: impl FnOnce() -> String) -> Result<(), ResultSieveError> {
    if holds {
        Ok(())
    } else {
        Err(ResultSieveError::InvariantViolation(msg()))
    }
}

/// Run a fallible invariant check and panic with context when checking is enabled.
#[macro_export]
macro_rules! debug_invariants {
    ($expr:expr, $($ctx:tt)*) => {
        #[cfg(any(debug_assertions, feature = "strict-invariants", feature = "check-invariants"))]
        if let Err(e) = $expr {
            panic!(concat!("[invariants] ", $($ctx)*, ": {}"), e);
        }
    };
}

//! Re-export public algorithms.

pub mod invariants;
pub mod reduction;

pub use invariants::{FieldSelector, Invariant, derive_invariant};
pub use reduction::{
    ArithmeticMean, IpSample, PerIpValues, ReducedValue, ReductionPolicy, sum_over_set,
};

#![cfg_attr(docsrs, feature(doc_cfg))]
//! # result-sieve
//!
//! result-sieve extracts field output (displacements, stresses, plastic strain, ...) from a
//! finite-element result database for a named node or element set and reduces it to one value
//! per node or element. Integration-point data, which is discontinuous across element
//! boundaries, is averaged to nodes through the element adjacency of the owning instance.
//!
//! ## Features
//! - Node/element adjacency built once per instance and cached across queries
//! - Atlas/section storage of nodal, integration-point and centroid samples
//! - Five query shapes: nodal-unique, nodal-averaged, elemental-per-IP, elemental-averaged,
//!   elemental-unique
//! - Derived stress invariants (`MISES`, `PRESS`, `INV3`) and history queries over all frames
//! - Pluggable averaging through [`ReductionPolicy`](crate::algs::reduction::ReductionPolicy)
//! - Abaqus `.inp` mesh and set reader feeding an in-memory result database
//! - Optional `rayon` feature for parallel per-entity reduction
//!
//! ## Failure granularity
//!
//! Missing data for one entity never becomes a zero. By default the failing entity is listed in
//! [`QueryOutcome::failures`](crate::query::QueryOutcome) and its siblings still produce rows;
//! [`FailureMode::Abort`](crate::config::FailureMode) fails the whole query instead.
//!
//! ## Usage
//! Add `result-sieve` as a dependency in your `Cargo.toml` and enable features as needed:
//!
//! ```toml
//! [dependencies]
//! result-sieve = "0.3"
//! # Optional features:
//! # features = ["rayon"]
//! ```

pub mod algs;
pub mod config;
pub mod data;
pub mod debug_invariants;
pub mod io;
pub mod query;
pub mod result_error;
pub mod topology;

pub use debug_invariants::DebugInvariants;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algs::invariants::{FieldSelector, Invariant};
    pub use crate::algs::reduction::{
        ArithmeticMean, IpSample, PerIpValues, ReducedValue, ReductionPolicy,
    };
    pub use crate::config::{FailureMode, LabelOrder, QueryOptions};
    pub use crate::data::field::{
        FieldDescriptor, FieldLocation, FieldRecord, FieldType, FrameRef, StepInfo,
    };
    pub use crate::data::field_table::{FieldTable, Sample};
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::io::abaqus_inp::InpReader;
    pub use crate::io::memory::InMemoryDatabase;
    pub use crate::io::{InstanceMatch, MeshModel, MeshReader, ResultDatabase};
    pub use crate::query::{
        EntityFailure, HistoryFrame, QueryOutcome, QueryShape, ResultQuery, ShapedOutcome,
    };
    pub use crate::result_error::ResultSieveError;
    pub use crate::topology::cache::{AdjacencyCache, InvalidateCache};
    pub use crate::topology::element_type::ElementType;
    pub use crate::topology::entity::{EntityId, EntityKind};
    pub use crate::topology::instance::Instance;
    pub use crate::topology::sets::EntitySet;
}

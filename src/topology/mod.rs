//! Top-level module for mesh topology.
//!
//! This module provides the mesh side of result extraction:
//! - Entity labels and element types
//! - Instances owning nodes and elements
//! - Node/element adjacency and its per-instance cache
//! - Named sets and their resolution to one instance
//!
//! Most users only touch [`Instance`] and [`EntitySet`] directly; the query
//! facade builds and caches adjacency on its own.

pub mod adjacency;
pub mod cache;
pub mod element_type;
pub mod entity;
pub mod instance;
pub mod sets;

pub use adjacency::AdjacencyIndex;
pub use cache::{AdjacencyCache, InvalidateCache};
pub use element_type::ElementType;
pub use entity::{EntityId, EntityKind};
pub use instance::{Element, Instance, Node};
pub use sets::{EntitySet, ResolvedSet, SetMember, resolve_set};

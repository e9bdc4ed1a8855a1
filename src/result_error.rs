//! ResultSieveError: Unified error type for result-sieve public APIs
//!
//! Every extraction and reduction entry point reports failures through this
//! type. Variants carry the offending entity, set, or field so callers get a
//! labeled error instead of a zero-filled value.

use crate::data::field::{FieldLocation, FrameRef};
use crate::query::QueryShape;
use crate::topology::entity::{EntityId, EntityKind};
use thiserror::Error;

/// Unified error type for result-sieve operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ResultSieveError {
    /// Attempted to construct an `EntityId` from a zero label.
    #[error("EntityId must be non-zero (0 is not a valid node or element label)")]
    InvalidEntityId,
    /// A node or element id is not part of the instance.
    #[error("{kind} {id} does not exist in instance `{instance}`")]
    UnknownEntity {
        kind: EntityKind,
        id: EntityId,
        instance: String,
    },
    /// No instance with this name exists in the database.
    #[error("instance `{0}` is not defined in the assembly")]
    UnknownInstance(String),
    /// No set of the requested kind has this name.
    #[error("{kind} set `{name}` does not exist")]
    UnknownSet { name: String, kind: EntityKind },
    /// A set references members of more than one instance.
    #[error("set `{name}` spans several instances ({}); only single-instance sets are supported", .instances.join(", "))]
    MultiInstanceSet { name: String, instances: Vec<String> },
    /// A set has no members, so it cannot be scoped to an instance.
    #[error("set `{0}` has no members")]
    EmptySet(String),
    /// No sample exists for the entity at this location in this frame.
    #[error("field `{field}` has no {location} data for entity {entity}")]
    MissingFieldData {
        field: String,
        location: FieldLocation,
        entity: EntityId,
    },
    /// The requested query shape does not match the field's native location.
    #[error("field `{field}` is stored at {native}; query shape {requested} is not applicable")]
    ShapeMismatch {
        field: String,
        native: FieldLocation,
        requested: QueryShape,
    },
    /// The field output was not requested for the frame.
    #[error("field `{field}` is not available in {frame}")]
    UnknownField { field: String, frame: FrameRef },
    /// The frame does not exist in the database.
    #[error("{0} does not exist")]
    UnknownFrame(FrameRef),
    /// The same node or element id was added twice to an instance.
    #[error("duplicate {kind} {id} in instance `{instance}`")]
    DuplicateEntity {
        kind: EntityKind,
        id: EntityId,
        instance: String,
    },
    /// Two records of one field target the same sample point.
    #[error("field `{field}` has more than one {location} sample for entity {entity}{}", .ip.map(|ip| format!(" at integration point {ip}")).unwrap_or_default())]
    DuplicateSample {
        field: String,
        location: FieldLocation,
        entity: EntityId,
        ip: Option<u16>,
    },
    /// A record's component-vector does not match the field's component count.
    #[error("field `{field}` expects {expected} components, entity {entity} has {found}")]
    ComponentCountMismatch {
        field: String,
        entity: EntityId,
        expected: usize,
        found: usize,
    },
    /// Integration point number is zero or exceeds the element type's count.
    #[error("element {element} has no integration point {ip} (element type declares {declared})")]
    InvalidIntegrationPoint {
        element: EntityId,
        ip: u16,
        declared: u16,
    },
    /// A derived invariant was requested for a field that is not a stress-like tensor.
    #[error("invariant {invariant} needs a 4- or 6-component tensor; field `{field}` has {components} components")]
    UnsupportedInvariant {
        invariant: String,
        field: String,
        components: usize,
    },
    /// Input-file parse failure.
    #[error("mesh input parse error: {0}")]
    MeshIoParse(String),
    /// Underlying I/O failure while reading mesh input.
    #[error("I/O error: {0}")]
    Io(String),
    /// A data structure failed its invariant check.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

impl From<std::io::Error> for ResultSieveError {
    fn from(err: std::io::Error) -> Self {
        ResultSieveError::Io(err.to_string())
    }
}

impl ResultSieveError {
    /// True for errors that concern a single entity of a query rather than the
    /// query as a whole.
    pub fn is_per_entity(&self) -> bool {
        matches!(
            self,
            ResultSieveError::MissingFieldData { .. }
                | ResultSieveError::UnknownEntity { .. }
                | ResultSieveError::InvalidIntegrationPoint { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eid(raw: u64) -> EntityId {
        EntityId::new(raw).unwrap()
    }

    #[test]
    fn messages_name_the_offender() {
        let err = ResultSieveError::MissingFieldData {
            field: "PEEQ".into(),
            location: FieldLocation::IntegrationPoint,
            entity: eid(42),
        };
        let msg = err.to_string();
        assert!(msg.contains("PEEQ"), "{msg}");
        assert!(msg.contains("42"), "{msg}");

        let err = ResultSieveError::MultiInstanceSet {
            name: "TOP".into(),
            instances: vec!["PART-1-1".into(), "PART-2-1".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("PART-1-1, PART-2-1"), "{msg}");
    }

    #[test]
    fn duplicate_sample_mentions_ip_only_when_present() {
        let with_ip = ResultSieveError::DuplicateSample {
            field: "S".into(),
            location: FieldLocation::IntegrationPoint,
            entity: eid(3),
            ip: Some(2),
        };
        assert!(with_ip.to_string().ends_with("at integration point 2"));
        let without = ResultSieveError::DuplicateSample {
            field: "U".into(),
            location: FieldLocation::Nodal,
            entity: eid(3),
            ip: None,
        };
        assert!(!without.to_string().contains("integration point"));
    }

    #[test]
    fn per_entity_classification() {
        let missing = ResultSieveError::MissingFieldData {
            field: "S".into(),
            location: FieldLocation::Centroid,
            entity: eid(1),
        };
        assert!(missing.is_per_entity());
        assert!(!ResultSieveError::EmptySet("X".into()).is_per_entity());
    }
}

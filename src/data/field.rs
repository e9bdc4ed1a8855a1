//! Field metadata and raw field records.
//!
//! A [`FieldRecord`] is one sample of one field in one frame, as handed over
//! by the database reader. [`FieldDescriptor`] states where the field lives
//! natively and how many components each sample carries.

use crate::result_error::ResultSieveError;
use crate::topology::entity::EntityId;
use num_traits::ToPrimitive;
use std::fmt;

/// Where a field's samples are located.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub enum FieldLocation {
    /// One sample per node.
    Nodal,
    /// One sample per element integration point.
    IntegrationPoint,
    /// One sample per element, at its centroid.
    Centroid,
}

impl fmt::Display for FieldLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FieldLocation::Nodal => "nodal",
            FieldLocation::IntegrationPoint => "integration point",
            FieldLocation::Centroid => "centroid",
        })
    }
}

/// Mathematical kind of a field.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum FieldType {
    Scalar,
    Vector,
    Tensor,
}

impl FieldType {
    /// Component count of the 3D layout: 1, 3, or 6 (symmetric tensor).
    pub const fn default_components(self) -> usize {
        match self {
            FieldType::Scalar => 1,
            FieldType::Vector => 3,
            FieldType::Tensor => 6,
        }
    }
}

const TENSOR_SUFFIXES: [&str; 6] = ["11", "22", "33", "12", "13", "23"];

/// Name, type, native location, and component labels of a field.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub field_type: FieldType,
    pub location: FieldLocation,
    pub component_labels: Vec<String>,
}

impl FieldDescriptor {
    /// Descriptor with the 3D component labels of `field_type`
    /// (`S11 S22 S33 S12 S13 S23`, `U1 U2 U3`, or the name for scalars).
    pub fn new(name: impl Into<String>, field_type: FieldType, location: FieldLocation) -> Self {
        let name = name.into();
        let component_labels = match field_type {
            FieldType::Scalar => vec![name.clone()],
            FieldType::Vector => (1..=3).map(|i| format!("{name}{i}")).collect(),
            FieldType::Tensor => TENSOR_SUFFIXES
                .iter()
                .map(|s| format!("{name}{s}"))
                .collect(),
        };
        Self {
            name,
            field_type,
            location,
            component_labels,
        }
    }

    /// Replaces the component labels, e.g. for 2D layouts (`S11 S22 S33 S12`).
    pub fn with_components<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.component_labels = labels.into_iter().map(Into::into).collect();
        self
    }

    /// Components per sample.
    pub fn component_count(&self) -> usize {
        self.component_labels.len()
    }
}

/// One raw sample: the entity, its location, and its component-vector.
///
/// For integration-point samples `entity` is the element and
/// `integration_point` the 1-based IP number.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FieldRecord {
    pub entity: EntityId,
    pub location: FieldLocation,
    pub integration_point: Option<u16>,
    pub values: Vec<f64>,
}

impl FieldRecord {
    pub fn nodal(node: EntityId, values: impl Into<Vec<f64>>) -> Self {
        Self {
            entity: node,
            location: FieldLocation::Nodal,
            integration_point: None,
            values: values.into(),
        }
    }

    pub fn integration_point(element: EntityId, ip: u16, values: impl Into<Vec<f64>>) -> Self {
        Self {
            entity: element,
            location: FieldLocation::IntegrationPoint,
            integration_point: Some(ip),
            values: values.into(),
        }
    }

    pub fn centroid(element: EntityId, values: impl Into<Vec<f64>>) -> Self {
        Self {
            entity: element,
            location: FieldLocation::Centroid,
            integration_point: None,
            values: values.into(),
        }
    }

    /// Record from single- or double-precision (or integer) components,
    /// widened to `f64` without reordering.
    ///
    /// # Errors
    /// `MeshIoParse` if a component has no `f64` representation.
    pub fn from_components<T: ToPrimitive>(
        entity: EntityId,
        location: FieldLocation,
        integration_point: Option<u16>,
        raw: &[T],
    ) -> Result<Self, ResultSieveError> {
        let values = raw
            .iter()
            .map(|c| {
                c.to_f64().ok_or_else(|| {
                    ResultSieveError::MeshIoParse(format!(
                        "component of entity {entity} is not representable as f64"
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            entity,
            location,
            integration_point,
            values,
        })
    }
}

/// A frame, addressed by step index and frame index within the step.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub struct FrameRef {
    pub step: usize,
    pub frame: usize,
}

impl FrameRef {
    pub const fn new(step: usize, frame: usize) -> Self {
        Self { step, frame }
    }
}

impl fmt::Display for FrameRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "step {} frame {}", self.step, self.frame)
    }
}

/// One analysis step and the frame values (step time or load fraction) of
/// its frames.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StepInfo {
    pub name: String,
    pub frame_values: Vec<f64>,
}

impl StepInfo {
    /// Run completion of frame `frame` of step `step_index`: the step index
    /// plus the frame value, so values increase monotonically across steps.
    pub fn run_completion(&self, step_index: usize, frame: usize) -> Option<f64> {
        self.frame_values
            .get(frame)
            .map(|value| step_index as f64 + value)
    }
}

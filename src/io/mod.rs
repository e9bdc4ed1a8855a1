//! Result-database access.
//!
//! The reduction core never opens result files itself. It talks to a
//! [`ResultDatabase`], which hands out instances, sets, step metadata and raw
//! field records. [`memory::InMemoryDatabase`] is the bundled implementation;
//! [`abaqus_inp::InpReader`] reads the mesh and sets of an input file into a
//! [`MeshModel`] that seeds it.

pub mod abaqus_inp;
pub mod memory;

use crate::data::field::{FieldDescriptor, FieldLocation, FieldRecord, FrameRef, StepInfo};
use crate::result_error::ResultSieveError;
use crate::topology::entity::EntityKind;
use crate::topology::instance::Instance;
use crate::topology::sets::EntitySet;
use std::io::Read;

/// Instances and sets read from a mesh description.
#[derive(Clone, Debug, Default)]
pub struct MeshModel {
    pub instances: Vec<Instance>,
    pub sets: Vec<EntitySet>,
}

impl MeshModel {
    pub fn instance(&self, name: &str) -> Option<&Instance> {
        self.instances.iter().find(|i| i.name() == name)
    }

    pub fn set(&self, name: &str, kind: EntityKind) -> Option<&EntitySet> {
        self.sets
            .iter()
            .find(|s| s.name() == name && s.kind() == kind)
    }
}

/// Readers that produce a [`MeshModel`] from text input.
pub trait MeshReader {
    fn read<R: Read>(&self, reader: R) -> Result<MeshModel, ResultSieveError>;
}

/// How [`ResultDatabase::find_instance`] matches names.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum InstanceMatch {
    #[default]
    Exact,
    /// First instance, in name order, whose name contains the text.
    Partial,
}

/// Read access to one result database.
pub trait ResultDatabase {
    /// Names of all instances.
    fn instance_names(&self) -> Vec<&str>;

    /// # Errors
    /// `UnknownInstance` if no instance has this exact name.
    fn instance(&self, name: &str) -> Result<&Instance, ResultSieveError>;

    /// Named node or element set with its member `(instance, id)` pairs.
    ///
    /// # Errors
    /// `UnknownSet` if no set of `kind` has this name.
    fn set(&self, name: &str, kind: EntityKind) -> Result<&EntitySet, ResultSieveError>;

    /// Steps in analysis order.
    fn steps(&self) -> &[StepInfo];

    /// Descriptor of a field output in one frame.
    ///
    /// # Errors
    /// `UnknownFrame` for a frame outside the database, `UnknownField` when
    /// the field was not written in that frame.
    fn field_descriptor(
        &self,
        field: &str,
        frame: FrameRef,
    ) -> Result<FieldDescriptor, ResultSieveError>;

    /// Raw records of `field` at `location` for one instance.
    fn field_records(
        &self,
        instance: &str,
        field: &str,
        frame: FrameRef,
        location: FieldLocation,
    ) -> Result<Vec<FieldRecord>, ResultSieveError>;

    /// Instance lookup by exact or partial name.
    fn find_instance(
        &self,
        name: &str,
        mode: InstanceMatch,
    ) -> Result<&Instance, ResultSieveError> {
        match mode {
            InstanceMatch::Exact => self.instance(name),
            InstanceMatch::Partial => {
                let mut names = self.instance_names();
                names.sort_unstable();
                let found = names
                    .into_iter()
                    .find(|candidate| candidate.contains(name))
                    .ok_or_else(|| ResultSieveError::UnknownInstance(name.to_string()))?;
                self.instance(found)
            }
        }
    }

    /// Every frame of every step, in analysis order.
    fn frames(&self) -> Vec<FrameRef> {
        self.steps()
            .iter()
            .enumerate()
            .flat_map(|(step, info)| {
                (0..info.frame_values.len()).map(move |frame| FrameRef::new(step, frame))
            })
            .collect()
    }

    /// Last frame of `step`, the usual frame to report.
    fn last_frame(&self, step: usize) -> Result<FrameRef, ResultSieveError> {
        self.steps()
            .get(step)
            .and_then(|info| info.frame_values.len().checked_sub(1))
            .map(|frame| FrameRef::new(step, frame))
            .ok_or(ResultSieveError::UnknownFrame(FrameRef::new(step, 0)))
    }

    /// Run completion of a frame: step index plus frame value.
    fn run_completion(&self, frame: FrameRef) -> Result<f64, ResultSieveError> {
        self.steps()
            .get(frame.step)
            .and_then(|step| step.run_completion(frame.step, frame.frame))
            .ok_or(ResultSieveError::UnknownFrame(frame))
    }
}

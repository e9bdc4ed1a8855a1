//! In-memory result database.
//!
//! Holds instances, sets, step metadata and field records in plain maps.
//! Used directly by tests and scripts, and as the landing place for meshes
//! read with [`InpReader`](crate::io::abaqus_inp::InpReader).

use crate::data::field::{FieldDescriptor, FieldLocation, FieldRecord, FrameRef, StepInfo};
use crate::io::{MeshModel, ResultDatabase};
use crate::result_error::ResultSieveError;
use crate::topology::entity::EntityKind;
use crate::topology::instance::Instance;
use crate::topology::sets::EntitySet;
use std::collections::{BTreeMap, HashMap};

#[derive(Clone, Debug)]
struct FieldOutput {
    descriptor: FieldDescriptor,
    /// Records per instance name, in insertion order.
    records: HashMap<String, Vec<FieldRecord>>,
}

/// A result database kept entirely in memory.
#[derive(Clone, Debug, Default)]
pub struct InMemoryDatabase {
    instances: BTreeMap<String, Instance>,
    sets: BTreeMap<(EntityKind, String), EntitySet>,
    steps: Vec<StepInfo>,
    outputs: HashMap<FrameRef, BTreeMap<String, FieldOutput>>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Database seeded with the instances and sets of a mesh model.
    pub fn from_mesh_model(model: MeshModel) -> Self {
        let mut db = Self::new();
        for instance in model.instances {
            db.add_instance(instance);
        }
        for set in model.sets {
            db.add_set(set);
        }
        db
    }

    /// Adds an instance, replacing one of the same name.
    pub fn add_instance(&mut self, instance: Instance) -> &mut Self {
        self.instances.insert(instance.name().to_string(), instance);
        self
    }

    /// Adds a set, replacing one of the same name and kind.
    pub fn add_set(&mut self, set: EntitySet) -> &mut Self {
        self.sets.insert((set.kind(), set.name().to_string()), set);
        self
    }

    /// Appends a step and returns its index.
    pub fn add_step(&mut self, name: impl Into<String>, frame_values: Vec<f64>) -> usize {
        self.steps.push(StepInfo {
            name: name.into(),
            frame_values,
        });
        self.steps.len() - 1
    }

    /// Declares that `descriptor.name` was written in `frame`.
    ///
    /// # Errors
    /// `UnknownFrame` if the frame was not added with [`add_step`](Self::add_step).
    pub fn declare_field(
        &mut self,
        frame: FrameRef,
        descriptor: FieldDescriptor,
    ) -> Result<&mut Self, ResultSieveError> {
        self.check_frame(frame)?;
        self.outputs.entry(frame).or_default().insert(
            descriptor.name.clone(),
            FieldOutput {
                descriptor,
                records: HashMap::new(),
            },
        );
        Ok(self)
    }

    /// Appends records of a declared field for one instance.
    ///
    /// # Errors
    /// `UnknownFrame`, `UnknownField` (not declared in the frame) or
    /// `UnknownInstance`.
    pub fn add_records(
        &mut self,
        frame: FrameRef,
        field: &str,
        instance: &str,
        records: impl IntoIterator<Item = FieldRecord>,
    ) -> Result<&mut Self, ResultSieveError> {
        self.check_frame(frame)?;
        if !self.instances.contains_key(instance) {
            return Err(ResultSieveError::UnknownInstance(instance.to_string()));
        }
        let output = self
            .outputs
            .get_mut(&frame)
            .and_then(|fields| fields.get_mut(field))
            .ok_or_else(|| ResultSieveError::UnknownField {
                field: field.to_string(),
                frame,
            })?;
        output
            .records
            .entry(instance.to_string())
            .or_default()
            .extend(records);
        Ok(self)
    }

    fn check_frame(&self, frame: FrameRef) -> Result<(), ResultSieveError> {
        let exists = self
            .steps
            .get(frame.step)
            .is_some_and(|step| frame.frame < step.frame_values.len());
        if exists {
            Ok(())
        } else {
            Err(ResultSieveError::UnknownFrame(frame))
        }
    }

    fn output(&self, field: &str, frame: FrameRef) -> Result<&FieldOutput, ResultSieveError> {
        self.check_frame(frame)?;
        self.outputs
            .get(&frame)
            .and_then(|fields| fields.get(field))
            .ok_or_else(|| ResultSieveError::UnknownField {
                field: field.to_string(),
                frame,
            })
    }
}

impl ResultDatabase for InMemoryDatabase {
    fn instance_names(&self) -> Vec<&str> {
        self.instances.keys().map(String::as_str).collect()
    }

    fn instance(&self, name: &str) -> Result<&Instance, ResultSieveError> {
        self.instances
            .get(name)
            .ok_or_else(|| ResultSieveError::UnknownInstance(name.to_string()))
    }

    fn set(&self, name: &str, kind: EntityKind) -> Result<&EntitySet, ResultSieveError> {
        self.sets
            .get(&(kind, name.to_string()))
            .ok_or_else(|| ResultSieveError::UnknownSet {
                name: name.to_string(),
                kind,
            })
    }

    fn steps(&self) -> &[StepInfo] {
        &self.steps
    }

    fn field_descriptor(
        &self,
        field: &str,
        frame: FrameRef,
    ) -> Result<FieldDescriptor, ResultSieveError> {
        Ok(self.output(field, frame)?.descriptor.clone())
    }

    fn field_records(
        &self,
        instance: &str,
        field: &str,
        frame: FrameRef,
        location: FieldLocation,
    ) -> Result<Vec<FieldRecord>, ResultSieveError> {
        self.instance(instance)?;
        let output = self.output(field, frame)?;
        Ok(output
            .records
            .get(instance)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| r.location == location)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

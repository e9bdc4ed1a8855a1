//! Normalized per-entity values of one field in one frame.
//!
//! Raw records arrive in whatever order the database produces them and mix
//! locations. [`FieldTable`] partitions them by location, validates component
//! counts once, and answers lookups by [`Sample`]. Absent data is reported as
//! `MissingFieldData`; nothing is defaulted to zero.

use crate::data::field::{FieldDescriptor, FieldLocation, FieldRecord, FrameRef};
use crate::data::section::Section;
use crate::debug_invariants::{DebugInvariants, ensure};
use crate::result_error::ResultSieveError;
use crate::topology::entity::EntityId;
use std::collections::HashMap;

/// Address of one sample point of a field.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Sample {
    Node(EntityId),
    Centroid(EntityId),
    /// Element and 1-based integration point number.
    IntegrationPoint(EntityId, u16),
}

impl Sample {
    pub fn location(self) -> FieldLocation {
        match self {
            Sample::Node(_) => FieldLocation::Nodal,
            Sample::Centroid(_) => FieldLocation::Centroid,
            Sample::IntegrationPoint(..) => FieldLocation::IntegrationPoint,
        }
    }

    /// The node or element the sample belongs to.
    pub fn entity(self) -> EntityId {
        match self {
            Sample::Node(id) | Sample::Centroid(id) | Sample::IntegrationPoint(id, _) => id,
        }
    }
}

/// Field values of one frame, partitioned by location.
///
/// # Invariants
/// - Every stored slice has `descriptor.component_count()` values.
/// - `ip_numbers[e]` lists, ascending and without repeats, exactly the IPs of
///   `e` present in `integration`.
#[derive(Clone, Debug)]
pub struct FieldTable {
    descriptor: FieldDescriptor,
    frame: FrameRef,
    nodal: Section<EntityId>,
    centroid: Section<EntityId>,
    integration: Section<(EntityId, u16)>,
    ip_numbers: HashMap<EntityId, Vec<u16>>,
    ip_elements: Vec<EntityId>,
}

impl FieldTable {
    /// Empty table for `descriptor` in `frame`.
    pub fn new(descriptor: FieldDescriptor, frame: FrameRef) -> Self {
        Self {
            descriptor,
            frame,
            nodal: Section::default(),
            centroid: Section::default(),
            integration: Section::default(),
            ip_numbers: HashMap::new(),
            ip_elements: Vec::new(),
        }
    }

    /// Normalizes raw records into a table.
    ///
    /// # Errors
    /// - `ComponentCountMismatch` if a record's length differs from the descriptor;
    /// - `DuplicateSample` if two records address the same sample;
    /// - `InvalidIntegrationPoint` for an IP record without a (non-zero) IP number.
    pub fn from_records(
        descriptor: FieldDescriptor,
        frame: FrameRef,
        records: impl IntoIterator<Item = FieldRecord>,
    ) -> Result<Self, ResultSieveError> {
        let mut table = Self::new(descriptor, frame);
        for record in records {
            table.try_insert(&record)?;
        }
        crate::debug_invariants!(table.validate_invariants(), "FieldTable::from_records");
        Ok(table)
    }

    /// Adds one record.
    pub fn try_insert(&mut self, record: &FieldRecord) -> Result<(), ResultSieveError> {
        let expected = self.descriptor.component_count();
        if record.values.len() != expected {
            return Err(ResultSieveError::ComponentCountMismatch {
                field: self.descriptor.name.clone(),
                entity: record.entity,
                expected,
                found: record.values.len(),
            });
        }
        let sample = match record.location {
            FieldLocation::Nodal => Sample::Node(record.entity),
            FieldLocation::Centroid => Sample::Centroid(record.entity),
            FieldLocation::IntegrationPoint => match record.integration_point {
                Some(ip) if ip > 0 => Sample::IntegrationPoint(record.entity, ip),
                other => {
                    return Err(ResultSieveError::InvalidIntegrationPoint {
                        element: record.entity,
                        ip: other.unwrap_or(0),
                        declared: 0,
                    });
                }
            },
        };
        if self.has_sample(sample) {
            return Err(ResultSieveError::DuplicateSample {
                field: self.descriptor.name.clone(),
                location: sample.location(),
                entity: sample.entity(),
                ip: match sample {
                    Sample::IntegrationPoint(_, ip) => Some(ip),
                    _ => None,
                },
            });
        }
        match sample {
            Sample::Node(id) => self.nodal.try_push(id, &record.values),
            Sample::Centroid(id) => self.centroid.try_push(id, &record.values),
            Sample::IntegrationPoint(element, ip) => {
                self.integration.try_push((element, ip), &record.values)?;
                if !self.ip_numbers.contains_key(&element) {
                    self.ip_elements.push(element);
                }
                let ips = self.ip_numbers.entry(element).or_default();
                let pos = ips.partition_point(|&n| n < ip);
                ips.insert(pos, ip);
                Ok(())
            }
        }
    }

    pub fn descriptor(&self) -> &FieldDescriptor {
        &self.descriptor
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn frame(&self) -> FrameRef {
        self.frame
    }

    /// Location the field is natively stored at.
    pub fn native_location(&self) -> FieldLocation {
        self.descriptor.location
    }

    pub fn component_count(&self) -> usize {
        self.descriptor.component_count()
    }

    /// Whether a record exists for `sample`.
    pub fn has_sample(&self, sample: Sample) -> bool {
        match sample {
            Sample::Node(id) => self.nodal.contains(&id),
            Sample::Centroid(id) => self.centroid.contains(&id),
            Sample::IntegrationPoint(element, ip) => self.integration.contains(&(element, ip)),
        }
    }

    /// Component-vector of one sample, verbatim from its record.
    ///
    /// # Errors
    /// `MissingFieldData` if no record exists for the sample in this frame.
    pub fn values_at(&self, sample: Sample) -> Result<&[f64], ResultSieveError> {
        let found = match sample {
            Sample::Node(id) => self.nodal.try_restrict(&id),
            Sample::Centroid(id) => self.centroid.try_restrict(&id),
            Sample::IntegrationPoint(element, ip) => self.integration.try_restrict(&(element, ip)),
        };
        found.ok_or_else(|| self.missing(sample.location(), sample.entity()))
    }

    /// All IP samples of `element` as `(ip, values)`, ascending by IP number.
    ///
    /// # Errors
    /// `MissingFieldData` if the element has no IP records.
    pub fn integration_points(
        &self,
        element: EntityId,
    ) -> Result<Vec<(u16, &[f64])>, ResultSieveError> {
        let ips = self
            .ip_numbers
            .get(&element)
            .ok_or_else(|| self.missing(FieldLocation::IntegrationPoint, element))?;
        ips.iter()
            .map(|&ip| Ok((ip, self.values_at(Sample::IntegrationPoint(element, ip))?)))
            .collect()
    }

    /// Number of IP samples of `element` (0 if none).
    pub fn ip_count(&self, element: EntityId) -> usize {
        self.ip_numbers.get(&element).map_or(0, Vec::len)
    }

    /// Entities with samples at `location`, in first-seen order.
    pub fn entities(&self, location: FieldLocation) -> Vec<EntityId> {
        match location {
            FieldLocation::Nodal => self.nodal.atlas().keys().collect(),
            FieldLocation::Centroid => self.centroid.atlas().keys().collect(),
            FieldLocation::IntegrationPoint => self.ip_elements.clone(),
        }
    }

    /// Number of samples stored at `location`.
    pub fn sample_count(&self, location: FieldLocation) -> usize {
        match location {
            FieldLocation::Nodal => self.nodal.len(),
            FieldLocation::Centroid => self.centroid.len(),
            FieldLocation::IntegrationPoint => self.integration.len(),
        }
    }

    /// New table under `descriptor` with `f` applied to every sample's values.
    ///
    /// The returned vectors must have `descriptor.component_count()` entries.
    pub fn try_map_samples<F>(
        &self,
        descriptor: FieldDescriptor,
        mut f: F,
    ) -> Result<FieldTable, ResultSieveError>
    where
        F: FnMut(&[f64]) -> Result<Vec<f64>, ResultSieveError>,
    {
        let mut out = FieldTable::new(descriptor, self.frame);
        for (id, values) in self.nodal.iter() {
            out.try_insert(&FieldRecord::nodal(id, f(values)?))?;
        }
        for (id, values) in self.centroid.iter() {
            out.try_insert(&FieldRecord::centroid(id, f(values)?))?;
        }
        for ((element, ip), values) in self.integration.iter() {
            out.try_insert(&FieldRecord::integration_point(element, ip, f(values)?))?;
        }
        Ok(out)
    }

    fn missing(&self, location: FieldLocation, entity: EntityId) -> ResultSieveError {
        ResultSieveError::MissingFieldData {
            field: self.descriptor.name.clone(),
            location,
            entity,
        }
    }
}

impl DebugInvariants for FieldTable {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "FieldTable invalid");
    }

    fn validate_invariants(&self) -> Result<(), ResultSieveError> {
        self.nodal.validate_invariants()?;
        self.centroid.validate_invariants()?;
        self.integration.validate_invariants()?;
        let n = self.component_count();
        let nodal = self.nodal.iter().map(|(_, v)| v.len());
        let centroid = self.centroid.iter().map(|(_, v)| v.len());
        let ip = self.integration.iter().map(|(_, v)| v.len());
        ensure(nodal.chain(centroid).chain(ip).all(|len| len == n), || {
            format!("field `{}` has a sample without {n} components", self.name())
        })?;
        let listed: usize = self.ip_numbers.values().map(Vec::len).sum();
        ensure(listed == self.integration.len(), || {
            format!(
                "ip index lists {listed} samples, section holds {}",
                self.integration.len()
            )
        })?;
        for (element, ips) in &self.ip_numbers {
            ensure(ips.windows(2).all(|w| w[0] < w[1]), || {
                format!("ip numbers of element {element} not strictly ascending")
            })?;
            for &ip in ips {
                ensure(self.integration.contains(&(*element, ip)), || {
                    format!("ip {ip} of element {element} indexed but not stored")
                })?;
            }
        }
        ensure(self.ip_elements.len() == self.ip_numbers.len(), || {
            "ip element order out of sync".to_string()
        })
    }
}

//! Reduction of discontinuous field samples to one value per node or element.
//!
//! Every reducer takes the ids to reduce, in output order, and returns one
//! `Result` per id so a failing entity never hides its siblings. The caller
//! decides whether a failure aborts the whole query.
//!
//! Averaging goes through a [`ReductionPolicy`]. [`ArithmeticMean`] is the
//! unweighted component-wise mean; alternative weighting or outlier handling
//! plugs in there without touching adjacency or set resolution.

use crate::data::field::FieldLocation;
use crate::data::field_table::{FieldTable, Sample};
use crate::result_error::ResultSieveError;
use crate::topology::adjacency::AdjacencyIndex;
use crate::topology::entity::EntityId;
use crate::topology::instance::Instance;
use std::fmt;

/// One output row: an entity, its reduced component-vector, and the number
/// of contributions that went into it.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ReducedValue {
    pub id: EntityId,
    pub values: Vec<f64>,
    pub sample_count: usize,
}

/// One integration-point sample of an element.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct IpSample {
    pub ip: u16,
    pub values: Vec<f64>,
}

/// Unreduced samples of one element, ascending by IP number.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PerIpValues {
    pub id: EntityId,
    pub samples: Vec<IpSample>,
}

impl PerIpValues {
    pub fn ip_count(&self) -> usize {
        self.samples.len()
    }
}

/// Turns the contributions for one entity into its reduced value.
///
/// `contributions` is never empty and all slices have the same length;
/// reducers report entities without contributions as `MissingFieldData`
/// before a policy is consulted.
pub trait ReductionPolicy: Send + Sync + fmt::Debug {
    fn reduce(&self, id: EntityId, contributions: &[&[f64]]) -> ReducedValue;
}

/// Unweighted component-wise arithmetic mean.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ArithmeticMean;

impl ReductionPolicy for ArithmeticMean {
    fn reduce(&self, id: EntityId, contributions: &[&[f64]]) -> ReducedValue {
        ReducedValue {
            id,
            values: component_mean(contributions),
            sample_count: contributions.len(),
        }
    }
}

/// Component-wise mean of equally long slices; empty for no input.
pub fn component_mean(contributions: &[&[f64]]) -> Vec<f64> {
    let Some(first) = contributions.first() else {
        return Vec::new();
    };
    let mut acc = vec![0.0; first.len()];
    for values in contributions {
        for (sum, v) in acc.iter_mut().zip(values.iter()) {
            *sum += v;
        }
    }
    let n = contributions.len() as f64;
    for sum in &mut acc {
        *sum /= n;
    }
    acc
}

/// Applies `f` to each id, in parallel with the `rayon` feature. Output order
/// always matches `ids`.
fn map_ids<T, F>(ids: &[EntityId], f: F) -> Vec<Result<T, ResultSieveError>>
where
    T: Send,
    F: Fn(EntityId) -> Result<T, ResultSieveError> + Sync + Send,
{
    #[cfg(feature = "rayon")]
    {
        use rayon::prelude::*;
        ids.par_iter().map(|&id| f(id)).collect()
    }
    #[cfg(not(feature = "rayon"))]
    {
        ids.iter().map(|&id| f(id)).collect()
    }
}

/// Nodal field: each node's recorded vector, unchanged.
pub fn nodal_unique(
    table: &FieldTable,
    nodes: &[EntityId],
) -> Vec<Result<ReducedValue, ResultSieveError>> {
    map_ids(nodes, |node| {
        let values = table.values_at(Sample::Node(node))?;
        Ok(ReducedValue {
            id: node,
            values: values.to_vec(),
            sample_count: 1,
        })
    })
}

/// IP field averaged to nodes.
///
/// For each node, every incident element's IP samples are first reduced to
/// one value per element, then those element values are reduced across the
/// elements. Elements without IP samples are left out of both the value and
/// `sample_count`; a node with no contributing element fails with
/// `MissingFieldData`. IP numbers are checked against each element's type as
/// in [`element_average`].
pub fn nodal_average_from_ip(
    table: &FieldTable,
    instance: &Instance,
    adjacency: &AdjacencyIndex,
    nodes: &[EntityId],
    policy: &dyn ReductionPolicy,
) -> Vec<Result<ReducedValue, ResultSieveError>> {
    map_ids(nodes, |node| {
        let mut per_element: Vec<Vec<f64>> = Vec::new();
        for &element in adjacency.incident_elements(node)? {
            if table.ip_count(element) == 0 {
                log::trace!(
                    "node {node}: element {element} has no `{}` samples, excluded",
                    table.name()
                );
                continue;
            }
            let samples = checked_ip_samples(table, instance, element)?;
            let slices: Vec<&[f64]> = samples.iter().map(|(_, v)| *v).collect();
            per_element.push(policy.reduce(element, &slices).values);
        }
        if per_element.is_empty() {
            return Err(ResultSieveError::MissingFieldData {
                field: table.name().to_string(),
                location: FieldLocation::IntegrationPoint,
                entity: node,
            });
        }
        let slices: Vec<&[f64]> = per_element.iter().map(Vec::as_slice).collect();
        Ok(policy.reduce(node, &slices))
    })
}

/// IP samples of `element`, checked against its element type.
fn checked_ip_samples<'t>(
    table: &'t FieldTable,
    instance: &Instance,
    element: EntityId,
) -> Result<Vec<(u16, &'t [f64])>, ResultSieveError> {
    let declared = instance.element(element)?.element_type.integration_points();
    let samples = table.integration_points(element)?;
    if let Some(declared) = declared {
        if let Some(&(ip, _)) = samples.iter().find(|(ip, _)| *ip > declared) {
            return Err(ResultSieveError::InvalidIntegrationPoint {
                element,
                ip,
                declared,
            });
        }
        if samples.len() < usize::from(declared) {
            log::warn!(
                "element {element}: `{}` has {} of {declared} integration points",
                table.name(),
                samples.len()
            );
        }
    }
    Ok(samples)
}

/// IP field per element, unreduced and ordered by IP number.
pub fn element_per_ip(
    table: &FieldTable,
    instance: &Instance,
    elements: &[EntityId],
) -> Vec<Result<PerIpValues, ResultSieveError>> {
    map_ids(elements, |element| {
        let samples = checked_ip_samples(table, instance, element)?
            .into_iter()
            .map(|(ip, values)| IpSample {
                ip,
                values: values.to_vec(),
            })
            .collect();
        Ok(PerIpValues {
            id: element,
            samples,
        })
    })
}

/// IP field reduced over each element's integration points.
pub fn element_average(
    table: &FieldTable,
    instance: &Instance,
    elements: &[EntityId],
    policy: &dyn ReductionPolicy,
) -> Vec<Result<ReducedValue, ResultSieveError>> {
    map_ids(elements, |element| {
        let samples = checked_ip_samples(table, instance, element)?;
        let slices: Vec<&[f64]> = samples.iter().map(|(_, v)| *v).collect();
        Ok(policy.reduce(element, &slices))
    })
}

/// Centroid field: each element's single value, unchanged.
pub fn element_unique(
    table: &FieldTable,
    elements: &[EntityId],
) -> Vec<Result<ReducedValue, ResultSieveError>> {
    map_ids(elements, |element| {
        let values = table.values_at(Sample::Centroid(element))?;
        Ok(ReducedValue {
            id: element,
            values: values.to_vec(),
            sample_count: 1,
        })
    })
}

/// Component-wise sum of all rows, e.g. the total reaction force of a node set.
/// `None` for no rows.
pub fn sum_over_set(rows: &[ReducedValue]) -> Option<Vec<f64>> {
    let (first, rest) = rows.split_first()?;
    let mut total = first.values.clone();
    for row in rest {
        for (acc, v) in total.iter_mut().zip(&row.values) {
            *acc += v;
        }
    }
    Some(total)
}

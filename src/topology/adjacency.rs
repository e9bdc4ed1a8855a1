//! Node/element adjacency of one instance.
//!
//! The index is built in a single scan of the instance's connectivity. Each
//! node's incident elements are kept in scan order, which makes every
//! traversal that follows (node averaging in particular) reproducible.

use crate::debug_invariants::{DebugInvariants, ensure};
use crate::result_error::ResultSieveError;
use crate::topology::entity::{EntityId, EntityKind};
use crate::topology::instance::Instance;
use hashbrown::HashMap;

/// Element→node and node→element maps for one instance.
///
/// # Invariants
/// - Every node of the instance has an entry in `node_to_elements`, possibly
///   empty.
/// - `e ∈ node_to_elements[n]` iff `n ∈ element_to_nodes[e]`.
/// - No element appears twice in one node's incident list.
#[derive(Clone, Debug)]
pub struct AdjacencyIndex {
    instance: String,
    source_version: u64,
    node_to_elements: HashMap<EntityId, Vec<EntityId>>,
    element_to_nodes: HashMap<EntityId, Vec<EntityId>>,
}

impl AdjacencyIndex {
    /// Builds the index from `instance` in one pass over its elements.
    ///
    /// # Complexity
    /// **O(N + Σ connectivity)**.
    pub fn build(instance: &Instance) -> Self {
        let mut node_to_elements: HashMap<EntityId, Vec<EntityId>> =
            HashMap::with_capacity(instance.node_count());
        for node in instance.nodes() {
            node_to_elements.insert(node.id, Vec::new());
        }
        let mut element_to_nodes = HashMap::with_capacity(instance.element_count());
        for element in instance.elements() {
            for &node in &element.connectivity {
                let incident = node_to_elements.entry(node).or_default();
                // an element listing a node twice still counts once
                if !incident.contains(&element.id) {
                    incident.push(element.id);
                }
            }
            element_to_nodes.insert(element.id, element.connectivity.clone());
        }
        let index = Self {
            instance: instance.name().to_string(),
            source_version: instance.version(),
            node_to_elements,
            element_to_nodes,
        };
        crate::debug_invariants!(index.validate_invariants(), "AdjacencyIndex::build");
        log::debug!(
            "built adjacency for instance `{}`: {} nodes, {} elements",
            index.instance,
            index.node_to_elements.len(),
            index.element_to_nodes.len()
        );
        index
    }

    /// Name of the instance this index describes.
    pub fn instance(&self) -> &str {
        &self.instance
    }

    /// Instance version the index was built from.
    pub fn source_version(&self) -> u64 {
        self.source_version
    }

    /// Elements incident to `node`, in connectivity-scan order.
    ///
    /// # Errors
    /// `UnknownEntity` if `node` is not a node of the instance.
    pub fn incident_elements(&self, node: EntityId) -> Result<&[EntityId], ResultSieveError> {
        self.node_to_elements
            .get(&node)
            .map(Vec::as_slice)
            .ok_or_else(|| self.unknown(EntityKind::Node, node))
    }

    /// Ordered connectivity of `element`.
    ///
    /// # Errors
    /// `UnknownEntity` if `element` is not an element of the instance.
    pub fn element_nodes(&self, element: EntityId) -> Result<&[EntityId], ResultSieveError> {
        self.element_to_nodes
            .get(&element)
            .map(Vec::as_slice)
            .ok_or_else(|| self.unknown(EntityKind::Element, element))
    }

    pub fn node_count(&self) -> usize {
        self.node_to_elements.len()
    }

    pub fn element_count(&self) -> usize {
        self.element_to_nodes.len()
    }

    fn unknown(&self, kind: EntityKind, id: EntityId) -> ResultSieveError {
        ResultSieveError::UnknownEntity {
            kind,
            id,
            instance: self.instance.clone(),
        }
    }
}

impl DebugInvariants for AdjacencyIndex {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "AdjacencyIndex");
    }

    fn validate_invariants(&self) -> Result<(), ResultSieveError> {
        for (&element, nodes) in &self.element_to_nodes {
            for node in nodes {
                let incident = self.node_to_elements.get(node).ok_or_else(|| {
                    ResultSieveError::InvariantViolation(format!(
                        "node {node} of element {element} has no adjacency entry"
                    ))
                })?;
                ensure(incident.contains(&element), || {
                    format!("element {element} missing from incident list of node {node}")
                })?;
            }
        }
        for (&node, incident) in &self.node_to_elements {
            for (i, element) in incident.iter().enumerate() {
                ensure(!incident[..i].contains(element), || {
                    format!("element {element} listed twice for node {node}")
                })?;
                let nodes = self.element_to_nodes.get(element).ok_or_else(|| {
                    ResultSieveError::InvariantViolation(format!(
                        "incident element {element} of node {node} is unknown"
                    ))
                })?;
                ensure(nodes.contains(&node), || {
                    format!("node {node} not in connectivity of element {element}")
                })?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::element_type::ElementType;

    fn eid(raw: u64) -> EntityId {
        EntityId::new(raw).unwrap()
    }

    fn two_triangles() -> Instance {
        Instance::from_connectivity(
            "PART-1-1",
            [
                (eid(1), ElementType::new("CPS3"), vec![eid(1), eid(2), eid(3)]),
                (eid(2), ElementType::new("CPS3"), vec![eid(2), eid(3), eid(4)]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn incident_elements_follow_scan_order() {
        let adj = AdjacencyIndex::build(&two_triangles());
        assert_eq!(adj.incident_elements(eid(1)).unwrap(), &[eid(1)]);
        assert_eq!(adj.incident_elements(eid(2)).unwrap(), &[eid(1), eid(2)]);
        assert_eq!(adj.incident_elements(eid(4)).unwrap(), &[eid(2)]);
        assert_eq!(
            adj.element_nodes(eid(2)).unwrap(),
            &[eid(2), eid(3), eid(4)]
        );
        adj.validate_invariants().unwrap();
    }

    #[test]
    fn unknown_node_is_an_error() {
        let adj = AdjacencyIndex::build(&two_triangles());
        let err = adj.incident_elements(eid(99)).unwrap_err();
        assert!(matches!(
            err,
            ResultSieveError::UnknownEntity { kind: EntityKind::Node, .. }
        ));
    }

    #[test]
    fn orphan_node_has_empty_incidence() {
        let mut inst = two_triangles();
        inst.try_add_node(eid(50), None).unwrap();
        let adj = AdjacencyIndex::build(&inst);
        assert!(adj.incident_elements(eid(50)).unwrap().is_empty());
        assert_eq!(adj.source_version(), inst.version());
    }

    #[test]
    fn collapsed_node_counts_once() {
        let inst = Instance::from_connectivity(
            "A",
            [(eid(9), ElementType::new("CPS4"), vec![eid(1), eid(2), eid(3), eid(3)])],
        )
        .unwrap();
        let adj = AdjacencyIndex::build(&inst);
        assert_eq!(adj.incident_elements(eid(3)).unwrap(), &[eid(9)]);
        adj.validate_invariants().unwrap();
    }
}

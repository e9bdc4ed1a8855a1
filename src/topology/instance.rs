//! Instance: one part occurrence of the assembly with its own label space.
//!
//! An `Instance` owns its nodes and elements. Labels are unique inside one
//! instance only, so every lookup goes through the instance that owns the id.
//! Nodes and elements keep their insertion order for deterministic iteration.

use crate::result_error::ResultSieveError;
use crate::topology::element_type::ElementType;
use crate::topology::entity::{EntityId, EntityKind};
use std::collections::HashMap;

/// A mesh node. Coordinates are optional; reductions never need them.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Node {
    pub id: EntityId,
    pub coordinates: Option<[f64; 3]>,
}

/// A mesh element with ordered connectivity.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Element {
    pub id: EntityId,
    pub element_type: ElementType,
    pub connectivity: Vec<EntityId>,
}

/// Nodes and elements of one instance.
///
/// # Invariants
/// - `node_order` lists every key of `nodes` exactly once (same for elements).
/// - Every connectivity entry names a node of this instance.
/// - `version` changes whenever nodes or elements are added.
#[derive(Clone, Debug, Default)]
pub struct Instance {
    name: String,
    nodes: HashMap<EntityId, Node>,
    node_order: Vec<EntityId>,
    elements: HashMap<EntityId, Element>,
    element_order: Vec<EntityId>,
    version: u64,
}

impl Instance {
    /// Creates an empty instance.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Builds an instance from element connectivity alone, registering each
    /// node (without coordinates) the first time it is referenced.
    ///
    /// # Example
    /// ```rust
    /// # fn main() -> Result<(), result_sieve::result_error::ResultSieveError> {
    /// use result_sieve::topology::element_type::ElementType;
    /// use result_sieve::topology::entity::EntityId;
    /// use result_sieve::topology::instance::Instance;
    /// let n = |raw| EntityId::new(raw);
    /// let inst = Instance::from_connectivity(
    ///     "PART-1-1",
    ///     [(n(1)?, ElementType::new("CPS3"), vec![n(1)?, n(2)?, n(3)?])],
    /// )?;
    /// assert_eq!(inst.node_count(), 3);
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_connectivity(
        name: impl Into<String>,
        elements: impl IntoIterator<Item = (EntityId, ElementType, Vec<EntityId>)>,
    ) -> Result<Self, ResultSieveError> {
        let mut inst = Instance::new(name);
        for (id, element_type, connectivity) in elements {
            for &node in &connectivity {
                if !inst.nodes.contains_key(&node) {
                    inst.try_add_node(node, None)?;
                }
            }
            inst.try_add_element(id, element_type, connectivity)?;
        }
        Ok(inst)
    }

    /// Instance name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Structural version; changes on every insertion.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Adds a node.
    ///
    /// # Errors
    /// `DuplicateEntity` if the label is already used by a node.
    pub fn try_add_node(
        &mut self,
        id: EntityId,
        coordinates: Option<[f64; 3]>,
    ) -> Result<(), ResultSieveError> {
        if self.nodes.contains_key(&id) {
            return Err(self.duplicate(EntityKind::Node, id));
        }
        self.nodes.insert(id, Node { id, coordinates });
        self.node_order.push(id);
        self.version = self.version.wrapping_add(1);
        Ok(())
    }

    /// Adds an element whose connectivity refers to existing nodes.
    ///
    /// # Errors
    /// `DuplicateEntity` for a reused element label, `UnknownEntity` when a
    /// connectivity entry is not a node of this instance.
    pub fn try_add_element(
        &mut self,
        id: EntityId,
        element_type: ElementType,
        connectivity: Vec<EntityId>,
    ) -> Result<(), ResultSieveError> {
        if self.elements.contains_key(&id) {
            return Err(self.duplicate(EntityKind::Element, id));
        }
        if let Some(&missing) = connectivity.iter().find(|n| !self.nodes.contains_key(n)) {
            return Err(self.unknown(EntityKind::Node, missing));
        }
        self.elements.insert(
            id,
            Element {
                id,
                element_type,
                connectivity,
            },
        );
        self.element_order.push(id);
        self.version = self.version.wrapping_add(1);
        Ok(())
    }

    /// Looks up a node.
    pub fn node(&self, id: EntityId) -> Result<&Node, ResultSieveError> {
        self.nodes
            .get(&id)
            .ok_or_else(|| self.unknown(EntityKind::Node, id))
    }

    /// Looks up an element.
    pub fn element(&self, id: EntityId) -> Result<&Element, ResultSieveError> {
        self.elements
            .get(&id)
            .ok_or_else(|| self.unknown(EntityKind::Element, id))
    }

    /// Whether `id` is a node or element (per `kind`) of this instance.
    pub fn contains(&self, kind: EntityKind, id: EntityId) -> bool {
        match kind {
            EntityKind::Node => self.nodes.contains_key(&id),
            EntityKind::Element => self.elements.contains_key(&id),
        }
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.node_order.iter().map(move |id| &self.nodes[id])
    }

    /// Elements in insertion order.
    pub fn elements(&self) -> impl Iterator<Item = &Element> + '_ {
        self.element_order.iter().map(move |id| &self.elements[id])
    }

    pub fn node_count(&self) -> usize {
        self.node_order.len()
    }

    pub fn element_count(&self) -> usize {
        self.element_order.len()
    }

    /// A copy of this instance's mesh under another name.
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }

    pub(crate) fn unknown(&self, kind: EntityKind, id: EntityId) -> ResultSieveError {
        ResultSieveError::UnknownEntity {
            kind,
            id,
            instance: self.name.clone(),
        }
    }

    fn duplicate(&self, kind: EntityKind, id: EntityId) -> ResultSieveError {
        ResultSieveError::DuplicateEntity {
            kind,
            id,
            instance: self.name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eid(raw: u64) -> EntityId {
        EntityId::new(raw).unwrap()
    }

    #[test]
    fn element_requires_known_nodes() {
        let mut inst = Instance::new("PART-1-1");
        inst.try_add_node(eid(1), Some([0.0, 0.0, 0.0])).unwrap();
        let err = inst
            .try_add_element(eid(10), ElementType::new("T3D2"), vec![eid(1), eid(2)])
            .unwrap_err();
        assert_eq!(
            err,
            ResultSieveError::UnknownEntity {
                kind: EntityKind::Node,
                id: eid(2),
                instance: "PART-1-1".into()
            }
        );
        assert_eq!(inst.element_count(), 0);
    }

    #[test]
    fn duplicates_are_rejected() {
        let mut inst = Instance::new("A");
        inst.try_add_node(eid(1), None).unwrap();
        assert!(matches!(
            inst.try_add_node(eid(1), None),
            Err(ResultSieveError::DuplicateEntity { kind: EntityKind::Node, .. })
        ));
    }

    #[test]
    fn insertion_order_and_version() {
        let inst = Instance::from_connectivity(
            "A",
            [
                (eid(7), ElementType::new("CPS3"), vec![eid(3), eid(1), eid(2)]),
                (eid(5), ElementType::new("CPS3"), vec![eid(2), eid(1), eid(4)]),
            ],
        )
        .unwrap();
        let nodes: Vec<_> = inst.nodes().map(|n| n.id.get()).collect();
        assert_eq!(nodes, vec![3, 1, 2, 4]);
        let elems: Vec<_> = inst.elements().map(|e| e.id.get()).collect();
        assert_eq!(elems, vec![7, 5]);
        assert_eq!(inst.version(), 6);
        assert!(inst.contains(EntityKind::Element, eid(5)));
        assert!(!inst.contains(EntityKind::Node, eid(5)));
        assert_eq!(inst.renamed("B").name(), "B");
    }
}

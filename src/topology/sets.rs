//! Named node and element sets, and their resolution to one instance.
//!
//! A set stores `(instance, label)` pairs because labels alone are ambiguous
//! across instances. Resolution checks that all members live in a single
//! instance and materializes the member labels in a deterministic order.

use crate::config::LabelOrder;
use crate::result_error::ResultSieveError;
use crate::topology::entity::{EntityId, EntityKind};
use crate::topology::instance::Instance;
use itertools::Itertools;

/// One member of a set: a label qualified by its instance.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct SetMember {
    pub instance: String,
    pub id: EntityId,
}

/// A named group of node or element references, in declaration order.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct EntitySet {
    name: String,
    kind: EntityKind,
    members: Vec<SetMember>,
}

impl EntitySet {
    pub fn new(name: impl Into<String>, kind: EntityKind) -> Self {
        Self {
            name: name.into(),
            kind,
            members: Vec::new(),
        }
    }

    /// Set whose members all belong to `instance`.
    pub fn scoped(
        name: impl Into<String>,
        kind: EntityKind,
        instance: &str,
        ids: impl IntoIterator<Item = EntityId>,
    ) -> Self {
        let mut set = Self::new(name, kind);
        set.extend(instance, ids);
        set
    }

    /// Appends a member.
    pub fn push(&mut self, instance: &str, id: EntityId) {
        self.members.push(SetMember {
            instance: instance.to_string(),
            id,
        });
    }

    /// Appends several members of one instance.
    pub fn extend(&mut self, instance: &str, ids: impl IntoIterator<Item = EntityId>) {
        for id in ids {
            self.push(instance, id);
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn members(&self) -> &[SetMember] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// The single instance all members belong to.
    ///
    /// # Errors
    /// `EmptySet` when there are no members, `MultiInstanceSet` when members
    /// come from more than one instance.
    pub fn owning_instance(&self) -> Result<&str, ResultSieveError> {
        let instances: Vec<&str> = self
            .members
            .iter()
            .map(|m| m.instance.as_str())
            .unique()
            .collect();
        match instances.as_slice() {
            [] => Err(ResultSieveError::EmptySet(self.name.clone())),
            [only] => Ok(*only),
            many => Err(ResultSieveError::MultiInstanceSet {
                name: self.name.clone(),
                instances: many.iter().map(|s| s.to_string()).collect(),
            }),
        }
    }
}

/// A set scoped to its instance, with member labels ready for querying.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedSet {
    pub name: String,
    pub kind: EntityKind,
    pub instance: String,
    pub ids: Vec<EntityId>,
    /// Members the instance does not contain, in the same order as `ids`.
    pub unknown: Vec<EntityId>,
}

/// Resolves `set` against the instance that owns it.
///
/// Repeated members are kept once at their first position. With
/// [`LabelOrder::Ascending`] the ids are sorted by label; otherwise they keep
/// declaration order.
///
/// Members that are not a node/element of the instance go to
/// [`ResolvedSet::unknown`] so the caller can report them one by one.
///
/// # Errors
/// - `EmptySet` / `MultiInstanceSet` as for [`EntitySet::owning_instance`];
/// - `UnknownInstance` if `instance` is not the owning instance.
pub fn resolve_set(
    set: &EntitySet,
    instance: &Instance,
    order: LabelOrder,
) -> Result<ResolvedSet, ResultSieveError> {
    let owner = set.owning_instance()?;
    if owner != instance.name() {
        return Err(ResultSieveError::UnknownInstance(owner.to_string()));
    }
    let distinct: Vec<EntityId> = set.members.iter().map(|m| m.id).unique().collect();
    if distinct.len() != set.members.len() {
        log::debug!(
            "set `{}`: dropped {} repeated members",
            set.name,
            set.members.len() - distinct.len()
        );
    }
    let (mut ids, mut unknown): (Vec<EntityId>, Vec<EntityId>) = distinct
        .into_iter()
        .partition(|&id| instance.contains(set.kind, id));
    if order == LabelOrder::Ascending {
        ids.sort_unstable();
        unknown.sort_unstable();
    }
    log::debug!(
        "resolved {} set `{}` to instance `{}` ({} members)",
        set.kind,
        set.name,
        owner,
        ids.len()
    );
    Ok(ResolvedSet {
        name: set.name.clone(),
        kind: set.kind,
        instance: owner.to_string(),
        ids,
        unknown,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::element_type::ElementType;

    fn eid(raw: u64) -> EntityId {
        EntityId::new(raw).unwrap()
    }

    fn quad() -> Instance {
        Instance::from_connectivity(
            "PART-1-1",
            [(
                eid(1),
                ElementType::new("CPS4"),
                vec![eid(4), eid(3), eid(2), eid(1)],
            )],
        )
        .unwrap()
    }

    #[test]
    fn declaration_order_is_kept() {
        let set = EntitySet::scoped(
            "EDGE",
            EntityKind::Node,
            "PART-1-1",
            [eid(3), eid(1), eid(3), eid(2)],
        );
        let resolved = resolve_set(&set, &quad(), LabelOrder::Declaration).unwrap();
        assert_eq!(resolved.ids, vec![eid(3), eid(1), eid(2)]);
        assert_eq!(resolved.instance, "PART-1-1");

        let sorted = resolve_set(&set, &quad(), LabelOrder::Ascending).unwrap();
        assert_eq!(sorted.ids, vec![eid(1), eid(2), eid(3)]);
    }

    #[test]
    fn multi_instance_is_rejected() {
        let mut set = EntitySet::new("TIE", EntityKind::Node);
        set.push("PART-1-1", eid(1));
        set.push("PART-2-1", eid(1));
        set.push("PART-1-1", eid(2));
        assert_eq!(
            set.owning_instance(),
            Err(ResultSieveError::MultiInstanceSet {
                name: "TIE".into(),
                instances: vec!["PART-1-1".into(), "PART-2-1".into()],
            })
        );
        assert!(resolve_set(&set, &quad(), LabelOrder::Declaration).is_err());
    }

    #[test]
    fn empty_and_foreign_members() {
        let empty = EntitySet::new("NONE", EntityKind::Element);
        assert_eq!(
            empty.owning_instance(),
            Err(ResultSieveError::EmptySet("NONE".into()))
        );

        let set = EntitySet::scoped(
            "E",
            EntityKind::Element,
            "PART-1-1",
            [eid(9), eid(1), eid(8)],
        );
        let resolved = resolve_set(&set, &quad(), LabelOrder::Declaration).unwrap();
        assert_eq!(resolved.ids, vec![eid(1)]);
        assert_eq!(resolved.unknown, vec![eid(9), eid(8)]);
        let sorted = resolve_set(&set, &quad(), LabelOrder::Ascending).unwrap();
        assert_eq!(sorted.unknown, vec![eid(8), eid(9)]);
    }
}

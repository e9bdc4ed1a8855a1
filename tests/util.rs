#![allow(dead_code)]
use result_sieve::prelude::*;

pub fn eid(u: u64) -> EntityId { EntityId::new(u).unwrap() }

pub const PLATE: &str = "PLATE-1";
pub const OTHER: &str = "PLATE-2";

/// E1 = {1,2,3}, E2 = {2,3,4}, single integration point each.
pub fn two_triangles(name: &str) -> Instance {
    Instance::from_connectivity(
        name,
        [
            (eid(1), ElementType::new("CPS3"), vec![eid(1), eid(2), eid(3)]),
            (eid(2), ElementType::new("CPS3"), vec![eid(2), eid(3), eid(4)]),
        ],
    )
    .unwrap()
}

/// Two CPS4 quads sharing the edge 2-5:
///
/// ```text
/// 4---5---6
/// | 1 | 2 |
/// 1---2---3
/// ```
pub fn quad_pair(name: &str) -> Instance {
    Instance::from_connectivity(
        name,
        [
            (eid(1), ElementType::new("CPS4"), vec![eid(1), eid(2), eid(5), eid(4)]),
            (eid(2), ElementType::new("CPS4"), vec![eid(2), eid(3), eid(6), eid(5)]),
        ],
    )
    .unwrap()
}

/// A row of `n` CPS4 quads; element `i` uses nodes `i, i+1, n+2+i, n+1+i`.
pub fn quad_strip(name: &str, n: u64) -> Instance {
    Instance::from_connectivity(
        name,
        (1..=n).map(|i| {
            (
                eid(i),
                ElementType::new("CPS4"),
                vec![eid(i), eid(i + 1), eid(n + 2 + i), eid(n + 1 + i)],
            )
        }),
    )
    .unwrap()
}

/// Database with `instance` and the sets `ALL_NODES` / `ALL_ELEMENTS`
/// covering it, but no steps.
pub fn mesh_only(instance: Instance) -> InMemoryDatabase {
    let mut db = InMemoryDatabase::new();
    let name = instance.name().to_string();
    db.add_set(EntitySet::scoped(
        "ALL_NODES",
        EntityKind::Node,
        &name,
        instance.nodes().map(|n| n.id),
    ));
    db.add_set(EntitySet::scoped(
        "ALL_ELEMENTS",
        EntityKind::Element,
        &name,
        instance.elements().map(|e| e.id),
    ));
    db.add_instance(instance);
    db
}

/// [`mesh_only`] plus one step of `frames` frames (values 0, 1/k, ..., 1).
pub fn db_with(instance: Instance, frames: usize) -> InMemoryDatabase {
    let mut db = mesh_only(instance);
    let last = frames.saturating_sub(1).max(1) as f64;
    db.add_step("Step-1", (0..frames).map(|f| f as f64 / last).collect());
    db
}

/// Declares `descriptor` in `frame` and stores `records` for `instance`.
pub fn put_field(
    db: &mut InMemoryDatabase,
    frame: FrameRef,
    instance: &str,
    descriptor: FieldDescriptor,
    records: Vec<FieldRecord>,
) {
    let name = descriptor.name.clone();
    db.declare_field(frame, descriptor)
        .unwrap()
        .add_records(frame, &name, instance, records)
        .unwrap();
}

pub fn scalar(name: &str, location: FieldLocation) -> FieldDescriptor {
    FieldDescriptor::new(name, FieldType::Scalar, location)
}

pub fn stress() -> FieldDescriptor {
    FieldDescriptor::new("S", FieldType::Tensor, FieldLocation::IntegrationPoint)
}

/// Uniaxial 3D stress state with `S11 = s`; its Mises value is `|s|`.
pub fn uniaxial(s: f64) -> [f64; 6] { [s, 0.0, 0.0, 0.0, 0.0, 0.0] }

pub fn assert_close(got: &[f64], want: &[f64]) {
    assert_eq!(got.len(), want.len(), "got={got:?} want={want:?}");
    for (g, w) in got.iter().zip(want) {
        assert!((g - w).abs() <= 1e-9 * w.abs().max(1.0), "got={got:?} want={want:?}");
    }
}

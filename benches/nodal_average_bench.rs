use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use result_sieve::prelude::*;

fn eid(raw: u64) -> EntityId {
    EntityId::new(raw).expect("nonzero EntityId")
}

/// `side` x `side` grid of CPS4 quads with per-IP PEEQ output.
fn grid_database(side: u64) -> (InMemoryDatabase, FrameRef) {
    let row = side + 1;
    let node = |i: u64, j: u64| eid(j * row + i + 1);
    let elements = (0..side).flat_map(|j| {
        (0..side).map(move |i| {
            (
                eid(j * side + i + 1),
                ElementType::new("CPS4"),
                vec![node(i, j), node(i + 1, j), node(i + 1, j + 1), node(i, j + 1)],
            )
        })
    });
    let instance = Instance::from_connectivity("GRID-1", elements).expect("valid grid");

    let mut db = InMemoryDatabase::new();
    db.add_set(EntitySet::scoped(
        "ALL_NODES",
        EntityKind::Node,
        "GRID-1",
        instance.nodes().map(|n| n.id),
    ));
    db.add_set(EntitySet::scoped(
        "ALL_ELEMENTS",
        EntityKind::Element,
        "GRID-1",
        instance.elements().map(|e| e.id),
    ));
    db.add_instance(instance);
    db.add_step("Step-1", vec![1.0]);

    let frame = FrameRef::new(0, 0);
    let records = (1..=side * side)
        .flat_map(|e| {
            (1..=4u16).map(move |ip| FieldRecord::integration_point(eid(e), ip, [e as f64 + ip as f64]))
        })
        .collect::<Vec<_>>();
    db.declare_field(
        frame,
        FieldDescriptor::new("PEEQ", FieldType::Scalar, FieldLocation::IntegrationPoint),
    )
    .expect("frame exists")
    .add_records(frame, "PEEQ", "GRID-1", records)
    .expect("records fit the descriptor");
    (db, frame)
}

fn bench_nodal_average(c: &mut Criterion) {
    let mut group = c.benchmark_group("nodal_average");

    for &side in &[32u64, 96u64] {
        let (db, frame) = grid_database(side);

        group.bench_with_input(BenchmarkId::new("cold_adjacency", side), &side, |b, _| {
            b.iter(|| {
                let query = ResultQuery::new(&db);
                let out = query
                    .query_nodal_averaged("PEEQ", frame, "ALL_NODES")
                    .expect("query");
                black_box(out);
            });
        });

        group.bench_with_input(BenchmarkId::new("cached_adjacency", side), &side, |b, _| {
            let query = ResultQuery::new(&db);
            b.iter(|| {
                let out = query
                    .query_nodal_averaged("PEEQ", frame, "ALL_NODES")
                    .expect("query");
                black_box(out);
            });
        });

        group.bench_with_input(BenchmarkId::new("element_average", side), &side, |b, _| {
            let query = ResultQuery::new(&db);
            b.iter(|| {
                let out = query
                    .query_elemental_averaged("PEEQ", frame, "ALL_ELEMENTS")
                    .expect("query");
                black_box(out);
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_nodal_average);
criterion_main!(benches);

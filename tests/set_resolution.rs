mod util;
use result_sieve::prelude::*;
use util::*;

fn two_plates() -> (InMemoryDatabase, FrameRef) {
    let mut db = db_with(quad_pair(PLATE), 1);
    db.add_instance(quad_pair(OTHER));
    let frame = FrameRef::new(0, 0);
    let descriptor = FieldDescriptor::new("U", FieldType::Vector, FieldLocation::Nodal);
    db.declare_field(frame, descriptor).unwrap();
    for (instance, scale) in [(PLATE, 1.0), (OTHER, 10.0)] {
        let records = (1..=6)
            .map(|n| FieldRecord::nodal(eid(n), [scale * n as f64, 0.0, 0.0]))
            .collect::<Vec<_>>();
        db.add_records(frame, "U", instance, records).unwrap();
    }
    (db, frame)
}

#[test]
fn rows_follow_declaration_order() {
    let (mut db, frame) = two_plates();
    db.add_set(EntitySet::scoped(
        "EDGE",
        EntityKind::Node,
        PLATE,
        [eid(6), eid(2), eid(4), eid(2)],
    ));
    let out = ResultQuery::new(&db)
        .query_nodal_unique("U", frame, "EDGE")
        .unwrap();
    let ids: Vec<u64> = out.rows.iter().map(|r| r.id.get()).collect();
    assert_eq!(ids, vec![6, 2, 4]);
    assert_eq!(out.rows[0].values, vec![6.0, 0.0, 0.0]);
}

#[test]
fn ascending_order_is_opt_in() {
    let (mut db, frame) = two_plates();
    db.add_set(EntitySet::scoped(
        "EDGE",
        EntityKind::Node,
        OTHER,
        [eid(6), eid(2), eid(4)],
    ));
    let options = QueryOptions::from_json_str(r#"{ "label_order": "ascending" }"#).unwrap();
    let out = ResultQuery::new(&db)
        .with_options(options)
        .query_nodal_unique("U", frame, "EDGE")
        .unwrap();
    let ids: Vec<u64> = out.rows.iter().map(|r| r.id.get()).collect();
    assert_eq!(ids, vec![2, 4, 6]);
    assert_eq!(out.instance, OTHER);
    assert_eq!(out.rows[0].values, vec![20.0, 0.0, 0.0]);
}

#[test]
fn multi_instance_set_is_rejected() {
    let (mut db, frame) = two_plates();
    let mut tie = EntitySet::new("TIE", EntityKind::Node);
    tie.push(PLATE, eid(3));
    tie.push(OTHER, eid(1));
    db.add_set(tie);
    let err = ResultQuery::new(&db)
        .query_nodal_unique("U", frame, "TIE")
        .unwrap_err();
    assert_eq!(
        err,
        ResultSieveError::MultiInstanceSet {
            name: "TIE".into(),
            instances: vec![PLATE.into(), OTHER.into()],
        }
    );
}

#[test]
fn unknown_and_empty_sets() {
    let (mut db, frame) = two_plates();
    let query = ResultQuery::new(&db);
    assert_eq!(
        query.query_nodal_unique("U", frame, "NOPE").unwrap_err(),
        ResultSieveError::UnknownSet {
            name: "NOPE".into(),
            kind: EntityKind::Node,
        }
    );
    // an element set of that name does not satisfy a node query
    drop(query);
    db.add_set(EntitySet::scoped("LEFT", EntityKind::Element, PLATE, [eid(1)]));
    let err = ResultQuery::new(&db)
        .query_nodal_unique("U", frame, "LEFT")
        .unwrap_err();
    assert!(matches!(err, ResultSieveError::UnknownSet { kind: EntityKind::Node, .. }));

    db.add_set(EntitySet::new("NOTHING", EntityKind::Node));
    let err = ResultQuery::new(&db)
        .query_nodal_unique("U", frame, "NOTHING")
        .unwrap_err();
    assert_eq!(err, ResultSieveError::EmptySet("NOTHING".into()));
}

#[test]
fn unknown_member_fails_alone() {
    let (mut db, frame) = two_plates();
    db.add_set(EntitySet::scoped(
        "BAD",
        EntityKind::Node,
        PLATE,
        [eid(1), eid(77), eid(2)],
    ));
    let out = ResultQuery::new(&db)
        .query_nodal_unique("U", frame, "BAD")
        .unwrap();
    let ids: Vec<u64> = out.rows.iter().map(|r| r.id.get()).collect();
    assert_eq!(ids, vec![1, 2]);
    assert_eq!(
        out.failures,
        vec![EntityFailure {
            id: eid(77),
            error: ResultSieveError::UnknownEntity {
                kind: EntityKind::Node,
                id: eid(77),
                instance: PLATE.into(),
            },
        }]
    );
}

#[test]
fn unknown_member_aborts_when_asked() {
    let (mut db, frame) = two_plates();
    db.add_set(EntitySet::scoped(
        "BAD",
        EntityKind::Node,
        PLATE,
        [eid(1), eid(77), eid(2)],
    ));
    let options = QueryOptions {
        failure_mode: FailureMode::Abort,
        ..QueryOptions::default()
    };
    let err = ResultQuery::new(&db)
        .with_options(options)
        .query_nodal_unique("U", frame, "BAD")
        .unwrap_err();
    assert_eq!(
        err,
        ResultSieveError::UnknownEntity {
            kind: EntityKind::Node,
            id: eid(77),
            instance: PLATE.into(),
        }
    );
}

#[test]
fn names_are_normalized_unless_disabled() {
    let (mut db, frame) = two_plates();
    db.add_set(EntitySet::scoped("TOP", EntityKind::Node, PLATE, [eid(4), eid(5)]));
    let out = ResultQuery::new(&db)
        .query_nodal_unique(" u ", frame, "top")
        .unwrap();
    assert_eq!(out.field, "U");
    assert_eq!(out.set, "TOP");

    let options = QueryOptions {
        normalize_names: false,
        ..QueryOptions::default()
    };
    let err = ResultQuery::new(&db)
        .with_options(options)
        .query_nodal_unique("U", frame, "top")
        .unwrap_err();
    assert!(matches!(err, ResultSieveError::UnknownSet { .. }));
}

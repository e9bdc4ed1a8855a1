mod util;
use result_sieve::prelude::*;
use util::*;

const ASSEMBLY_INP: &str = "\
*Heading
** two instances of one plate
*Part, name=Plate
*Node
      1,           0.,           0.
      2,           1.,           0.
      3,           2.,           0.
      4,           0.,           1.
      5,           1.,           1.
      6,           2.,           1.
*Element, type=CPS4, elset=EALL
1, 1, 2, 5, 4
2, 2, 3,
   6, 5
*Nset, nset=Left
1, 4
*Elset, elset=Right
2
*Solid Section, elset=EALL, material=STEEL
1.,
*End Part
**
*Assembly, name=Assembly
*Instance, name=Plate-1, part=Plate
*End Instance
*Instance, name=Plate-2, part=Plate
      3., 0., 0.
*End Instance
*Node
      1,           5.,           5.,           0.
*Nset, nset=Tip, instance=Plate-1
3, 6
*Nset, nset=Row, instance=Plate-2, generate
1, 3, 1
*Nset, nset=Mixed
Plate-1.2, Plate-2.2
*Nset, nset=RP
1
*End Assembly
*Material, name=STEEL
*Elastic
210000., 0.3
";

fn model() -> MeshModel {
    InpReader.read(ASSEMBLY_INP.as_bytes()).unwrap()
}

#[test]
fn instances_copy_their_part() {
    let model = model();
    let names: Vec<&str> = model.instances.iter().map(|i| i.name()).collect();
    assert_eq!(names, vec!["PLATE-1", "PLATE-2", "ASSEMBLY"]);

    let second = model.instance("PLATE-2").unwrap();
    assert_eq!(second.node_count(), 6);
    assert_eq!(second.element_count(), 2);
    let e2 = second.element(eid(2)).unwrap();
    assert_eq!(e2.connectivity, vec![eid(2), eid(3), eid(6), eid(5)]);
    assert_eq!(e2.element_type.integration_points(), Some(4));

    let rp = model.instance("ASSEMBLY").unwrap();
    assert_eq!(rp.node(eid(1)).unwrap().coordinates, Some([5.0, 5.0, 0.0]));
}

#[test]
fn part_sets_are_scoped_per_instance() {
    let model = model();
    for instance in ["PLATE-1", "PLATE-2"] {
        let left = model
            .set(&format!("{instance}.LEFT"), EntityKind::Node)
            .unwrap();
        assert_eq!(left.owning_instance().unwrap(), instance);
        let ids: Vec<EntityId> = left.members().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![eid(1), eid(4)]);
        assert_eq!(
            model
                .set(&format!("{instance}.EALL"), EntityKind::Element)
                .unwrap()
                .len(),
            2
        );
    }
    assert!(model.set("LEFT", EntityKind::Node).is_none());
    let row = model.set("ROW", EntityKind::Node).unwrap();
    assert_eq!(row.owning_instance().unwrap(), "PLATE-2");
    assert_eq!(row.len(), 3);
}

#[test]
fn read_model_answers_queries() {
    let mut db = InMemoryDatabase::from_mesh_model(model());
    db.add_step("Load", vec![0.0, 1.0]);
    let frame = db.last_frame(0).unwrap();
    put_field(
        &mut db,
        frame,
        "PLATE-1",
        FieldDescriptor::new("U", FieldType::Vector, FieldLocation::Nodal),
        (1..=6)
            .map(|n| FieldRecord::nodal(eid(n), [n as f64 * 1e-3, 0.0, 0.0]))
            .collect(),
    );
    let query = ResultQuery::new(&db);

    let tip = query.query_nodal_unique("U", frame, "Tip").unwrap();
    assert_eq!(tip.instance, "PLATE-1");
    let ux: Vec<f64> = tip.rows.iter().map(|r| r.values[0]).collect();
    assert_close(&ux, &[3e-3, 6e-3]);

    let left = query
        .query_nodal_unique("U", frame, "Plate-1.Left")
        .unwrap();
    assert_eq!(left.rows.len(), 2);

    // the other instance has no output for this field
    let row = query.query_nodal_unique("U", frame, "ROW").unwrap();
    assert!(row.rows.is_empty());
    assert_eq!(row.failures.len(), 3);
    assert!(row.failures.iter().all(|f| matches!(
        f.error,
        ResultSieveError::MissingFieldData { location: FieldLocation::Nodal, .. }
    )));

    let rp = query.query_nodal_unique("U", frame, "RP").unwrap();
    assert_eq!(rp.instance, "ASSEMBLY");
    assert_eq!(rp.failures.len(), 1);

    assert!(matches!(
        query.query_nodal_unique("U", frame, "MIXED"),
        Err(ResultSieveError::MultiInstanceSet { .. })
    ));
}

#[test]
fn instance_lookup_modes() {
    let db = InMemoryDatabase::from_mesh_model(model());
    assert_eq!(
        db.find_instance("PLATE-2", InstanceMatch::Exact).unwrap().name(),
        "PLATE-2"
    );
    assert!(matches!(
        db.find_instance("PLATE", InstanceMatch::Exact),
        Err(ResultSieveError::UnknownInstance(_))
    ));
    // first match in name order
    assert_eq!(
        db.find_instance("PLATE", InstanceMatch::Partial).unwrap().name(),
        "PLATE-1"
    );
}

#[test]
fn missing_file_is_an_io_error() {
    let err = InpReader
        .read_path("/nonexistent/result-sieve/model.inp")
        .unwrap_err();
    assert!(matches!(err, ResultSieveError::Io(_)));
}

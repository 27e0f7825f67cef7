use screwed_core::export;
use screwed_core::graph::{DimensionGroup, Origin, ParameterGraph, Rule, Slot};
use screwed_core::spring::{self, SpringTableInput};
use screwed_core::stack::StackInput;
use screwed_core::thread::{Thread, ThreadInput};
use screwed_core::tube::TubeInput;
use screwed_core::workbook::{CalculationItem, CalculationOutput};
use screwed_core::{load_workbook, save_workbook, CalcError, CalcSettings, Workbook};

fn radii_graph() -> ParameterGraph {
    let mut graph = ParameterGraph::new("ring");
    graph
        .declare(Slot::input("outer"))
        .unwrap()
        .declare(Slot::input("inner"))
        .unwrap()
        .declare(Slot::input("wall"))
        .unwrap();
    graph
        .add_group(DimensionGroup::new("radii", "outer", "inner", "wall"))
        .unwrap();
    graph
}

#[test]
fn test_graph_follows_latest_inputs() {
    let mut graph = ParameterGraph::new("pair");
    graph
        .declare(Slot::input("a").rule(Rule::compute("2b", &["b"], |v| 2.0 * v[0])))
        .unwrap();
    graph
        .declare(Slot::input("b").rule(Rule::compute("a/2", &["a"], |v| v[0] / 2.0)))
        .unwrap();

    assert!(matches!(graph.value("a"), Err(CalcError::AttributeNotDefined { .. })));

    graph.assign("b", 3.0).unwrap();
    let a = graph.resolve("a").unwrap();
    assert_eq!(a.value, 6.0);
    assert_eq!(a.sources(), vec!["b".to_string()]);
    assert!(matches!(a.origin, Origin::Derived { .. }));

    graph.assign("b", 4.0).unwrap();
    assert_eq!(graph.value("a").unwrap(), 8.0);

    match graph.assign("a", 1.0) {
        Err(err) => assert_eq!(err.conflicting_slots(), Some(&["b".to_string()][..])),
        Ok(()) => panic!("assignment over a derived value must fail"),
    }
    assert!(matches!(graph.delete("a"), Err(CalcError::ConflictingSource { .. })));

    graph.delete("b").unwrap();
    assert!(graph.resolve("a").is_none());
    graph.assign("a", 1.0).unwrap();
    assert_eq!(graph.value("b").unwrap(), 0.5);
}

#[test]
fn test_group_evicts_oldest_member() {
    let mut graph = radii_graph();
    graph.assign("outer", 10.0).unwrap();
    graph.assign("inner", 8.0).unwrap();
    assert_eq!(graph.value("wall").unwrap(), 2.0);

    graph.assign("wall", 1.0).unwrap();
    assert_eq!(graph.direct_value("outer"), None);
    assert_eq!(graph.value("outer").unwrap(), 9.0);
    assert_eq!(graph.group("radii").unwrap().order(), ["inner".to_string(), "wall".to_string()]);
}

#[test]
fn test_group_rejects_impossible_geometry() {
    let mut graph = radii_graph();
    graph.assign("outer", 10.0).unwrap();
    graph.assign("inner", 8.0).unwrap();
    assert!(matches!(
        graph.assign("wall", -1.0),
        Err(CalcError::ImpossibleGeometry { .. })
    ));
    assert_eq!(graph.value("outer").unwrap(), 10.0);
    assert_eq!(graph.value("wall").unwrap(), 2.0);
}

#[test]
fn test_designation_to_thread_model() {
    let thread = Thread::from_designation("M8x1.25-6H/6g").unwrap();
    assert_eq!(thread.value("diameter").unwrap(), 8.0);
    assert_eq!(thread.value("pitch").unwrap(), 1.25);
    assert_eq!(thread.designation().unwrap().to_string(), "M8x1.25-6H/6g");
    assert!(thread.check().unwrap());

    let coarse = Thread::from_designation("M12").unwrap();
    assert_eq!(coarse.value("pitch").unwrap(), 1.75);

    assert!(Thread::from_designation("M8xPh2P0.75").is_err());
}

#[test]
fn test_spring_table_csv() {
    let table = spring::spring_table(&SpringTableInput {
        label: String::new(),
        external_diameter: 10.0,
        wire_widths: vec![1.0, 3.0],
        wire_heights: vec![1.0, 3.0],
        coil_count: 8.0,
        load: 10.0,
        rigidity_modulus: 81_500.0,
    })
    .unwrap();
    // spring index of the 3 x 3 wire is below the formula range
    assert!(table.cells[1][1].is_none());
    assert!(table.cells[0][0].is_some());

    let csv = export::spring_table_to_string(&table, &CalcSettings::default()).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], ",1.0,,3.0,");
    assert!(lines[3].starts_with("3.0,"));
    assert!(lines[3].ends_with(",,"));
}

#[test]
fn test_workbook_save_load_and_run() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("housing.scw");

    let mut workbook = Workbook::new("J. Doe", "Gearbox housing");
    workbook.add_item(CalculationItem::Stack(StackInput {
        label: "1 end play".to_string(),
        expression: "[40 ±0.1] - [39.5 ±0.05]".to_string(),
        requirement: Some("0.5 ±0.2".to_string()),
        compare_mode: None,
    }));
    workbook.add_item(CalculationItem::Tube(TubeInput {
        label: "2 barrel".to_string(),
        diameter_external: Some(60.0),
        wallthickness: Some(5.0),
        pressure_internal: 20.0,
        ..Default::default()
    }));
    workbook.add_item(CalculationItem::Thread(ThreadInput {
        label: "3 nut".to_string(),
        designation: Some("M20x2.5".to_string()),
        load: Some(12_000.0),
        ..Default::default()
    }));
    workbook.add_item(CalculationItem::Tube(TubeInput {
        label: "4 broken".to_string(),
        radius_external: Some(5.0),
        ..Default::default()
    }));
    save_workbook(&workbook, &path).unwrap();

    let loaded = load_workbook(&path).unwrap();
    assert_eq!(loaded.item_count(), 4);
    assert_eq!(loaded.meta.title, "Gearbox housing");

    let outcomes = loaded.run();
    let labels: Vec<&str> = outcomes.iter().map(|o| o.label.as_str()).collect();
    assert_eq!(labels, ["1 end play", "2 barrel", "3 nut", "4 broken"]);

    match outcomes[0].output.as_ref().unwrap() {
        CalculationOutput::Stack(report) => assert_eq!(report.matches, Some(false)),
        other => panic!("unexpected output {:?}", other),
    }
    match outcomes[1].output.as_ref().unwrap() {
        CalculationOutput::Tube(result) => {
            assert_eq!(result.radius_internal, 25.0);
            assert!(result.inner.hoop > result.outer.hoop);
        }
        other => panic!("unexpected output {:?}", other),
    }
    match outcomes[2].output.as_ref().unwrap() {
        CalculationOutput::Thread(result) => assert!(result.stresses.is_some()),
        other => panic!("unexpected output {:?}", other),
    }
    assert!(matches!(outcomes[3].error, Some(CalcError::InvalidInput { .. })));

    let json = serde_json::to_value(&outcomes).unwrap();
    assert_eq!(json[3]["error"]["type"], "InvalidInput");
}

mod common;

use std::collections::BTreeSet;

use common::*;
use hoddb::core::EntityKey;
use hoddb::execution::{Cursor, Operator};
use hoddb::planner::{QueryPlanner, QueryTerm};
use hoddb::SelectQuery;

fn run_plan(cursor: &mut Cursor, q: &SelectQuery) -> Vec<Operator> {
    let plan = QueryPlanner::new(cursor).plan(q).unwrap();
    cursor.set_variables(&plan.variables);
    for op in &plan.operations {
        op.run(cursor).unwrap();
    }
    plan.operations
}

fn snapshot(cursor: &Cursor, vars: &[String]) -> BTreeSet<Vec<EntityKey>> {
    cursor.key_rows(vars).into_iter().collect()
}

#[test]
fn test_operators_are_idempotent() {
    let db = loaded_db();
    let queries = vec![
        query(&["?vav"], vec![term("?vav", "a", "brick:VAV")]),
        query(&["?vav", "?zone"], vec![term("?vav", "a", "brick:VAV"), term("?vav", "bf:feeds", "?zone")]),
        query(&["?s", "?o"], vec![term("?s", "bf:feeds+", "?o")]),
        query(&["?zone", "?vav"], vec![term("?zone", "a", "brick:HVAC_Zone"), term("?vav", "bf:feeds", "?zone")]),
        query(&["?p", "?o"], vec![term("ex:sensor_1", "?p", "?o")]),
        query(&["?s", "?p", "?o"], vec![term("?s", "a", "brick:Room"), term("?s", "?p", "?o")]),
    ];

    for q in queries {
        let mut cursor = db.cursor(GRAPH, None).unwrap();
        let ops = run_plan(&mut cursor, &q);
        let vars = q.all_variables();
        let before = snapshot(&cursor, &vars);
        assert!(!before.is_empty(), "no rows for {:?}", q.terms);

        for op in &ops {
            op.run(&mut cursor).unwrap();
            assert_eq!(snapshot(&cursor, &vars), before, "{} changed the bindings", op);
        }
    }
}

#[test]
fn test_missing_entities_give_no_rows() {
    let db = loaded_db();
    let q = query(
        &["?x", "?y"],
        vec![term("?x", "bf:feeds", "ex:ghost"), term("ex:ghost", "bf:feeds+", "?y")],
    );
    let mut cursor = db.cursor(GRAPH, None).unwrap();
    let plan = QueryPlanner::new(&cursor).plan(&q).unwrap();
    cursor.set_variables(&plan.variables);
    for op in &plan.operations {
        op.run(&mut cursor).unwrap();
        assert!(cursor.relation().is_empty());
    }
}

#[test]
fn test_check_triple() {
    let db = loaded_db();
    let mut cursor = db.cursor(GRAPH, None).unwrap();

    let holds = QueryTerm::new(&term("ex:vav_1", "bf:feeds", "ex:zone_1"), &cursor).unwrap();
    let op = Operator::CheckTriple(holds);
    op.run(&mut cursor).unwrap();
    assert_eq!(cursor.relation().len(), 1);
    op.run(&mut cursor).unwrap();
    assert_eq!(cursor.relation().len(), 1);

    let fails = QueryTerm::new(&term("ex:zone_1", "bf:feeds", "ex:vav_1"), &cursor).unwrap();
    Operator::CheckTriple(fails).run(&mut cursor).unwrap();
    assert!(cursor.relation().is_empty());
}

#[test]
fn test_resolve_object_joins_existing_bindings() {
    let db = loaded_db();
    let mut cursor = db.cursor(GRAPH, None).unwrap();
    cursor.set_variables(&["?x"]);

    let feeds = QueryTerm::new(&term("ex:ahu_1", "bf:feeds", "?x"), &cursor).unwrap();
    Operator::ResolveObject(feeds).run(&mut cursor).unwrap();
    assert_eq!(cursor.relation().len(), 2);

    // zone_1 is not fed by ahu_1 directly, so the join keeps nothing
    let zones = QueryTerm::new(&term("ex:vav_1", "bf:feeds", "?x"), &cursor).unwrap();
    Operator::ResolveObject(zones).run(&mut cursor).unwrap();
    assert!(cursor.relation().is_empty());
}

#[test]
fn test_operator_display() {
    let db = loaded_db();
    let cursor = db.cursor(GRAPH, None).unwrap();
    let t = QueryTerm::new(&term("?vav", "a", "brick:VAV"), &cursor).unwrap();
    let op = Operator::ResolveSubject(t);
    assert_eq!(op.name(), "ResolveSubject");
    assert!(op.to_string().starts_with("[ResolveSubject <?vav "));
}

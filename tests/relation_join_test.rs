use std::sync::{Arc, RwLock};

use hoddb::core::EntityKey;
use hoddb::execution::{Cursor, EntitySet, Relation};
use hoddb::storage::indexing::dictionary::Dictionary;
use hoddb::storage::MemoryStore;

fn key(n: u32) -> EntityKey {
    EntityKey::new([0, 0, 0, 7], n.to_be_bytes(), 1)
}

fn vars(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn empty_cursor() -> Cursor {
    Cursor::new("test", 1, Arc::new(MemoryStore::new()), Arc::new(RwLock::new(Dictionary::new())))
}

#[test]
fn test_join_counts_shared_values() {
    let mut left = Relation::new(&["?a"]);
    left.add_one_value("?a", (1..=5).map(key)).unwrap();

    // three of the ten rows share a value with the left side
    let mut right = Relation::new(&["?a", "?b"]);
    right.add_two_values("?a", "?b", [1, 3, 5, 6, 7, 8, 9, 10, 11, 12].into_iter().map(|n| (key(n), key(n + 100)))).unwrap();
    assert_eq!(right.len(), 10);

    let mut joined = Relation::new(&["?a"]);
    joined.replace_with(&left).unwrap();
    joined.join(&right, &vars(&["?a"])).unwrap();
    assert_eq!(joined.len(), 3);

    let mut disjoint = Relation::new(&["?a", "?b"]);
    disjoint.add_two_values("?a", "?b", (20..30).map(|n| (key(n), key(n + 100)))).unwrap();
    left.join(&disjoint, &vars(&["?a"])).unwrap();
    assert!(left.is_empty());
}

#[test]
fn test_join_on_two_variables() {
    let mut left = Relation::new(&["?a", "?b", "?c"]);
    left.add_three_values("?a", "?b", "?c", [(key(1), key(2), key(3)), (key(1), key(4), key(5)), (key(6), key(2), key(7))]).unwrap();

    let mut right = Relation::new(&["?a", "?b", "?d"]);
    right.add_three_values("?a", "?b", "?d", [(key(1), key(2), key(10)), (key(1), key(2), key(11)), (key(6), key(4), key(12))]).unwrap();

    left.join(&right, &vars(&["?a", "?b"])).unwrap();

    let mut rows = left.project(&vars(&["?a", "?b", "?c", "?d"]));
    rows.sort();
    assert_eq!(
        rows,
        vec![vec![key(1), key(2), key(3), key(10)], vec![key(1), key(2), key(3), key(11)]]
    );
    assert_eq!(left.values_for("?d"), EntitySet::from([key(10), key(11)]));
}

#[test]
fn test_chained_joins_keep_index_consistent() {
    let mut rel = Relation::new(&["?x"]);
    rel.add_one_value("?x", (1..=100).map(key)).unwrap();

    let mut evens = Relation::new(&["?x", "?y"]);
    evens.add_two_values("?x", "?y", (1..=100).filter(|n| n % 2 == 0).map(|n| (key(n), key(n + 1000)))).unwrap();
    rel.join(&evens, &vars(&["?x"])).unwrap();
    assert_eq!(rel.len(), 50);

    let mut tens = Relation::new(&["?y"]);
    tens.add_one_value("?y", (1..=100).filter(|n| n % 10 == 0).map(|n| key(n + 1000))).unwrap();
    rel.join(&tens, &vars(&["?y"])).unwrap();
    assert_eq!(rel.len(), 10);
    assert_eq!(rel.values_for("?x"), (1..=10).map(|n| key(n * 10)).collect::<EntitySet>());
    assert_eq!(rel.max_row_width(), 2);
}

#[test]
fn test_cursor_add_or_join() {
    let mut cursor = empty_cursor();
    cursor.set_variables(&["?a", "?b"]);

    cursor.add_or_join("?a", EntitySet::from([key(1), key(2), key(3)])).unwrap();
    assert_eq!(cursor.relation().len(), 3);

    // intersected with the existing bindings of ?a
    cursor.add_or_join("?a", EntitySet::from([key(2), key(3), key(4)])).unwrap();
    assert_eq!(cursor.get_values_for("?a"), EntitySet::from([key(2), key(3)]));

    // ?b is unbound, so every row is paired with every value
    cursor.add_or_join("?b", EntitySet::from([key(8), key(9)])).unwrap();
    assert_eq!(cursor.relation().len(), 4);
    assert_eq!(cursor.key_rows(&vars(&["?a"])).len(), 2);
}

#[test]
fn test_cursor_merge_into_empty_relation() {
    let mut cursor = empty_cursor();
    cursor.set_variables(&["?s", "?o"]);

    let mut candidate = Relation::new(&["?o", "?s"]);
    candidate.add_two_values("?o", "?s", [(key(1), key(2)), (key(3), key(4))]).unwrap();
    cursor.merge(&candidate).unwrap();

    let mut rows = cursor.key_rows(&vars(&["?s", "?o"]));
    rows.sort();
    assert_eq!(rows, vec![vec![key(2), key(1)], vec![key(4), key(3)]]);
}

#[test]
fn test_cursor_merge_without_partner_empties() {
    let mut cursor = empty_cursor();
    cursor.add_or_join("?s", EntitySet::from([key(1)])).unwrap();

    let mut candidate = Relation::new(&["?s", "?o"]);
    candidate.add_two_values("?s", "?o", [(key(2), key(3))]).unwrap();
    cursor.merge(&candidate).unwrap();
    assert!(cursor.relation().is_empty());
}

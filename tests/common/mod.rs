//! Shared building fixture for the integration tests
//!
//! ```text
//! ahu_1 --feeds--> vav_1 --feeds--> zone_1 --hasPart--> room_1
//!       \-feeds--> vav_2 --feeds--> zone_2
//! sensor_1 --isPointOf--> vav_1
//! ```
//!
//! `bf:isFedBy owl:inverseOf bf:feeds` is declared, so every feeds edge also
//! exists reversed as isFedBy after loading.

#![allow(dead_code)]

use hoddb::api::hoddb::HodDb;
use hoddb::core::{Triple, Uri, OWL_NAMESPACE, RDF_NAMESPACE};
use hoddb::loader::Dataset;
use hoddb::{SelectQuery, TriplePattern};

pub const GRAPH: &str = "test";
pub const EX: &str = "http://example.org/building";
pub const BRICK: &str = "https://brickschema.org/schema/1.1/Brick";
pub const BF: &str = "https://brickschema.org/schema/1.1/BrickFrame";

pub fn ex(value: &str) -> Uri {
    Uri::new(EX, value)
}

pub fn brick(value: &str) -> Uri {
    Uri::new(BRICK, value)
}

pub fn bf(value: &str) -> Uri {
    Uri::new(BF, value)
}

fn typed(subject: &str, class: &str) -> Triple {
    Triple::new(ex(subject), Uri::new(RDF_NAMESPACE, "type"), brick(class))
}

fn rel(subject: &str, predicate: &str, object: &str) -> Triple {
    Triple::new(ex(subject), bf(predicate), ex(object))
}

pub fn building() -> Dataset {
    let mut dataset = Dataset::from_triples(vec![
        typed("ahu_1", "AHU"),
        typed("vav_1", "VAV"),
        typed("vav_2", "VAV"),
        typed("zone_1", "HVAC_Zone"),
        typed("zone_2", "HVAC_Zone"),
        typed("room_1", "Room"),
        typed("sensor_1", "Temperature_Sensor"),
        rel("ahu_1", "feeds", "vav_1"),
        rel("ahu_1", "feeds", "vav_2"),
        rel("vav_1", "feeds", "zone_1"),
        rel("vav_2", "feeds", "zone_2"),
        rel("zone_1", "hasPart", "room_1"),
        rel("sensor_1", "isPointOf", "vav_1"),
        Triple::new(bf("isFedBy"), Uri::new(OWL_NAMESPACE, "inverseOf"), bf("feeds")),
    ]);
    dataset.add_namespace("ex", &format!("{}#", EX));
    dataset.add_namespace("brick", &format!("{}#", BRICK));
    dataset.add_namespace("bf", &format!("{}#", BF));
    dataset
}

/// In-memory database holding one version of the building under `GRAPH`.
pub fn loaded_db() -> HodDb {
    let db = HodDb::in_memory();
    db.insert(GRAPH, building()).expect("fixture loads");
    db
}

pub fn term(subject: &str, path: &str, object: &str) -> TriplePattern {
    TriplePattern::parse(subject, path, object).expect("valid pattern")
}

pub fn query(select: &[&str], terms: Vec<TriplePattern>) -> SelectQuery {
    SelectQuery::new(select, &[GRAPH], terms)
}

/// Local names of the first column, sorted.
pub fn column(db: &HodDb, q: &SelectQuery) -> Vec<String> {
    let response = db.select(q).expect("query runs");
    let mut values: Vec<String> = response.rows.iter().map(|row| row[0].value.clone()).collect();
    values.sort();
    values
}

/// Local names of every row, sorted.
pub fn rows(db: &HodDb, q: &SelectQuery) -> Vec<Vec<String>> {
    let response = db.select(q).expect("query runs");
    let mut values: Vec<Vec<String>> =
        response.rows.iter().map(|row| row.iter().map(|u| u.value.clone()).collect()).collect();
    values.sort();
    values
}

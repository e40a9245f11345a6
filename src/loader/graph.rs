use std::collections::BTreeMap;

use log::debug;

use crate::core::{Entity, EntityKey, Pattern, Triple};
use crate::error::{HodError, Result};
use crate::execution::cursor::Cursor;
use crate::storage::indexing::dictionary::Dictionary;

/// Entities of one graph version, by key
pub type EntityMap = BTreeMap<EntityKey, Entity>;

/// Build the `Single`-edge adjacency of every URI in `triples`.
///
/// All URIs are registered in `dict` first; a hash collision aborts before
/// any entity is built.
pub fn compile_entities(graph: &str, version: u64, triples: &[Triple], dict: &mut Dictionary) -> Result<EntityMap> {
    dict.register_all(graph, triples.iter().flat_map(|t| [&t.subject, &t.predicate, &t.object]))?;

    let mut entities = EntityMap::new();
    for triple in triples {
        let subject = dict.key_for(graph, &triple.subject, version)?;
        let predicate = dict.key_for(graph, &triple.predicate, version)?;
        let object = dict.key_for(graph, &triple.object, version)?;

        entities.entry(subject).or_insert_with(|| Entity::new(subject)).add_out_edge(predicate, object, Pattern::Single);
        entities.entry(object).or_insert_with(|| Entity::new(object)).add_in_edge(predicate, subject, Pattern::Single);
        entities.entry(predicate).or_insert_with(|| Entity::new(predicate)).add_endpoint(subject, object);
    }
    entities.values_mut().for_each(Entity::dedup);
    debug!("compiled {} triples of {} into {} entities", triples.len(), graph, entities.len());
    Ok(entities)
}

/// Add a `OnePlus` edge from every entity to everything it reaches over each
/// of its predicates, and the matching in-edge on the reached entity.
///
/// `cursor` must read the `Single`-edge version of the same entities.
/// Returns the number of out-edges added; each (entity, predicate) walk
/// yields distinct targets, so no edge is added twice.
pub fn materialize(cursor: &Cursor, entities: &mut EntityMap) -> Result<usize> {
    let keys: Vec<EntityKey> = entities.keys().copied().collect();
    let mut added = 0;
    for key in keys {
        let predicates: Vec<EntityKey> = match entities.get(&key) {
            Some(entity) => entity.all_predicates().into_iter().filter(|p| !entity.out_edges(p).is_empty()).collect(),
            None => continue,
        };
        for predicate in predicates {
            let (reached, _) = cursor.follow_path_from_subject(&key, &predicate, Pattern::OnePlus)?;
            for target in reached {
                if let Some(entity) = entities.get_mut(&key) {
                    entity.add_out_edge(predicate, target, Pattern::OnePlus);
                    added += 1;
                }
                match entities.get_mut(&target) {
                    Some(entity) => {
                        entity.add_in_edge(predicate, key, Pattern::OnePlus);
                    }
                    None => {
                        return Err(HodError::Traversal(format!("{} reached unknown entity {}", key, target)));
                    }
                }
            }
        }
    }
    entities.values_mut().for_each(Entity::dedup);
    debug!("materialized {} transitive edges in {} @ {}", added, cursor.graph(), cursor.version());
    Ok(added)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, RwLock};

    use super::*;
    use crate::core::{hash_str, Uri};
    use crate::storage::{EntityStore, MemoryStore};

    fn uri(value: &str) -> Uri {
        Uri::new("http://example.org/building", value)
    }

    fn chain() -> Vec<Triple> {
        vec![
            Triple::new(uri("ahu"), uri("feeds"), uri("vav")),
            Triple::new(uri("vav"), uri("feeds"), uri("zone")),
            Triple::new(uri("zone"), uri("hasPart"), uri("room")),
        ]
    }

    #[test]
    fn test_compile_entities() {
        let mut dict = Dictionary::new();
        let entities = compile_entities("g", 3, &chain(), &mut dict).unwrap();
        assert_eq!(entities.len(), 6);
        assert_eq!(dict.len(), 6);

        let vav = dict.key_for("g", &uri("vav"), 3).unwrap();
        let feeds = dict.key_for("g", &uri("feeds"), 3).unwrap();
        let entity = &entities[&vav];
        assert_eq!(entity.out_edges(&feeds).len(), 1);
        assert_eq!(entity.in_edges(&feeds).len(), 1);
        assert_eq!(entities[&feeds].all_endpoints().len(), 2);
        assert!(entities.keys().all(|k| k.version() == 3));
    }

    #[test]
    fn test_compile_drops_repeated_triples() {
        let mut triples = chain();
        triples.extend(chain());
        let mut dict = Dictionary::new();
        let entities = compile_entities("g", 1, &triples, &mut dict).unwrap();

        let vav = dict.key_for("g", &uri("vav"), 1).unwrap();
        let feeds = dict.key_for("g", &uri("feeds"), 1).unwrap();
        assert_eq!(entities[&vav].out_edges.len(), 1);
        assert_eq!(entities[&vav].in_edges.len(), 1);
        assert_eq!(entities[&feeds].endpoints.len(), 2);
    }

    #[test]
    fn test_materialize_long_chain() {
        let depth = 300usize;
        let triples: Vec<Triple> = (0..depth)
            .map(|n| Triple::new(uri(&format!("n{}", n)), uri("feeds"), uri(&format!("n{}", n + 1))))
            .collect();
        let mut dict = Dictionary::new();
        let mut entities = compile_entities("g", 1, &triples, &mut dict).unwrap();
        let store = Arc::new(MemoryStore::new());
        for entity in entities.values() {
            store.put(entity.key, entity.encode().unwrap()).unwrap();
        }
        let dict = Arc::new(RwLock::new(dict));
        let cursor = Cursor::new("g", 1, store, Arc::clone(&dict));

        assert_eq!(materialize(&cursor, &mut entities).unwrap(), depth * (depth + 1) / 2);

        let key = |name: &str| dict.read().unwrap().key_for("g", &uri(name), 1).unwrap();
        let feeds = key("feeds");
        assert_eq!(entities[&key("n0")].out_plus_edges(&feeds).len(), depth);
        assert_eq!(entities[&key(&format!("n{}", depth))].in_plus_edges(&feeds).len(), depth);
    }

    #[test]
    fn test_collision_aborts_compilation() {
        let mut dict = Dictionary::new();
        dict.hash_to_uri.insert(hash_str(&uri("room").hash_input()), uri("impostor"));

        let err = compile_entities("g", 1, &chain(), &mut dict).unwrap_err();
        assert!(matches!(err, HodError::HashCollision { .. }));
        assert_eq!(dict.len(), 1);
    }

    #[test]
    fn test_materialize_transitive_edges() {
        let mut dict = Dictionary::new();
        let mut entities = compile_entities("g", 1, &chain(), &mut dict).unwrap();
        let store = Arc::new(MemoryStore::new());
        for entity in entities.values() {
            store.put(entity.key, entity.encode().unwrap()).unwrap();
        }
        let dict = Arc::new(RwLock::new(dict));
        let cursor = Cursor::new("g", 1, store, Arc::clone(&dict));

        // ahu->vav, ahu->zone, vav->zone, zone->room
        assert_eq!(materialize(&cursor, &mut entities).unwrap(), 4);

        let key = |name: &str| dict.read().unwrap().key_for("g", &uri(name), 1).unwrap();
        let feeds = key("feeds");
        assert_eq!(entities[&key("ahu")].out_plus_edges(&feeds).len(), 2);
        assert_eq!(entities[&key("zone")].in_plus_edges(&feeds).len(), 2);
        assert!(entities[&key("room")].in_plus_edges(&feeds).is_empty());
    }
}

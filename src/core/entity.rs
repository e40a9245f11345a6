//! Adjacency record of a single graph node

use serde::{Deserialize, Serialize};

use crate::core::{EntityKey, Pattern};
use crate::error::{HodError, Result};

/// One directed edge as seen from its owning entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Edge {
    pub predicate: EntityKey,
    pub value: EntityKey,
    pub pattern: Pattern,
}

/// A (subject, object) pair linked by an entity used as a predicate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Endpoint {
    pub subject: EntityKey,
    pub object: EntityKey,
}

/// All edges touching one URI in one graph version.
///
/// Predicates are compared with [`EntityKey::hash_equals`], so an edge matches
/// the predicate URI regardless of the version stamped on either key.
///
/// The `add_*` methods append without checking for duplicates; call
/// [`Entity::dedup`] once the entity is complete.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub key: EntityKey,
    pub out_edges: Vec<Edge>,
    pub in_edges: Vec<Edge>,
    pub endpoints: Vec<Endpoint>,
}

fn sort_dedup<T: Ord>(list: &mut Vec<T>) {
    list.sort_unstable();
    list.dedup();
}

impl Entity {
    pub fn new(key: EntityKey) -> Self {
        Self { key, ..Default::default() }
    }

    pub fn add_out_edge(&mut self, predicate: EntityKey, value: EntityKey, pattern: Pattern) {
        self.out_edges.push(Edge { predicate, value, pattern });
    }

    pub fn add_in_edge(&mut self, predicate: EntityKey, value: EntityKey, pattern: Pattern) {
        self.in_edges.push(Edge { predicate, value, pattern });
    }

    pub fn add_endpoint(&mut self, subject: EntityKey, object: EntityKey) {
        self.endpoints.push(Endpoint { subject, object });
    }

    /// Sort every edge list and drop repeated entries.
    pub fn dedup(&mut self) {
        sort_dedup(&mut self.out_edges);
        sort_dedup(&mut self.in_edges);
        sort_dedup(&mut self.endpoints);
    }

    /// Targets of `Single` out-edges labelled `predicate`.
    pub fn out_edges(&self, predicate: &EntityKey) -> Vec<EntityKey> {
        single_matching(&self.out_edges, predicate)
    }

    /// Sources of `Single` in-edges labelled `predicate`.
    pub fn in_edges(&self, predicate: &EntityKey) -> Vec<EntityKey> {
        single_matching(&self.in_edges, predicate)
    }

    /// Targets of materialized out-edges labelled `predicate`.
    pub fn out_plus_edges(&self, predicate: &EntityKey) -> Vec<EntityKey> {
        materialized_matching(&self.out_edges, predicate)
    }

    /// Sources of materialized in-edges labelled `predicate`.
    pub fn in_plus_edges(&self, predicate: &EntityKey) -> Vec<EntityKey> {
        materialized_matching(&self.in_edges, predicate)
    }

    /// Every predicate on any edge, de-duplicated by URI hash.
    pub fn all_predicates(&self) -> Vec<EntityKey> {
        let mut preds: Vec<EntityKey> = Vec::new();
        for edge in self.out_edges.iter().chain(self.in_edges.iter()) {
            if !preds.iter().any(|p| p.hash_equals(&edge.predicate)) {
                preds.push(edge.predicate);
            }
        }
        preds
    }

    /// `(predicate, source)` for every `Single` in-edge.
    pub fn all_in_edges(&self) -> Vec<(EntityKey, EntityKey)> {
        self.in_edges.iter().filter(|e| e.pattern == Pattern::Single).map(|e| (e.predicate, e.value)).collect()
    }

    /// `(predicate, target)` for every `Single` out-edge.
    pub fn all_out_edges(&self) -> Vec<(EntityKey, EntityKey)> {
        self.out_edges.iter().filter(|e| e.pattern == Pattern::Single).map(|e| (e.predicate, e.value)).collect()
    }

    /// Objects linked from `subject` when this entity is the predicate.
    pub fn objects_of(&self, subject: &EntityKey) -> Vec<EntityKey> {
        self.endpoints.iter().filter(|ep| ep.subject == *subject).map(|ep| ep.object).collect()
    }

    /// Subjects linking to `object` when this entity is the predicate.
    pub fn subjects_of(&self, object: &EntityKey) -> Vec<EntityKey> {
        self.endpoints.iter().filter(|ep| ep.object == *object).map(|ep| ep.subject).collect()
    }

    /// De-duplicated `(subject, object)` pairs.
    pub fn all_endpoints(&self) -> Vec<(EntityKey, EntityKey)> {
        let mut pairs: Vec<(EntityKey, EntityKey)> = self.endpoints.iter().map(|ep| (ep.subject, ep.object)).collect();
        sort_dedup(&mut pairs);
        pairs
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes).map_err(|e| HodError::Serialization(format!("entity record: {}", e)))
    }
}

fn single_matching(edges: &[Edge], predicate: &EntityKey) -> Vec<EntityKey> {
    edges.iter().filter(|e| e.pattern == Pattern::Single && e.predicate.hash_equals(predicate)).map(|e| e.value).collect()
}

fn materialized_matching(edges: &[Edge], predicate: &EntityKey) -> Vec<EntityKey> {
    edges.iter().filter(|e| e.pattern != Pattern::Single && e.predicate.hash_equals(predicate)).map(|e| e.value).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(n: u8) -> EntityKey {
        EntityKey::new([9, 9, 9, 9], [0, 0, 0, n], 1)
    }

    #[test]
    fn test_edge_accessors_split_single_and_materialized() {
        let feeds = key(1);
        let mut ahu = Entity::new(key(2));
        ahu.add_out_edge(feeds, key(3), Pattern::Single);
        ahu.add_out_edge(feeds, key(4), Pattern::OnePlus);
        ahu.add_in_edge(key(5), key(6), Pattern::Single);

        assert_eq!(ahu.out_edges(&feeds), vec![key(3)]);
        assert_eq!(ahu.out_plus_edges(&feeds), vec![key(4)]);
        assert_eq!(ahu.all_out_edges(), vec![(feeds, key(3))]);
        assert_eq!(ahu.all_in_edges(), vec![(key(5), key(6))]);
        assert_eq!(ahu.all_predicates(), vec![feeds, key(5)]);
    }

    #[test]
    fn test_predicate_match_ignores_version() {
        let mut ent = Entity::new(key(2));
        ent.add_out_edge(key(1), key(3), Pattern::Single);
        assert_eq!(ent.out_edges(&key(1).with_version(99)), vec![key(3)]);
    }

    #[test]
    fn test_dedup_drops_repeated_edges() {
        let mut ent = Entity::new(key(2));
        ent.add_out_edge(key(1), key(4), Pattern::Single);
        ent.add_out_edge(key(1), key(3), Pattern::Single);
        ent.add_out_edge(key(1), key(3), Pattern::Single);
        ent.add_out_edge(key(1), key(3), Pattern::OnePlus);
        ent.add_in_edge(key(1), key(5), Pattern::Single);
        ent.add_in_edge(key(1), key(5), Pattern::Single);
        ent.dedup();
        assert_eq!(ent.out_edges.len(), 3);
        assert_eq!(ent.out_edges(&key(1)), vec![key(3), key(4)]);
        assert_eq!(ent.out_plus_edges(&key(1)), vec![key(3)]);
        assert_eq!(ent.all_in_edges(), vec![(key(1), key(5))]);
    }

    #[test]
    fn test_dedup_large_fan_out() {
        let mut hub = Entity::new(key(0));
        for round in 0..3 {
            for n in 0..20_000u32 {
                hub.add_out_edge(key(1), EntityKey::new([9, 9, 9, 9], n.to_be_bytes(), 1), Pattern::OnePlus);
            }
            assert_eq!(hub.out_edges.len(), 20_000 * (round + 1));
        }
        hub.dedup();
        assert_eq!(hub.out_plus_edges(&key(1)).len(), 20_000);
    }

    #[test]
    fn test_endpoints() {
        let mut feeds = Entity::new(key(1));
        feeds.add_endpoint(key(2), key(3));
        feeds.add_endpoint(key(2), key(4));
        feeds.add_endpoint(key(2), key(3));
        assert_eq!(feeds.all_endpoints().len(), 2);
        feeds.dedup();
        assert_eq!(feeds.objects_of(&key(2)), vec![key(3), key(4)]);
        assert_eq!(feeds.subjects_of(&key(4)), vec![key(2)]);
        assert_eq!(feeds.all_endpoints().len(), 2);
    }

    #[test]
    fn test_encoding() {
        let mut ent = Entity::new(key(2));
        ent.add_out_edge(key(1), key(3), Pattern::Single);

        let bytes = ent.encode().unwrap();
        assert_eq!(Entity::decode(&bytes).unwrap(), ent);
        assert!(Entity::decode(&[1, 2]).is_err());
    }
}

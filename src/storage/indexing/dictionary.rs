use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use log::error;
use serde::{Deserialize, Serialize};

use crate::core::{hash_str, EntityKey, Uri};
use crate::error::{HodError, Result};

/// Append-only URI hash tables.
///
/// `hash_to_uri` resolves the URI hash inside any `EntityKey` back to its
/// URI; `uri_to_key` caches the version-less key of each URI per graph.
/// Registering a second URI under an existing hash is rejected.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Dictionary {
    pub hash_to_uri: HashMap<[u8; 4], Uri>,
    pub uri_to_key: HashMap<String, HashMap<Uri, EntityKey>>,
}

impl Dictionary {
    pub fn new() -> Self {
        Dictionary { hash_to_uri: HashMap::new(), uri_to_key: HashMap::new() }
    }

    fn check_collision(&self, hash: &[u8; 4], uri: &Uri) -> Result<()> {
        match self.hash_to_uri.get(hash) {
            Some(existing) if existing != uri => {
                error!("URI hash collision between {} and {}", existing, uri);
                Err(HodError::HashCollision { existing: existing.to_string(), incoming: uri.to_string() })
            }
            _ => Ok(()),
        }
    }

    /// Register `uri` in `graph` and return its key at version 0.
    pub fn register(&mut self, graph: &str, uri: &Uri) -> Result<EntityKey> {
        if let Some(key) = self.uri_to_key.get(graph).and_then(|m| m.get(uri)) {
            return Ok(*key);
        }
        let key = EntityKey::for_uri(graph, uri, 0);
        self.check_collision(&key.hash, uri)?;
        self.hash_to_uri.insert(key.hash, uri.clone());
        self.uri_to_key.entry(graph.to_string()).or_default().insert(uri.clone(), key);
        Ok(key)
    }

    /// Register every URI of a batch for `graph`, or none of them if any collides.
    pub fn register_all<'a, I>(&mut self, graph: &str, uris: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a Uri>,
    {
        let mut staged: HashMap<[u8; 4], &Uri> = HashMap::new();
        for uri in uris {
            let hash = hash_str(&uri.hash_input());
            self.check_collision(&hash, uri)?;
            if let Some(previous) = staged.insert(hash, uri) {
                if previous != uri {
                    error!("URI hash collision between {} and {}", previous, uri);
                    return Err(HodError::HashCollision { existing: previous.to_string(), incoming: uri.to_string() });
                }
            }
        }
        for uri in staged.into_values() {
            self.register(graph, uri)?;
        }
        Ok(())
    }

    /// Key of `uri` at `version` without registering it.
    ///
    /// Unknown URIs still get a key (one that resolves to no entity); a URI
    /// whose hash belongs to a different registered URI is an error.
    pub fn key_for(&self, graph: &str, uri: &Uri, version: u64) -> Result<EntityKey> {
        if let Some(key) = self.uri_to_key.get(graph).and_then(|m| m.get(uri)) {
            return Ok(key.with_version(version));
        }
        let hash = hash_str(&uri.hash_input());
        self.check_collision(&hash, uri)?;
        Ok(EntityKey::new(hash_str(graph), hash, version))
    }

    pub fn uri_for(&self, key: &EntityKey) -> Option<&Uri> {
        self.hash_to_uri.get(&key.hash)
    }

    pub fn len(&self) -> usize {
        self.hash_to_uri.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hash_to_uri.is_empty()
    }

    pub fn save_to_file(&self, path: &Path) -> std::io::Result<()> {
        let encoded = bincode::serialize(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        let mut file = File::create(path)?;
        file.write_all(&encoded)?;
        Ok(())
    }

    pub fn load_from_file(path: &Path) -> std::io::Result<Self> {
        let mut file = File::open(path)?;
        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)?;
        let dict: Dictionary = bincode::deserialize(&buffer)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        Ok(dict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_resolve() {
        let mut dict = Dictionary::new();
        let ahu = Uri::parse("http://buildsys.org/ontologies/building_example#ahu_1");

        let key = dict.register("soda", &ahu).unwrap();
        assert_eq!(key.version(), 0);
        assert_eq!(dict.register("soda", &ahu).unwrap(), key);
        assert_eq!(dict.uri_for(&key.with_version(12)), Some(&ahu));
        assert_eq!(dict.key_for("soda", &ahu, 12).unwrap(), key.with_version(12));
        assert_eq!(dict.len(), 1);
    }

    #[test]
    fn test_same_uri_in_two_graphs_shares_hash() {
        let mut dict = Dictionary::new();
        let room = Uri::new("https://brickschema.org/schema/1.1/Brick", "Room");
        let a = dict.register("soda", &room).unwrap();
        let b = dict.register("ciee", &room).unwrap();
        assert!(a.hash_equals(&b));
        assert_ne!(a.graph, b.graph);
        assert_eq!(dict.len(), 1);
    }

    #[test]
    fn test_collision_is_rejected() {
        let mut dict = Dictionary::new();
        let real = Uri::parse("http://example.org#a");
        let key = dict.register("g", &real).unwrap();

        // plant a foreign URI under the same hash to simulate a collision
        dict.hash_to_uri.insert(key.hash, Uri::parse("http://example.org#other"));
        let err = dict.key_for("g2", &real, 1).unwrap_err();
        assert!(matches!(err, HodError::HashCollision { .. }));
    }

    #[test]
    fn test_register_all_is_all_or_nothing() {
        let mut dict = Dictionary::new();
        let taken = Uri::parse("http://example.org#taken");
        let key = dict.register("g", &taken).unwrap();
        dict.hash_to_uri.insert(key.hash, Uri::parse("http://example.org#squatter"));

        let fresh = Uri::parse("http://example.org#fresh");
        assert!(dict.register_all("g", [&fresh, &taken]).is_err());
        assert!(dict.key_for("g", &fresh, 0).is_ok());
        assert!(dict.uri_to_key["g"].get(&fresh).is_none());

        dict.register_all("g", [&fresh, &fresh]).unwrap();
        assert_eq!(dict.uri_for(&dict.key_for("g", &fresh, 4).unwrap()), Some(&fresh));
    }

    #[test]
    fn test_unknown_uri_gets_unresolvable_key() {
        let dict = Dictionary::new();
        let key = dict.key_for("g", &Uri::parse("http://example.org#nothing"), 3).unwrap();
        assert!(!key.is_empty());
        assert!(dict.uri_for(&key).is_none());
    }
}

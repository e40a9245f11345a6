//! Binary layout of entity keys

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::Uri;

/// Size of an encoded key in bytes
pub const KEY_SIZE: usize = 16;

/// Length of the graph-hash plus URI-hash prefix shared by every version of an entity
pub const ENTITY_PREFIX_SIZE: usize = 8;

/// Fixed 16-byte identifier of one URI in one graph version.
///
/// Layout: graph hash `[0..4]`, URI hash `[4..8]`, version `[8..16]`. All
/// integers are big-endian so that the byte order of encoded keys sorts
/// versions of the same entity chronologically.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityKey {
    pub graph: [u8; 4],
    pub hash: [u8; 4],
    pub version: [u8; 8],
}

/// 32-bit hash used for both graph names and URIs
pub fn hash_str(value: &str) -> [u8; 4] {
    crc32fast::hash(value.as_bytes()).to_be_bytes()
}

/// Encode a key into a byte buffer
pub fn encode_key(buffer: &mut [u8; KEY_SIZE], key: &EntityKey) {
    buffer[0..4].copy_from_slice(&key.graph);
    buffer[4..8].copy_from_slice(&key.hash);
    buffer[8..16].copy_from_slice(&key.version);
}

/// Decode a byte buffer into a key
pub fn decode_key(buffer: &[u8; KEY_SIZE]) -> EntityKey {
    let mut key = EntityKey::empty();
    key.graph.copy_from_slice(&buffer[0..4]);
    key.hash.copy_from_slice(&buffer[4..8]);
    key.version.copy_from_slice(&buffer[8..16]);
    key
}

impl EntityKey {
    /// The all-zero key, meaning "no value".
    pub const fn empty() -> Self {
        Self { graph: [0; 4], hash: [0; 4], version: [0; 8] }
    }

    pub fn new(graph: [u8; 4], hash: [u8; 4], version: u64) -> Self {
        Self { graph, hash, version: version.to_be_bytes() }
    }

    /// Key of `uri` inside graph `graph_name` at `version`.
    pub fn for_uri(graph_name: &str, uri: &Uri, version: u64) -> Self {
        Self::new(hash_str(graph_name), hash_str(&uri.hash_input()), version)
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::empty()
    }

    /// Compares only the URI hash, ignoring graph and version.
    pub fn hash_equals(&self, other: &EntityKey) -> bool {
        self.hash == other.hash
    }

    pub fn version(&self) -> u64 {
        u64::from_be_bytes(self.version)
    }

    /// Same entity, other version.
    pub fn with_version(&self, version: u64) -> Self {
        Self { graph: self.graph, hash: self.hash, version: version.to_be_bytes() }
    }

    pub fn to_bytes(&self) -> [u8; KEY_SIZE] {
        let mut buffer = [0u8; KEY_SIZE];
        encode_key(&mut buffer, self);
        buffer
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let buffer: &[u8; KEY_SIZE] = bytes.get(..KEY_SIZE)?.try_into().ok()?;
        Some(decode_key(buffer))
    }

    /// Graph hash followed by URI hash.
    pub fn entity_prefix(&self) -> [u8; ENTITY_PREFIX_SIZE] {
        let mut prefix = [0u8; ENTITY_PREFIX_SIZE];
        prefix[0..4].copy_from_slice(&self.graph);
        prefix[4..8].copy_from_slice(&self.hash);
        prefix
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.graph.iter().chain(self.hash.iter()) {
            write!(f, "{:02x}", b)?;
        }
        write!(f, "@{}", self.version())
    }
}

impl fmt::Debug for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityKey({})", self)
    }
}

//! Key-value storage of entity records and the URI hash tables

use crate::core::EntityKey;
use crate::error::Result;

pub mod memory_store;
pub mod indexing {
    pub mod dictionary;
}

pub use memory_store::MemoryStore;

/// Ordered key-value store holding one serialized `Entity` per key.
///
/// Implementations must return entries from `iterate_prefix` in ascending
/// byte order of their encoded keys.
pub trait EntityStore: Send + Sync {
    /// Fetch the record stored under `key`, or `HodError::NotFound`.
    fn get(&self, key: &EntityKey) -> Result<Vec<u8>>;

    fn put(&self, key: EntityKey, value: Vec<u8>) -> Result<()>;

    /// Every entry whose encoded key starts with `prefix`.
    fn iterate_prefix(&self, prefix: &[u8]) -> Result<Vec<(EntityKey, Vec<u8>)>>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

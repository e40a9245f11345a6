use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use crate::core::{EntityKey, KEY_SIZE};
use crate::error::{HodError, Result};
use crate::storage::EntityStore;

/// In-memory ordered entity store, optionally snapshotted to a bincode file.
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<BTreeMap<EntityKey, Vec<u8>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let encoded = bincode::serialize(&*entries)?;
        let mut file = File::create(path)?;
        file.write_all(&encoded)?;
        Ok(())
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let mut file = File::open(path)?;
        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)?;
        let entries: BTreeMap<EntityKey, Vec<u8>> = bincode::deserialize(&buffer)?;
        Ok(Self { entries: Arc::new(RwLock::new(entries)) })
    }
}

/// Smallest key whose encoding starts with `prefix`.
fn lower_bound(prefix: &[u8]) -> EntityKey {
    let mut buffer = [0u8; KEY_SIZE];
    let len = prefix.len().min(KEY_SIZE);
    buffer[..len].copy_from_slice(&prefix[..len]);
    crate::core::decode_key(&buffer)
}

impl EntityStore for MemoryStore {
    fn get(&self, key: &EntityKey) -> Result<Vec<u8>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(key).cloned().ok_or(HodError::NotFound(*key))
    }

    fn put(&self, key: EntityKey, value: Vec<u8>) -> Result<()> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key, value);
        Ok(())
    }

    fn iterate_prefix(&self, prefix: &[u8]) -> Result<Vec<(EntityKey, Vec<u8>)>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        Ok(entries
            .range(lower_bound(prefix)..)
            .take_while(|(k, _)| k.to_bytes().starts_with(prefix))
            .map(|(k, v)| (*k, v.clone()))
            .collect())
    }

    fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}

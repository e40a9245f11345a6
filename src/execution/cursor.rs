//! Per-query execution state over one graph version

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use log::debug;

use crate::core::{hash_str, well_known_namespace, Entity, EntityKey, Uri};
use crate::error::{HodError, Result};
use crate::execution::relation::{EntitySet, Relation};
use crate::storage::indexing::dictionary::Dictionary;
use crate::storage::EntityStore;

/// Reads entities of one graph version and accumulates the bindings of the
/// query running against it.
///
/// Entities fetched from the store are cached for the cursor's lifetime.
pub struct Cursor {
    graph: String,
    graph_hash: [u8; 4],
    version: u64,
    store: Arc<dyn EntityStore>,
    dictionary: Arc<RwLock<Dictionary>>,
    namespaces: HashMap<String, String>,
    relation: Relation,
    cache: RwLock<HashMap<EntityKey, Arc<Entity>>>,
}

impl Cursor {
    pub fn new(graph: &str, version: u64, store: Arc<dyn EntityStore>, dictionary: Arc<RwLock<Dictionary>>) -> Self {
        Self {
            graph: graph.to_string(),
            graph_hash: hash_str(graph),
            version,
            store,
            dictionary,
            namespaces: HashMap::new(),
            relation: Relation::default(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Prefix map used to expand `prefix:local` URIs.
    pub fn with_namespaces(mut self, namespaces: HashMap<String, String>) -> Self {
        self.namespaces = namespaces;
        self
    }

    pub fn graph(&self) -> &str {
        &self.graph
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Reset the relation to hold the given variables and no rows.
    pub fn set_variables<S: AsRef<str>>(&mut self, vars: &[S]) {
        self.relation = Relation::new(vars);
    }

    pub fn relation(&self) -> &Relation {
        &self.relation
    }

    pub fn relation_mut(&mut self) -> &mut Relation {
        &mut self.relation
    }

    pub fn get_entity(&self, key: &EntityKey) -> Result<Arc<Entity>> {
        if let Some(entity) = self.cache.read().unwrap_or_else(PoisonError::into_inner).get(key) {
            return Ok(Arc::clone(entity));
        }
        let bytes = self.store.get(key)?;
        let entity = Arc::new(Entity::decode(&bytes)?);
        self.cache.write().unwrap_or_else(PoisonError::into_inner).insert(*key, Arc::clone(&entity));
        Ok(entity)
    }

    pub fn drop_cache(&self) {
        self.cache.write().unwrap_or_else(PoisonError::into_inner).clear();
    }

    pub fn expand_uri(&self, uri: &Uri) -> Uri {
        match self.namespaces.get(&uri.namespace).map(String::as_str).or_else(|| well_known_namespace(&uri.namespace)) {
            Some(full) => Uri::new(full, &uri.value),
            None => uri.clone(),
        }
    }

    /// Key of `uri` in this cursor's graph and version.
    pub fn contextualize(&self, uri: &Uri) -> Result<EntityKey> {
        let expanded = self.expand_uri(uri);
        self.dictionary.read().unwrap_or_else(PoisonError::into_inner).key_for(&self.graph, &expanded, self.version)
    }

    pub fn uri_for(&self, key: &EntityKey) -> Result<Uri> {
        self.dictionary.read().unwrap_or_else(PoisonError::into_inner).uri_for(key).cloned().ok_or(HodError::NotFound(*key))
    }

    pub fn has_values_for(&self, var: &str) -> bool {
        self.relation.has_values_for(var)
    }

    pub fn get_values_for(&self, var: &str) -> EntitySet {
        self.relation.values_for(var)
    }

    /// Bind `var` to `values`: joined with the existing bindings of `var`,
    /// inserted directly into an empty relation, crossed with the rows of a
    /// relation that does not bind `var` yet.
    pub fn add_or_join(&mut self, var: &str, values: EntitySet) -> Result<()> {
        if self.relation.is_empty() && !self.relation.has_values_for(var) {
            return self.relation.add_one_value(var, values);
        }
        let mut candidate = Relation::new(&[var]);
        candidate.add_one_value(var, values)?;
        self.merge(&candidate)
    }

    /// Combine a candidate relation with the current bindings.
    ///
    /// Joins on every candidate variable that is already bound; when none is
    /// bound the candidate replaces an empty relation or is crossed with the
    /// existing rows.
    pub fn merge(&mut self, candidate: &Relation) -> Result<()> {
        let on: Vec<String> =
            candidate.columns().iter().filter(|v| self.relation.has_values_for(v)).cloned().collect();
        if on.is_empty() && self.relation.is_empty() {
            debug!("replacing empty relation with {} rows", candidate.len());
            self.relation.replace_with(candidate)
        } else {
            debug!("joining {} rows with {} rows on {:?}", self.relation.len(), candidate.len(), on);
            self.relation.join(candidate, &on)
        }
    }

    /// Every entity of this graph version.
    pub fn entities(&self) -> Result<Vec<Entity>> {
        let mut out = Vec::new();
        for (key, bytes) in self.store.iterate_prefix(&self.graph_hash)? {
            if key.version() == self.version {
                out.push(Entity::decode(&bytes)?);
            }
        }
        Ok(out)
    }

    /// Distinct bound tuples of `vars`.
    pub fn key_rows(&self, vars: &[String]) -> Vec<Vec<EntityKey>> {
        self.relation.project(vars)
    }

    /// Distinct bound tuples of `vars`, resolved to URIs.
    pub fn rows_with_vars(&self, vars: &[String]) -> Result<Vec<Vec<Uri>>> {
        let dict = self.dictionary.read().unwrap_or_else(PoisonError::into_inner);
        self.relation
            .project(vars)
            .into_iter()
            .map(|tuple| {
                tuple.iter().map(|key| dict.uri_for(key).cloned().ok_or(HodError::NotFound(*key))).collect()
            })
            .collect()
    }
}

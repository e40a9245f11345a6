//! Database facade
//!
//! `HodDb` owns the entity store, the URI dictionary and the catalogue of
//! graphs and their versions. Every insert produces a complete new version
//! of a graph; queries run against the newest version at or before a
//! requested timestamp.
//!
//! # Example
//!
//! ```ignore
//! let db = HodDb::in_memory();
//! db.load_file("soda", Path::new("soda.ttl"), &[PathBuf::from("Brick.ttl")])?;
//!
//! let query = SelectQuery::new(&["?vav"], &["soda"], vec![TriplePattern::parse("?vav", "a", "brick:VAV")?]);
//! println!("{}", db.select(&query)?);
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::config::HodConfig;
use crate::core::Triple;
use crate::error::{HodError, Result};
use crate::execution::cursor::Cursor;
use crate::loader::{graph, inference, turtle, Dataset};
use crate::planner::QueryPlanner;
use crate::query::{QueryResponse, SelectQuery, ALL_GRAPHS};
use crate::storage::indexing::dictionary::Dictionary;
use crate::storage::{EntityStore, MemoryStore};

const ENTITIES_FILE: &str = "entities.bin";
const DICTIONARY_FILE: &str = "dictionary.bin";
const CATALOG_FILE: &str = "catalog.bin";

/// Versions and prefixes of one graph.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct GraphMeta {
    versions: Vec<u64>,
    namespaces: HashMap<String, String>,
}

pub struct HodDb {
    path: Option<PathBuf>,
    store: Arc<MemoryStore>,
    dictionary: Arc<RwLock<Dictionary>>,
    catalog: RwLock<BTreeMap<String, GraphMeta>>,
    write_lock: Mutex<()>,
}

fn now_nanos() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_nanos() as u64).unwrap_or(0)
}

impl HodDb {
    /// Empty database that never touches the filesystem.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            store: Arc::new(MemoryStore::new()),
            dictionary: Arc::new(RwLock::new(Dictionary::new())),
            catalog: RwLock::new(BTreeMap::new()),
            write_lock: Mutex::new(()),
        }
    }

    /// Restore the snapshot under `database.path` if there is one, then load
    /// every configured graph not already present.
    pub fn open(config: &HodConfig) -> Result<Self> {
        let mut db = Self::in_memory();
        if let Some(path) = &config.database.path {
            std::fs::create_dir_all(path)?;
            if path.join(ENTITIES_FILE).exists() {
                db = Self::restore(path)?;
            }
            db.path = Some(path.clone());
        }

        for (name, file) in &config.database.graphs {
            if db.graphs().contains(name) {
                debug!("graph {} already loaded", name);
                continue;
            }
            db.load_file(name, file, &config.database.ontologies)?;
        }
        Ok(db)
    }

    fn restore(path: &Path) -> Result<Self> {
        let store = MemoryStore::load_from_file(&path.join(ENTITIES_FILE))?;
        let dictionary = Dictionary::load_from_file(&path.join(DICTIONARY_FILE))?;
        let mut buffer = Vec::new();
        File::open(path.join(CATALOG_FILE))?.read_to_end(&mut buffer)?;
        let catalog: BTreeMap<String, GraphMeta> = bincode::deserialize(&buffer)?;
        info!("restored {} entities in {} graphs from {}", store.len(), catalog.len(), path.display());
        Ok(Self {
            path: Some(path.to_path_buf()),
            store: Arc::new(store),
            dictionary: Arc::new(RwLock::new(dictionary)),
            catalog: RwLock::new(catalog),
            write_lock: Mutex::new(()),
        })
    }

    /// Write the store, the dictionary and the catalogue under the configured path.
    pub fn flush(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.store.save_to_file(&path.join(ENTITIES_FILE))?;
        self.dictionary.read().unwrap_or_else(PoisonError::into_inner).save_to_file(&path.join(DICTIONARY_FILE))?;
        let encoded = bincode::serialize(&*self.catalog.read().unwrap_or_else(PoisonError::into_inner))?;
        File::create(path.join(CATALOG_FILE))?.write_all(&encoded)?;
        debug!("flushed snapshot to {}", path.display());
        Ok(())
    }

    /// Flush and release every table.
    pub fn close(self) -> Result<()> {
        self.flush()
    }

    /// Parse `file` plus `ontologies` and insert them into `graph`.
    pub fn load_file(&self, graph: &str, file: &Path, ontologies: &[PathBuf]) -> Result<u64> {
        let mut dataset = turtle::parse_file(file)?;
        for ontology in ontologies {
            dataset.extend(turtle::parse_file(ontology)?);
        }
        self.insert(graph, dataset)
    }

    /// Create a new version of `graph` holding its current triples plus `dataset`.
    pub fn insert(&self, graph_name: &str, dataset: Dataset) -> Result<u64> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let (previous, mut namespaces) = {
            let catalog = self.catalog.read().unwrap_or_else(PoisonError::into_inner);
            match catalog.get(graph_name) {
                Some(meta) => (meta.versions.last().copied(), meta.namespaces.clone()),
                None => (None, HashMap::new()),
            }
        };
        let version = previous.map_or_else(now_nanos, |p| now_nanos().max(p + 1));

        let mut triples = match previous {
            Some(v) => self.snapshot_triples(graph_name, v)?,
            None => Vec::new(),
        };
        let added = dataset.triples.len();
        triples.extend(dataset.triples);
        for (prefix, ns) in dataset.namespaces {
            namespaces.insert(prefix, ns);
        }
        let triples = inference::expand_triples(triples);

        let mut entities = {
            let mut dict = self.dictionary.write().unwrap_or_else(PoisonError::into_inner);
            graph::compile_entities(graph_name, version, &triples, &mut dict)?
        };
        for entity in entities.values() {
            self.store.put(entity.key, entity.encode()?)?;
        }

        let cursor = Cursor::new(graph_name, version, self.store.clone(), Arc::clone(&self.dictionary));
        let materialized = graph::materialize(&cursor, &mut entities)?;
        for entity in entities.values() {
            self.store.put(entity.key, entity.encode()?)?;
        }

        let mut catalog = self.catalog.write().unwrap_or_else(PoisonError::into_inner);
        let meta = catalog.entry(graph_name.to_string()).or_default();
        meta.versions.push(version);
        meta.namespaces = namespaces;
        info!(
            "loaded {} @ {}: {} new triples, {} after inference, {} entities, {} transitive edges",
            graph_name,
            version,
            added,
            triples.len(),
            entities.len(),
            materialized
        );
        Ok(version)
    }

    /// Triples held by the `Single` edges of a stored version.
    fn snapshot_triples(&self, graph_name: &str, version: u64) -> Result<Vec<Triple>> {
        let cursor = Cursor::new(graph_name, version, self.store.clone(), Arc::clone(&self.dictionary));
        let mut triples = Vec::new();
        for entity in cursor.entities()? {
            let subject = cursor.uri_for(&entity.key)?;
            for (predicate, object) in entity.all_out_edges() {
                triples.push(Triple::new(subject.clone(), cursor.uri_for(&predicate)?, cursor.uri_for(&object)?));
            }
        }
        Ok(triples)
    }

    pub fn graphs(&self) -> Vec<String> {
        self.catalog.read().unwrap_or_else(PoisonError::into_inner).keys().cloned().collect()
    }

    /// Version timestamps of `graph`, oldest first.
    pub fn versions(&self, graph_name: &str) -> Result<Vec<u64>> {
        let catalog = self.catalog.read().unwrap_or_else(PoisonError::into_inner);
        catalog.get(graph_name).map(|m| m.versions.clone()).ok_or_else(|| HodError::GraphNotFound(graph_name.to_string()))
    }

    /// Newest version at or before `at`, or the latest one.
    pub fn resolve_version(&self, graph_name: &str, at: Option<u64>) -> Result<u64> {
        let versions = self.versions(graph_name)?;
        let found = match at {
            Some(t) => versions.iter().rev().find(|v| **v <= t).copied(),
            None => versions.last().copied(),
        };
        found.ok_or_else(|| {
            HodError::GraphNotFound(format!("{} has no version at or before {}", graph_name, at.unwrap_or(0)))
        })
    }

    pub fn cursor(&self, graph_name: &str, at: Option<u64>) -> Result<Cursor> {
        let version = self.resolve_version(graph_name, at)?;
        let namespaces = self
            .catalog
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(graph_name)
            .map(|m| m.namespaces.clone())
            .unwrap_or_default();
        Ok(Cursor::new(graph_name, version, self.store.clone(), Arc::clone(&self.dictionary)).with_namespaces(namespaces))
    }

    /// Cursors for every graph the query names; `*` or no graph means all.
    fn query_cursors(&self, query: &SelectQuery) -> Result<Vec<Cursor>> {
        let wildcard = query.graphs.is_empty() || query.graphs.iter().any(|g| g == ALL_GRAPHS);
        if !wildcard {
            return query.graphs.iter().map(|g| self.cursor(g, query.version)).collect();
        }
        let mut cursors = Vec::new();
        for name in self.graphs() {
            match self.cursor(&name, query.version) {
                Ok(cursor) => cursors.push(cursor),
                Err(HodError::GraphNotFound(msg)) => debug!("skipping {}", msg),
                Err(e) => return Err(e),
            }
        }
        Ok(cursors)
    }

    /// Plan and run `query` against `cursor`, leaving the bindings in its relation.
    pub fn execute(&self, cursor: &mut Cursor, query: &SelectQuery) -> Result<()> {
        let plan = QueryPlanner::new(cursor).plan(query)?;
        cursor.set_variables(&plan.variables);
        for op in &plan.operations {
            op.run(cursor)?;
            if cursor.relation().is_empty() {
                debug!("{} left no rows", op);
                break;
            }
        }
        Ok(())
    }

    pub fn select(&self, query: &SelectQuery) -> Result<QueryResponse> {
        self.run(query, true)
    }

    /// Same count as `select`, without resolving row values.
    pub fn count(&self, query: &SelectQuery) -> Result<QueryResponse> {
        self.run(query, false)
    }

    fn run(&self, query: &SelectQuery, with_rows: bool) -> Result<QueryResponse> {
        let mut response = QueryResponse { variables: query.select.clone(), ..Default::default() };
        for mut cursor in self.query_cursors(query)? {
            self.execute(&mut cursor, query)?;
            response.version = response.version.max(cursor.version());
            if with_rows {
                let rows = cursor.rows_with_vars(&query.select)?;
                response.count += rows.len();
                response.rows.extend(rows);
            } else {
                response.count += cursor.key_rows(&query.select).len();
            }
        }
        Ok(response)
    }

    /// Operator list per graph, one line per operator.
    pub fn explain(&self, query: &SelectQuery) -> Result<String> {
        let mut out = String::new();
        for cursor in self.query_cursors(query)? {
            let plan = QueryPlanner::new(&cursor).plan(query)?;
            out.push_str(&format!("{} @ {}\n{}", cursor.graph(), cursor.version(), plan));
        }
        Ok(out)
    }
}

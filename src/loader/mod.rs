//! Graph loading
//!
//! Input files are read into a [`Dataset`], expanded with inverse-property
//! inference, compiled into one [`Entity`](crate::core::Entity) per URI and
//! finally enriched with the materialized edges that answer `+` and `*`
//! paths without walking the graph at query time.

use std::collections::HashMap;

use crate::core::Triple;

pub mod graph;
pub mod inference;
pub mod turtle;

/// Triples plus the prefix map of the files they came from.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dataset {
    pub triples: Vec<Triple>,
    /// Prefix to namespace, namespaces stored without a trailing `#`
    pub namespaces: HashMap<String, String>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_triples(triples: Vec<Triple>) -> Self {
        Self { triples, namespaces: HashMap::new() }
    }

    pub fn add_namespace(&mut self, prefix: &str, namespace: &str) {
        let namespace = namespace.strip_suffix('#').unwrap_or(namespace);
        self.namespaces.insert(prefix.to_string(), namespace.to_string());
    }

    /// Append the triples and prefixes of `other`; existing prefixes win.
    pub fn extend(&mut self, other: Dataset) {
        self.triples.extend(other.triples);
        for (prefix, ns) in other.namespaces {
            self.namespaces.entry(prefix).or_insert(ns);
        }
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }
}

//! Core data structures shared by the store, the loader and the query engine

use std::fmt;

use serde::{Deserialize, Serialize};

pub const RDF_NAMESPACE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns";
pub const OWL_NAMESPACE: &str = "http://www.w3.org/2002/07/owl";
pub const RDFS_NAMESPACE: &str = "http://www.w3.org/2000/01/rdf-schema";

/// Namespaces understood without a prefix declaration.
pub fn well_known_namespace(prefix: &str) -> Option<&'static str> {
    match prefix {
        "rdf" => Some(RDF_NAMESPACE),
        "rdfs" => Some(RDFS_NAMESPACE),
        "owl" => Some(OWL_NAMESPACE),
        _ => None,
    }
}

/// A URI split into namespace and local value.
///
/// `https://brickschema.org/schema/1.1/Brick#AHU` is stored as namespace
/// `https://brickschema.org/schema/1.1/Brick` and value `AHU`. Literals keep
/// their quotes in `value` and an empty namespace.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Uri {
    pub namespace: String,
    pub value: String,
}

impl Uri {
    pub fn new(namespace: &str, value: &str) -> Self {
        Self { namespace: namespace.to_string(), value: value.to_string() }
    }

    /// Split a full URI string at its last `#`.
    pub fn parse(full: &str) -> Self {
        match full.rfind('#') {
            Some(idx) => Self::new(&full[..idx], &full[idx + 1..]),
            None => Self::new("", full),
        }
    }

    /// Read one term as written in a data file or a query.
    ///
    /// Accepts `?var`, `<full-iri>`, `"literal"`, the keyword `a`,
    /// `prefix:local` (namespace left as the bare prefix) and bare full IRIs.
    pub fn from_term(text: &str) -> Self {
        let text = text.trim();
        if text == "a" {
            return Self::new(RDF_NAMESPACE, "type");
        }
        if text.starts_with('?') || text.starts_with('"') {
            return Self::new("", text);
        }
        if let Some(inner) = text.strip_prefix('<').and_then(|t| t.strip_suffix('>')) {
            return Self::parse(inner);
        }
        if text.contains("://") || text.contains('#') {
            return Self::parse(text);
        }
        match text.split_once(':') {
            Some((prefix, local)) => Self::new(prefix, local),
            None => Self::new("", text),
        }
    }

    /// Variables are written `?name`.
    pub fn is_variable(&self) -> bool {
        self.namespace.is_empty() && self.value.starts_with('?')
    }

    /// The bytes hashed into an `EntityKey`.
    pub fn hash_input(&self) -> String {
        if self.namespace.is_empty() {
            self.value.clone()
        } else {
            format!("{}#{}", self.namespace, self.value)
        }
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}", self.value)
        } else if self.namespace.contains(':') {
            write!(f, "{}#{}", self.namespace, self.value)
        } else {
            // unexpanded prefix
            write!(f, "{}:{}", self.namespace, self.value)
        }
    }
}

/// A data triple as read from an input file.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Triple {
    pub subject: Uri,
    pub predicate: Uri,
    pub object: Uri,
}

impl Triple {
    pub fn new(subject: Uri, predicate: Uri, object: Uri) -> Self {
        Self { subject, predicate, object }
    }
}

/// Property-path quantifier on an edge or a path segment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Pattern {
    /// Exactly one hop
    #[default]
    Single,
    /// `?`: zero or one hop
    ZeroOne,
    /// `+`: one or more hops
    OnePlus,
    /// `*`: zero or more hops
    ZeroPlus,
}

impl Pattern {
    /// Parse the suffix used in textual paths (`""`, `"?"`, `"+"`, `"*"`).
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "" => Some(Pattern::Single),
            "?" => Some(Pattern::ZeroOne),
            "+" => Some(Pattern::OnePlus),
            "*" => Some(Pattern::ZeroPlus),
            _ => None,
        }
    }

    pub fn suffix(&self) -> &'static str {
        match self {
            Pattern::Single => "",
            Pattern::ZeroOne => "?",
            Pattern::OnePlus => "+",
            Pattern::ZeroPlus => "*",
        }
    }
}

pub mod encoding;
pub mod entity;
pub use encoding::*;
pub use entity::{Edge, Endpoint, Entity};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uri_parse_splits_on_last_hash() {
        let uri = Uri::parse("https://brickschema.org/schema/1.1/Brick#AHU");
        assert_eq!(uri.namespace, "https://brickschema.org/schema/1.1/Brick");
        assert_eq!(uri.value, "AHU");
        assert_eq!(uri.to_string(), "https://brickschema.org/schema/1.1/Brick#AHU");

        let plain = Uri::parse("http://example.org/a");
        assert_eq!(plain.namespace, "");
        assert_eq!(plain.value, "http://example.org/a");
    }

    #[test]
    fn test_from_term() {
        assert_eq!(Uri::from_term("a"), Uri::new(RDF_NAMESPACE, "type"));
        assert_eq!(Uri::from_term("?vav"), Uri::new("", "?vav"));
        assert_eq!(Uri::from_term("brick:VAV"), Uri::new("brick", "VAV"));
        assert_eq!(Uri::from_term("<http://example.org/b#x>"), Uri::new("http://example.org/b", "x"));
        assert_eq!(Uri::from_term("http://example.org/b#x"), Uri::new("http://example.org/b", "x"));
        assert_eq!(Uri::from_term("\"72\""), Uri::new("", "\"72\""));
        assert_eq!(Uri::from_term(&Uri::new("brick", "VAV").to_string()), Uri::new("brick", "VAV"));
    }

    #[test]
    fn test_variable_detection() {
        assert!(Uri::parse("?vav").is_variable());
        assert!(!Uri::new("ex", "?odd").is_variable());
    }

    #[test]
    fn test_pattern_suffix() {
        for p in [Pattern::Single, Pattern::ZeroOne, Pattern::OnePlus, Pattern::ZeroPlus] {
            assert_eq!(Pattern::from_suffix(p.suffix()), Some(p));
        }
        assert_eq!(Pattern::from_suffix("{2}"), None);
    }
}

//! Query and response types
//!
//! Queries are plain data: the selected variables, the graphs to run
//! against, an optional snapshot timestamp and a conjunction of triple
//! patterns whose predicate position may hold a property path.
//!
//! # Example
//!
//! ```json
//! {
//!   "select": ["?vav", "?zone"],
//!   "graphs": ["soda"],
//!   "where": [
//!     ["?vav", "rdf:type", "brick:VAV"],
//!     ["?vav", "bf:feeds+", "?zone"]
//!   ]
//! }
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::{Pattern, Uri};
use crate::error::{HodError, Result};

/// Graph name that runs a query against every loaded graph
pub const ALL_GRAPHS: &str = "*";

/// One predicate of a property path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathSegment {
    pub predicate: Uri,
    pub pattern: Pattern,
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // full IRIs contain '/', so they are bracketed to survive re-parsing
        if self.predicate.namespace.contains(':') || self.predicate.value.contains("://") {
            write!(f, "<{}>{}", self.predicate, self.pattern.suffix())
        } else {
            write!(f, "{}{}", self.predicate, self.pattern.suffix())
        }
    }
}

/// `subject path object`, any position of which may be a `?variable`.
///
/// Serialized as a three-string array, the path written as `/`-separated
/// predicates each with an optional `?`, `+` or `*` suffix. A predicate may
/// be a full IRI, either as `<iri>` or bare (`scheme://...#local`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "[String; 3]", into = "[String; 3]")]
pub struct TriplePattern {
    pub subject: Uri,
    pub path: Vec<PathSegment>,
    pub object: Uri,
}

/// Split a path at the `/` separators.
///
/// A `/` inside `<...>` is part of the IRI. A bare IRI starting with
/// `scheme://` runs up to the first `/` after its `#`, or to the end of the
/// path when it has no `#`.
fn split_path(text: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut bracketed = false;
    let mut bare_iri = false;
    for (idx, c) in text.char_indices() {
        match c {
            '<' => bracketed = true,
            '>' => bracketed = false,
            '/' if !bracketed => {
                let piece = &text[start..idx];
                if bare_iri {
                    if !piece.contains('#') {
                        continue;
                    }
                } else if piece.ends_with(':') && text[idx..].starts_with("//") {
                    bare_iri = true;
                    continue;
                }
                segments.push(piece);
                start = idx + 1;
                bare_iri = false;
            }
            _ => {}
        }
    }
    segments.push(&text[start..]);
    segments
}

fn parse_path(text: &str) -> Result<Vec<PathSegment>> {
    let mut path = Vec::new();
    for raw in split_path(text) {
        let raw = raw.trim();
        let (body, pattern) = match raw.char_indices().last() {
            Some((idx, c @ ('?' | '+' | '*'))) if idx > 0 => {
                let pattern = Pattern::from_suffix(&c.to_string()).unwrap_or_default();
                (&raw[..idx], pattern)
            }
            _ => (raw, Pattern::Single),
        };
        if body.is_empty() {
            return Err(HodError::Parse(format!("empty segment in path '{}'", text)));
        }
        path.push(PathSegment { predicate: Uri::from_term(body), pattern });
    }
    Ok(path)
}

impl TriplePattern {
    pub fn parse(subject: &str, path: &str, object: &str) -> Result<Self> {
        Ok(Self { subject: Uri::from_term(subject), path: parse_path(path)?, object: Uri::from_term(object) })
    }

    /// Distinct variable names in subject, path and object order.
    pub fn variables(&self) -> Vec<String> {
        let mut vars: Vec<String> = Vec::new();
        let nodes = std::iter::once(&self.subject)
            .chain(self.path.iter().map(|s| &s.predicate))
            .chain(std::iter::once(&self.object));
        for node in nodes {
            if node.is_variable() && !vars.contains(&node.value) {
                vars.push(node.value.clone());
            }
        }
        vars
    }

    fn path_text(&self) -> String {
        self.path.iter().map(ToString::to_string).collect::<Vec<_>>().join("/")
    }
}

impl TryFrom<[String; 3]> for TriplePattern {
    type Error = HodError;

    fn try_from(parts: [String; 3]) -> Result<Self> {
        Self::parse(&parts[0], &parts[1], &parts[2])
    }
}

impl From<TriplePattern> for [String; 3] {
    fn from(pattern: TriplePattern) -> Self {
        [pattern.subject.to_string(), pattern.path_text(), pattern.object.to_string()]
    }
}

impl fmt::Display for TriplePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.subject, self.path_text(), self.object)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectQuery {
    pub select: Vec<String>,
    #[serde(default)]
    pub graphs: Vec<String>,
    /// Newest version at or before this timestamp; latest when absent
    #[serde(default)]
    pub version: Option<u64>,
    #[serde(rename = "where")]
    pub terms: Vec<TriplePattern>,
}

impl SelectQuery {
    pub fn new(select: &[&str], graphs: &[&str], terms: Vec<TriplePattern>) -> Self {
        Self {
            select: select.iter().map(|s| s.to_string()).collect(),
            graphs: graphs.iter().map(|s| s.to_string()).collect(),
            version: None,
            terms,
        }
    }

    pub fn at_version(mut self, version: u64) -> Self {
        self.version = Some(version);
        self
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| HodError::Parse(e.to_string()))
    }

    /// Every variable mentioned, selected ones first.
    pub fn all_variables(&self) -> Vec<String> {
        let mut vars = self.select.clone();
        for term in &self.terms {
            for var in term.variables() {
                if !vars.contains(&var) {
                    vars.push(var);
                }
            }
        }
        vars
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub variables: Vec<String>,
    pub rows: Vec<Vec<Uri>>,
    pub count: usize,
    pub version: u64,
}

impl fmt::Display for QueryResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells: Vec<Vec<String>> =
            self.rows.iter().map(|row| row.iter().map(|u| u.value.clone()).collect()).collect();
        let widths: Vec<usize> = self
            .variables
            .iter()
            .enumerate()
            .map(|(i, v)| cells.iter().map(|r| r.get(i).map_or(0, String::len)).max().unwrap_or(0).max(v.len()))
            .collect();

        let header: Vec<String> = self.variables.iter().zip(&widths).map(|(v, w)| format!("{:<w$}", v, w = w)).collect();
        writeln!(f, "{}", header.join(" | "))?;
        writeln!(f, "{}", widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("-+-"))?;
        for row in &cells {
            let line: Vec<String> = row.iter().zip(&widths).map(|(c, w)| format!("{:<w$}", c, w = w)).collect();
            writeln!(f, "{}", line.join(" | "))?;
        }
        write!(f, "{} rows @ version {}", self.count, self.version)
    }
}

use std::fmt;

use crate::core::{EntityKey, Pattern};
use crate::error::{HodError, Result};
use crate::execution::cursor::Cursor;
use crate::execution::traversal::PathEdge;
use crate::query::TriplePattern;

/// A triple pattern resolved against one cursor.
///
/// Bound positions carry the key of their URI in the cursor's graph version;
/// variable positions carry the empty key and their name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryTerm {
    pub subject: EntityKey,
    pub object: EntityKey,
    pub path: Vec<PathEdge>,
    subject_var: Option<String>,
    predicate_var: Option<String>,
    object_var: Option<String>,
    /// Distinct free variables
    pub variables: Vec<String>,
    text: String,
}

impl QueryTerm {
    pub fn new(pattern: &TriplePattern, cursor: &Cursor) -> Result<Self> {
        if pattern.path.is_empty() {
            return Err(HodError::Planning(format!("term '{}' has no predicate", pattern)));
        }
        let mut predicate_var = None;
        let mut path = Vec::with_capacity(pattern.path.len());
        for (idx, segment) in pattern.path.iter().enumerate() {
            if segment.predicate.is_variable() {
                if idx > 0 || pattern.path.len() > 1 || segment.pattern != Pattern::Single {
                    return Err(HodError::Planning(format!(
                        "predicate variable in '{}' must be a single unquantified hop",
                        pattern
                    )));
                }
                predicate_var = Some(segment.predicate.value.clone());
                path.push(PathEdge::new(EntityKey::empty(), Pattern::Single));
            } else {
                path.push(PathEdge::new(cursor.contextualize(&segment.predicate)?, segment.pattern));
            }
        }

        let (subject, subject_var) = if pattern.subject.is_variable() {
            (EntityKey::empty(), Some(pattern.subject.value.clone()))
        } else {
            (cursor.contextualize(&pattern.subject)?, None)
        };
        let (object, object_var) = if pattern.object.is_variable() {
            (EntityKey::empty(), Some(pattern.object.value.clone()))
        } else {
            (cursor.contextualize(&pattern.object)?, None)
        };

        Ok(Self {
            subject,
            object,
            path,
            subject_var,
            predicate_var,
            object_var,
            variables: pattern.variables(),
            text: pattern.to_string(),
        })
    }

    pub fn subject_var(&self) -> Option<&str> {
        self.subject_var.as_deref()
    }

    pub fn predicate_var(&self) -> Option<&str> {
        self.predicate_var.as_deref()
    }

    pub fn object_var(&self) -> Option<&str> {
        self.object_var.as_deref()
    }

    /// Number of variable positions, counting a repeated variable once per position.
    pub fn num_var_positions(&self) -> usize {
        [&self.subject_var, &self.predicate_var, &self.object_var].iter().filter(|v| v.is_some()).count()
    }

    /// Number of free variables shared with `other`.
    pub fn overlap(&self, other: &QueryTerm) -> usize {
        self.variables.iter().filter(|v| other.variables.contains(v)).count()
    }

    /// Key of the first predicate; empty when it is a variable.
    pub fn predicate(&self) -> EntityKey {
        self.path.first().map(|edge| edge.predicate).unwrap_or_default()
    }
}

impl fmt::Display for QueryTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.text)
    }
}

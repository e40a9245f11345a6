use std::collections::HashMap;
use std::fmt;

use log::debug;

use crate::error::{HodError, Result};
use crate::execution::cursor::Cursor;
use crate::execution::operators::Operator;
use crate::planner::{order_terms, QueryTerm};
use crate::query::SelectQuery;

/// How an earlier term binds a variable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VarState {
    /// Bound on its own
    Resolved,
    /// Bound together with the named parent variable
    Linked(String),
}

/// Operators for one query against one cursor, in execution order.
#[derive(Clone, Debug)]
pub struct QueryPlan {
    /// Every variable of the query, selected ones first
    pub variables: Vec<String>,
    pub selected: Vec<String>,
    pub operations: Vec<Operator>,
    vars: HashMap<String, VarState>,
}

impl QueryPlan {
    fn new(query: &SelectQuery) -> Self {
        Self {
            variables: query.all_variables(),
            selected: query.select.clone(),
            operations: Vec::new(),
            vars: HashMap::new(),
        }
    }

    pub fn has_var(&self, var: &str) -> bool {
        self.vars.contains_key(var)
    }

    pub fn var_is_child(&self, var: &str) -> bool {
        matches!(self.vars.get(var), Some(VarState::Linked(_)))
    }

    pub fn var_is_top(&self, var: &str) -> bool {
        matches!(self.vars.get(var), Some(VarState::Resolved))
    }

    pub fn var_state(&self, var: &str) -> Option<&VarState> {
        self.vars.get(var)
    }

    fn add_top_level(&mut self, var: &str) {
        self.vars.insert(var.to_string(), VarState::Resolved);
    }

    fn add_top_level_unless_child(&mut self, var: &str) {
        if !self.var_is_child(var) {
            self.add_top_level(var);
        }
    }

    fn add_link(&mut self, parent: &str, child: &str) {
        if parent != child {
            self.vars.insert(child.to_string(), VarState::Linked(parent.to_string()));
        }
    }

    /// Pick the operator for `term` and record the variables it binds.
    fn select_operator(&mut self, term: QueryTerm) -> Result<Operator> {
        let s = term.subject_var().map(str::to_string);
        let p = term.predicate_var().map(str::to_string);
        let o = term.object_var().map(str::to_string);

        let op = match (s.as_deref(), p.as_deref(), o.as_deref()) {
            (None, None, None) => Operator::CheckTriple(term),
            (Some(s), None, None) => {
                self.add_top_level_unless_child(s);
                Operator::ResolveSubject(term)
            }
            (None, None, Some(o)) => {
                self.add_top_level_unless_child(o);
                Operator::ResolveObject(term)
            }
            (None, Some(p), None) => {
                self.add_top_level_unless_child(p);
                Operator::ResolvePredicate(term)
            }
            (Some(s), Some(p), Some(o)) => {
                if self.has_var(s) {
                    self.add_link(s, p);
                    self.add_link(s, o);
                    Operator::ResolveVarTripleFromSubject(term)
                } else if self.has_var(o) {
                    self.add_link(o, s);
                    self.add_link(o, p);
                    Operator::ResolveVarTripleFromObject(term)
                } else if self.has_var(p) {
                    self.add_link(p, s);
                    self.add_link(p, o);
                    Operator::ResolveVarTripleFromPredicate(term)
                } else {
                    return Err(HodError::Planning(format!(
                        "{} would scan the whole graph; bind one of its variables in an earlier term",
                        term
                    )));
                }
            }
            (Some(s), None, Some(o)) => match (self.has_var(s), self.has_var(o)) {
                (true, true) => {
                    if self.var_is_child(s) || (!self.var_is_child(o) && self.var_is_top(s)) {
                        self.add_link(s, o);
                    } else {
                        self.add_link(o, s);
                    }
                    Operator::RestrictSubjectObjectByPredicate(term)
                }
                (false, true) => {
                    self.add_link(o, s);
                    Operator::ResolveSubjectFromVarObject(term)
                }
                (true, false) => {
                    self.add_link(s, o);
                    Operator::ResolveObjectFromVarSubject(term)
                }
                (false, false) => {
                    self.add_top_level(s);
                    self.add_link(s, o);
                    Operator::RestrictSubjectObjectByPredicate(term)
                }
            },
            (Some(s), Some(p), None) => {
                self.add_link(s, p);
                Operator::ResolveSubjectPredFromObject(term)
            }
            (None, Some(p), Some(o)) => {
                self.add_link(o, p);
                Operator::ResolvePredObjectFromSubject(term)
            }
        };
        Ok(op)
    }
}

impl fmt::Display for QueryPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, op) in self.operations.iter().enumerate() {
            writeln!(f, "{:>3}: {}", i, op)?;
        }
        Ok(())
    }
}

/// Builds a `QueryPlan` for one cursor.
pub struct QueryPlanner<'a> {
    cursor: &'a Cursor,
}

impl<'a> QueryPlanner<'a> {
    pub fn new(cursor: &'a Cursor) -> Self {
        Self { cursor }
    }

    pub fn plan(&self, query: &SelectQuery) -> Result<QueryPlan> {
        if query.terms.is_empty() {
            return Err(HodError::Planning("query has no terms".to_string()));
        }
        let resolved: Vec<QueryTerm> =
            query.terms.iter().map(|t| QueryTerm::new(t, self.cursor)).collect::<Result<_>>()?;
        let order = order_terms(&resolved);
        let mut terms: Vec<Option<QueryTerm>> = resolved.into_iter().map(Some).collect();

        let mut plan = QueryPlan::new(query);
        for idx in order {
            let term = terms[idx].take().ok_or_else(|| HodError::Planning(format!("term {} planned twice", idx)))?;
            let op = plan.select_operator(term)?;
            plan.operations.push(op);
        }
        debug!("plan for {} @ {}:\n{}", self.cursor.graph(), self.cursor.version(), plan);
        Ok(plan)
    }
}

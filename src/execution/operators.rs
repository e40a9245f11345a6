//! Binding operators
//!
//! Each operator resolves the variable positions of one planned term and
//! merges the candidate bindings into the cursor's relation. A bound
//! endpoint missing from the graph yields no candidates, which empties the
//! relation instead of failing the query.

use std::fmt;

use log::debug;

use crate::core::EntityKey;
use crate::error::{HodError, Result};
use crate::execution::cursor::Cursor;
use crate::execution::relation::{EntitySet, Relation};
use crate::planner::QueryTerm;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operator {
    /// `s p o`: keep the current rows if the triple holds, drop them all otherwise
    CheckTriple(QueryTerm),
    /// `?s p o`
    ResolveSubject(QueryTerm),
    /// `s p ?o`
    ResolveObject(QueryTerm),
    /// `s ?p o`
    ResolvePredicate(QueryTerm),
    /// `?s p ?o` from the predicate, whichever of the ends is bound
    RestrictSubjectObjectByPredicate(QueryTerm),
    /// `?s p ?o` with `?o` bound
    ResolveSubjectFromVarObject(QueryTerm),
    /// `?s p ?o` with `?s` bound
    ResolveObjectFromVarSubject(QueryTerm),
    /// `?s ?p o`
    ResolveSubjectPredFromObject(QueryTerm),
    /// `s ?p ?o`
    ResolvePredObjectFromSubject(QueryTerm),
    /// `?s ?p ?o` with `?s` bound
    ResolveVarTripleFromSubject(QueryTerm),
    /// `?s ?p ?o` with `?o` bound
    ResolveVarTripleFromObject(QueryTerm),
    /// `?s ?p ?o` with `?p` bound
    ResolveVarTripleFromPredicate(QueryTerm),
}

fn var_of<'a>(role: Option<&'a str>, term: &QueryTerm, name: &str) -> Result<&'a str> {
    role.ok_or_else(|| HodError::Planning(format!("expected a {} variable in {}", name, term)))
}

impl Operator {
    pub fn term(&self) -> &QueryTerm {
        match self {
            Operator::CheckTriple(t)
            | Operator::ResolveSubject(t)
            | Operator::ResolveObject(t)
            | Operator::ResolvePredicate(t)
            | Operator::RestrictSubjectObjectByPredicate(t)
            | Operator::ResolveSubjectFromVarObject(t)
            | Operator::ResolveObjectFromVarSubject(t)
            | Operator::ResolveSubjectPredFromObject(t)
            | Operator::ResolvePredObjectFromSubject(t)
            | Operator::ResolveVarTripleFromSubject(t)
            | Operator::ResolveVarTripleFromObject(t)
            | Operator::ResolveVarTripleFromPredicate(t) => t,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Operator::CheckTriple(_) => "CheckTriple",
            Operator::ResolveSubject(_) => "ResolveSubject",
            Operator::ResolveObject(_) => "ResolveObject",
            Operator::ResolvePredicate(_) => "ResolvePredicate",
            Operator::RestrictSubjectObjectByPredicate(_) => "RestrictSubjectObjectByPredicate",
            Operator::ResolveSubjectFromVarObject(_) => "ResolveSubjectFromVarObject",
            Operator::ResolveObjectFromVarSubject(_) => "ResolveObjectFromVarSubject",
            Operator::ResolveSubjectPredFromObject(_) => "ResolveSubjectPredFromObject",
            Operator::ResolvePredObjectFromSubject(_) => "ResolvePredObjectFromSubject",
            Operator::ResolveVarTripleFromSubject(_) => "ResolveVarTripleFromSubject",
            Operator::ResolveVarTripleFromObject(_) => "ResolveVarTripleFromObject",
            Operator::ResolveVarTripleFromPredicate(_) => "ResolveVarTripleFromPredicate",
        }
    }

    pub fn run(&self, cursor: &mut Cursor) -> Result<()> {
        let term = self.term();
        debug!("running {} {} on {} rows", self.name(), term, cursor.relation().len());
        match self {
            Operator::CheckTriple(_) => check_triple(term, cursor),
            Operator::ResolveSubject(_) => {
                let var = var_of(term.subject_var(), term, "subject")?;
                let subjects = cursor.get_subject_from_pred_object(&term.object, &term.path)?;
                cursor.add_or_join(var, subjects)
            }
            Operator::ResolveObject(_) => {
                let var = var_of(term.object_var(), term, "object")?;
                let objects = cursor.get_object_from_subject_pred(&term.subject, &term.path)?;
                cursor.add_or_join(var, objects)
            }
            Operator::ResolvePredicate(_) => {
                let var = var_of(term.predicate_var(), term, "predicate")?;
                let preds = cursor.get_predicate_from_subject_object(&term.subject, &term.object)?;
                cursor.add_or_join(var, preds)
            }
            Operator::RestrictSubjectObjectByPredicate(_) => restrict_subject_object(term, cursor),
            Operator::ResolveSubjectFromVarObject(_) => {
                let svar = var_of(term.subject_var(), term, "subject")?;
                let ovar = var_of(term.object_var(), term, "object")?;
                let pairs = subjects_for_objects(cursor, term, &cursor.get_values_for(ovar))?;
                merge_pairs(cursor, svar, ovar, pairs)
            }
            Operator::ResolveObjectFromVarSubject(_) => {
                let svar = var_of(term.subject_var(), term, "subject")?;
                let ovar = var_of(term.object_var(), term, "object")?;
                let pairs = objects_for_subjects(cursor, term, &cursor.get_values_for(svar))?;
                merge_pairs(cursor, svar, ovar, pairs)
            }
            Operator::ResolveSubjectPredFromObject(_) => {
                let svar = var_of(term.subject_var(), term, "subject")?;
                let pvar = var_of(term.predicate_var(), term, "predicate")?;
                let pairs = cursor.get_subject_pred_from_object(&term.object)?;
                merge_pairs(cursor, svar, pvar, pairs)
            }
            Operator::ResolvePredObjectFromSubject(_) => {
                let pvar = var_of(term.predicate_var(), term, "predicate")?;
                let ovar = var_of(term.object_var(), term, "object")?;
                let pairs = cursor.get_pred_object_from_subject(&term.subject)?;
                merge_pairs(cursor, pvar, ovar, pairs)
            }
            Operator::ResolveVarTripleFromSubject(_) => {
                let (svar, pvar, ovar) = triple_vars(term)?;
                let mut triples = Vec::new();
                for subject in cursor.get_values_for(svar) {
                    for (pred, object) in cursor.get_pred_object_from_subject(&subject)? {
                        triples.push((subject, pred, object));
                    }
                }
                merge_triples(cursor, (svar, pvar, ovar), triples)
            }
            Operator::ResolveVarTripleFromObject(_) => {
                let (svar, pvar, ovar) = triple_vars(term)?;
                let mut triples = Vec::new();
                for object in cursor.get_values_for(ovar) {
                    for (subject, pred) in cursor.get_subject_pred_from_object(&object)? {
                        triples.push((subject, pred, object));
                    }
                }
                merge_triples(cursor, (svar, pvar, ovar), triples)
            }
            Operator::ResolveVarTripleFromPredicate(_) => {
                let (svar, pvar, ovar) = triple_vars(term)?;
                let mut triples = Vec::new();
                for pred in cursor.get_values_for(pvar) {
                    for (subject, object) in cursor.get_subject_object_from_pred(&pred)? {
                        triples.push((subject, pred, object));
                    }
                }
                merge_triples(cursor, (svar, pvar, ovar), triples)
            }
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} {}]", self.name(), self.term())
    }
}

fn triple_vars(term: &QueryTerm) -> Result<(&str, &str, &str)> {
    Ok((
        var_of(term.subject_var(), term, "subject")?,
        var_of(term.predicate_var(), term, "predicate")?,
        var_of(term.object_var(), term, "object")?,
    ))
}

fn check_triple(term: &QueryTerm, cursor: &mut Cursor) -> Result<()> {
    let holds = cursor.get_object_from_subject_pred(&term.subject, &term.path)?.contains(&term.object);
    let relation = cursor.relation_mut();
    if !holds {
        relation.clear();
    } else if relation.is_empty() {
        relation.add_unit_row();
    }
    Ok(())
}

fn objects_for_subjects(cursor: &Cursor, term: &QueryTerm, subjects: &EntitySet) -> Result<Vec<(EntityKey, EntityKey)>> {
    let mut pairs = Vec::new();
    for subject in subjects {
        for object in cursor.get_object_from_subject_pred(subject, &term.path)? {
            pairs.push((*subject, object));
        }
    }
    Ok(pairs)
}

fn subjects_for_objects(cursor: &Cursor, term: &QueryTerm, objects: &EntitySet) -> Result<Vec<(EntityKey, EntityKey)>> {
    let mut pairs = Vec::new();
    for object in objects {
        for subject in cursor.get_subject_from_pred_object(object, &term.path)? {
            pairs.push((subject, *object));
        }
    }
    Ok(pairs)
}

/// `?s p ?o`: walk from whichever end already has bindings; with neither
/// bound, read the pairs off the predicate.
fn restrict_subject_object(term: &QueryTerm, cursor: &mut Cursor) -> Result<()> {
    let svar = var_of(term.subject_var(), term, "subject")?;
    let ovar = var_of(term.object_var(), term, "object")?;
    let pairs = match (cursor.has_values_for(svar), cursor.has_values_for(ovar)) {
        (false, false) => cursor.get_subject_object_from_path(&term.path)?,
        (true, false) => objects_for_subjects(cursor, term, &cursor.get_values_for(svar))?,
        (false, true) => subjects_for_objects(cursor, term, &cursor.get_values_for(ovar))?,
        (true, true) => {
            let objects = cursor.get_values_for(ovar);
            let mut pairs = objects_for_subjects(cursor, term, &cursor.get_values_for(svar))?;
            pairs.retain(|(_, o)| objects.contains(o));
            pairs
        }
    };
    merge_pairs(cursor, svar, ovar, pairs)
}

fn merge_pairs(cursor: &mut Cursor, var1: &str, var2: &str, pairs: Vec<(EntityKey, EntityKey)>) -> Result<()> {
    let mut candidate = Relation::new(&[var1, var2]);
    candidate.add_two_values(var1, var2, pairs)?;
    cursor.merge(&candidate)
}

fn merge_triples(
    cursor: &mut Cursor,
    vars: (&str, &str, &str),
    triples: Vec<(EntityKey, EntityKey, EntityKey)>,
) -> Result<()> {
    let mut candidate = Relation::new(&[vars.0, vars.1, vars.2]);
    candidate.add_three_values(vars.0, vars.1, vars.2, triples)?;
    cursor.merge(&candidate)
}

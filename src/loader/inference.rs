use std::collections::{HashSet, VecDeque};

use log::debug;

use crate::core::{Triple, Uri, OWL_NAMESPACE};

/// `predicate owl:inverseOf inverse`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InverseRule {
    pub predicate: Uri,
    pub inverse: Uri,
}

impl InverseRule {
    /// The triple implied by `triple`, if the rule applies to it.
    pub fn apply(&self, triple: &Triple) -> Option<Triple> {
        if triple.predicate == self.predicate {
            Some(Triple::new(triple.object.clone(), self.inverse.clone(), triple.subject.clone()))
        } else if triple.predicate == self.inverse {
            Some(Triple::new(triple.object.clone(), self.predicate.clone(), triple.subject.clone()))
        } else {
            None
        }
    }
}

pub fn inverse_rules(triples: &[Triple]) -> Vec<InverseRule> {
    let inverse_of = Uri::new(OWL_NAMESPACE, "inverseOf");
    let mut rules: Vec<InverseRule> = Vec::new();
    for triple in triples.iter().filter(|t| t.predicate == inverse_of) {
        let rule = InverseRule { predicate: triple.subject.clone(), inverse: triple.object.clone() };
        if !rules.contains(&rule) {
            rules.push(rule);
        }
    }
    rules
}

/// Close `triples` under the inverse rules they declare.
///
/// Input order is kept and duplicates are dropped; generated triples follow.
pub fn expand_triples(triples: Vec<Triple>) -> Vec<Triple> {
    let rules = inverse_rules(&triples);
    let mut seen: HashSet<Triple> = HashSet::with_capacity(triples.len());
    let mut out: Vec<Triple> = Vec::with_capacity(triples.len());
    let mut pending: VecDeque<Triple> = VecDeque::new();

    for triple in triples {
        if seen.insert(triple.clone()) {
            pending.push_back(triple.clone());
            out.push(triple);
        }
    }
    let original = out.len();
    while let Some(triple) = pending.pop_front() {
        for rule in &rules {
            if let Some(generated) = rule.apply(&triple) {
                if seen.insert(generated.clone()) {
                    pending.push_back(generated.clone());
                    out.push(generated);
                }
            }
        }
    }
    debug!("inference: {} rules added {} triples to {}", rules.len(), out.len() - original, original);
    out
}

use crate::planner::QueryTerm;

/// Execution order of `terms`, as indexes into the slice.
pub fn order_terms(terms: &[QueryTerm]) -> Vec<usize> {
    let mut remaining: Vec<usize> = (0..terms.len()).collect();
    let mut planned: Vec<usize> = Vec::with_capacity(terms.len());
    if remaining.is_empty() {
        return planned;
    }

    let seed = (1..=3)
        .find_map(|n| remaining.iter().position(|&i| terms[i].variables.len() == n))
        .unwrap_or(0);
    planned.push(remaining.remove(seed));

    while !remaining.is_empty() {
        let mut best = 0;
        let mut best_overlap = 0;
        for (pos, &idx) in remaining.iter().enumerate() {
            let overlap = planned.iter().map(|&p| terms[idx].overlap(&terms[p])).max().unwrap_or(0);
            if overlap > best_overlap {
                best = pos;
                best_overlap = overlap;
            }
        }
        planned.push(remaining.remove(best));
    }
    planned
}

//! Query planner
//!
//! Turns the triple patterns of a query into an ordered list of binding
//! operators for one cursor.
//!
//! # Term ordering
//!
//! 1. Seed with the first term having the fewest free variables (1, then 2, then 3)
//! 2. Repeatedly take the remaining term sharing the most variables with any
//!    planned term; ties keep query order
//!
//! # Operator selection
//!
//! Each term gets exactly one operator, chosen from which of its positions are
//! variables and which of those variables earlier terms already bind.

mod order;
mod planner;
mod query_term;

pub use order::order_terms;
pub use planner::{QueryPlan, QueryPlanner, VarState};
pub use query_term::QueryTerm;

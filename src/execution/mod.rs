//! Query Execution Module
//!
//! # Components
//!
//! - **Relation** - bitmap-indexed table of variable bindings and its join
//! - **Cursor** - entity cache and relation for one query on one graph version
//! - **Traversal** - property-path walks over entity edges
//! - **Operators** - one binding step per planned triple pattern
//!
//! # Architecture
//!
//! The planner hands an ordered operator list to the caller, which runs each
//! operator against the cursor:
//!
//! 1. Look up candidate bindings through the entity accessors or a path walk
//! 2. Build a small candidate relation over the term's variables
//! 3. Merge it into the cursor's relation (insert, join, or cross product)
//! 4. Project the final relation onto the selected variables
//!
//! # Example
//!
//! ```ignore
//! let mut cursor = db.cursor("soda", None)?;
//! let plan = QueryPlanner::new(&cursor).plan(&query)?;
//! cursor.set_variables(&plan.variables);
//! for op in &plan.operations {
//!     op.run(&mut cursor)?;
//! }
//! let rows = cursor.rows_with_vars(&query.select)?;
//! ```

pub mod cursor;
pub mod operators;
pub mod relation;
pub mod traversal;

pub use cursor::Cursor;
pub use operators::Operator;
pub use relation::{EntitySet, Relation, Row};
pub use traversal::PathEdge;

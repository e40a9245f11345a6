//! # HodDB
//!
//! HodDB is an embedded, versioned graph database for Brick building
//! metadata. It answers conjunctive triple-pattern queries whose predicates
//! may be property paths (`pred`, `pred?`, `pred+`, `pred*`).
//!
//! ## Features
//!
//! - Entity/edge store keyed by fixed 16-byte keys, one full copy per graph version
//! - Transitive edges materialized at load time
//! - Bitmap-indexed binding relation with a roaring-bitmap join
//! - Heuristic planner choosing one binding operator per triple pattern
//!
//! ## Example
//!
//! ```rust
//! use hoddb::{HodDb, Result};
//!
//! fn example() -> Result<()> {
//!     let db = HodDb::in_memory();
//!     println!("{} graphs loaded", db.graphs().len());
//!     Ok(())
//! }
//! ```

#![warn(clippy::pedantic)]
#![allow(clippy::missing_docs_in_private_items)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::module_inception)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::redundant_closure_for_method_calls)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::unnecessary_map_or)]
#![allow(clippy::new_without_default)]
#![allow(clippy::return_self_not_must_use)]

/// Core data structures and types
pub mod core;

/// Database facade
pub mod api {
    pub mod hoddb;
}

/// Module for configuration management
pub mod config;

pub mod error;

/// Relation, cursor, traversal and binding operators
pub mod execution;

/// Turtle reading, inference and entity compilation
pub mod loader;

pub mod planner;

/// Query and response types
pub mod query;

pub mod storage;

// Re-export commonly used types
pub use api::hoddb::HodDb;
pub use config::HodConfig;
pub use error::{HodError, Result};
pub use query::{QueryResponse, SelectQuery, TriplePattern};

//! Error types for HodDB

use thiserror::Error;

use crate::core::EntityKey;

/// Result type alias used throughout the crate
pub type Result<T> = std::result::Result<T, HodError>;

/// Main error type for graph loading, planning and query execution
#[derive(Error, Debug)]
pub enum HodError {
    /// No entity stored under the key
    #[error("Entity not found: {0}")]
    NotFound(EntityKey),

    /// Unknown graph, or no version of it at the requested time
    #[error("Graph not found: {0}")]
    GraphNotFound(String),

    /// Entity record or snapshot could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Two distinct URIs produced the same 32-bit hash
    #[error("Hash collision: {incoming} collides with already registered {existing}")]
    HashCollision { existing: String, incoming: String },

    /// The planner could not choose an operator for a term
    #[error("Planning error: {0}")]
    Planning(String),

    /// Storage or decoding failure during a graph walk
    #[error("Traversal error: {0}")]
    Traversal(String),

    /// A relation would grow past the rows its bitmap index can address
    #[error("Relation row limit of {0} exceeded")]
    RowLimit(usize),

    /// Input text could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl HodError {
    /// True for the not-found case, which operators treat as "no matching rows".
    pub fn is_not_found(&self) -> bool {
        matches!(self, HodError::NotFound(_))
    }
}

impl From<bincode::Error> for HodError {
    fn from(err: bincode::Error) -> Self {
        HodError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for HodError {
    fn from(err: serde_json::Error) -> Self {
        HodError::Serialization(err.to_string())
    }
}

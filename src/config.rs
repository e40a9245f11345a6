//! Database configuration loaded from JSON

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{HodError, Result};

/// Top-level configuration
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HodConfig {
    pub database: DatabaseConfig,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Directory holding the snapshot files; `None` keeps everything in memory
    pub path: Option<PathBuf>,
    /// Graph name to data file
    pub graphs: BTreeMap<String, PathBuf>,
    /// Files loaded into every configured graph
    pub ontologies: Vec<PathBuf>,
}

impl HodConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| HodError::Config(e.to_string()))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| HodError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&text)
    }

    /// In-memory database with no preloaded graphs.
    pub fn in_memory() -> Self {
        Self::default()
    }
}

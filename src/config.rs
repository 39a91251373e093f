use crate::error::{EditError, Result};
use crate::task::ExecutionMode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

fn default_schematic_dir() -> PathBuf {
    PathBuf::from("schematics")
}

fn default_chunk_size() -> usize {
    4096
}

fn default_worker_threads() -> usize {
    1
}

/// Engine settings, read from a JSON document with kebab-case keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StylerConfig {
    #[serde(default)]
    pub use_async_tasks: bool,
    #[serde(default = "default_schematic_dir")]
    pub schematic_dir: PathBuf,
    /// Coordinates visited per planned chunk.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_worker_threads")]
    pub worker_threads: usize,
}

impl Default for StylerConfig {
    fn default() -> Self {
        Self {
            use_async_tasks: false,
            schematic_dir: default_schematic_dir(),
            chunk_size: default_chunk_size(),
            worker_threads: default_worker_threads(),
        }
    }
}

impl StylerConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: StylerConfig = serde_json::from_str(json)
            .map_err(|e| EditError::invalid(format!("config: {}", e)))?;
        config.validated()
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn execution_mode(&self) -> ExecutionMode {
        if self.use_async_tasks {
            ExecutionMode::Asynchronous
        } else {
            ExecutionMode::Synchronous
        }
    }

    fn validated(self) -> Result<Self> {
        if self.chunk_size == 0 {
            return Err(EditError::invalid("chunk-size must be at least 1"));
        }
        if self.worker_threads == 0 {
            return Err(EditError::invalid("worker-threads must be at least 1"));
        }
        Ok(self)
    }
}

//! Configuration Management
//!
//! Handles persistent configuration storage for cai2tf.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Extra resource definitions merged over the embedded ones
    #[serde(default)]
    pub schema_file: Option<PathBuf>,
    /// Convert asset groups concurrently
    #[serde(default)]
    pub concurrent: bool,
    /// Default output file (stdout when unset)
    #[serde(default)]
    pub output: Option<PathBuf>,
}

impl Config {
    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("cai2tf").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load configuration from a given file, falling back to defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring malformed config {}: {}", path.display(), e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create parent directory
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Get effective schema file (CLI > config)
    pub fn effective_schema_file(&self, cli: Option<&Path>) -> Option<PathBuf> {
        cli.map(Path::to_path_buf).or_else(|| self.schema_file.clone())
    }

    /// Get effective output (CLI > config > stdout)
    pub fn effective_output(&self, cli: Option<&Path>) -> Option<PathBuf> {
        cli.map(Path::to_path_buf).or_else(|| self.output.clone())
    }

    /// Settings after applying command-line overrides
    pub fn with_overrides(
        &self,
        schema_file: Option<&Path>,
        concurrent: bool,
        output: Option<&Path>,
    ) -> Self {
        Self {
            schema_file: self.effective_schema_file(schema_file),
            concurrent: concurrent || self.concurrent,
            output: self.effective_output(output),
        }
    }
}

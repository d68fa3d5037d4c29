use crate::error::{MatmulError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Shapes of a round: A is `m x k`, B is `k x n`, C is `m x n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub m: usize,
    pub k: usize,
    pub n: usize,
}

impl Default for Dimensions {
    fn default() -> Self {
        Dimensions { m: 5, k: 3, n: 2 }
    }
}

/// Where the coordinator gets A and B from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputSource {
    /// The built-in 5x3 and 3x2 reference matrices
    Reference,
    /// Deterministic fill of the configured dimensions
    Sequential,
    /// Text files; dimensions are taken from the files
    Files { a: PathBuf, b: PathBuf },
}

/// Settings for one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub dimensions: Dimensions,
    /// Participant count P, coordinator included
    pub participants: usize,
    pub input: InputSource,
    /// Print C to stdout after the round
    pub print: bool,
    /// Persist C to this file after the round
    pub output: Option<PathBuf>,
    pub log_level: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            dimensions: Dimensions::default(),
            participants: 2,
            input: InputSource::Reference,
            print: true,
            output: None,
            log_level: "info".to_string(),
        }
    }
}

impl RunConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        tracing::info!(path = %path.display(), "Loading configuration");
        let content = std::fs::read_to_string(path).map_err(|e| {
            tracing::error!(path = %path.display(), error = %e, "Failed to read config file");
            e
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: RunConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that cannot produce a round
    pub fn validate(&self) -> Result<()> {
        if self.participants < 1 {
            return Err(MatmulError::Config(
                "participants must be at least 1".to_string(),
            ));
        }
        if self.input == InputSource::Reference && self.dimensions != Dimensions::default() {
            let d = self.dimensions;
            return Err(MatmulError::Config(format!(
                "reference input is 5x3 * 3x2, configured dimensions are {}x{} * {}x{}",
                d.m, d.k, d.k, d.n
            )));
        }
        if self.log_level.trim().is_empty() {
            return Err(MatmulError::Config("log_level cannot be empty".to_string()));
        }
        Ok(())
    }
}

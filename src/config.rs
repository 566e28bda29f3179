use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct OracleConfig {
    /// Evaluate large batches with rayon
    pub parallel: bool,
    /// Batches smaller than this run sequentially; also the minimum rayon job size
    pub min_parallel_points: usize,
    /// How many mismatching points a validation report lists
    pub max_reported_mismatches: usize,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            min_parallel_points: 1024,
            max_reported_mismatches: 16,
        }
    }
}

impl OracleConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: OracleConfig = toml::from_str(content).context("Failed to parse config file")?;
        Ok(config)
    }
}

//! Agent configuration.
//!
//! `propsight.toml` holds the resolver tables (`[pubchem]`, `[prediction]`,
//! `[resolution]`) plus an optional `[output]` table for the report.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use propsight_common::ResolverConfig;

pub const CONFIG_ENV: &str = "PROPSIGHT_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "propsight.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(flatten)]
    pub resolver: ResolverConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Emit the outcome as JSON instead of the text report
    #[serde(default)]
    pub json: bool,

    /// Pretty-print JSON output
    #[serde(default = "default_true")]
    pub pretty: bool,
}

fn default_true() -> bool { true }

impl Default for OutputConfig {
    fn default() -> Self {
        Self { json: false, pretty: default_true() }
    }
}

mod tests;

impl Config {
    /// Load configuration.
    ///
    /// An explicit path must exist. Otherwise `PROPSIGHT_CONFIG` is checked,
    /// then `propsight.toml` in the current directory; if neither file exists
    /// the built-in defaults are used.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        if let Some(path) = explicit {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            return Self::from_file(path);
        }

        let path = std::env::var(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));

        if !path.exists() {
            tracing::warn!(
                path = %path.display(),
                "Config file not found, using built-in defaults. \
                 Copy propsight.example.toml to propsight.toml to customise."
            );
            return Ok(Self::default());
        }
        Self::from_file(&path)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&content)
            .map_err(|e| anyhow::anyhow!("{}: {}", path.display(), e))?;
        tracing::info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        config
            .resolver
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;
        Ok(config)
    }
}

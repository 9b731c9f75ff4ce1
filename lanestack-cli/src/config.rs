//! Configuration handling for the lanestack CLI
//!
//! Supports loading configuration from lanestack.toml files with CLI argument
//! overrides.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub stack: StackSection,
    pub select: SelectSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackSection {
    /// Minimum reads a reference needs to be reported
    #[serde(default = "default_min_reads")]
    pub min_reads: usize,

    /// Skip matches with a reported identity below 97 percent
    #[serde(default)]
    pub identity_filter: bool,

    /// Merge read insertions into extra alignment columns
    #[serde(default = "default_true")]
    pub show_insertions: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectSection {
    /// Minimum bit score for a match to count
    #[serde(default)]
    pub min_score: f32,

    /// Keep matches within this percentage of a read's best score
    #[serde(default = "default_top_percent")]
    pub top_percent: f32,

    /// Maximum expect value for a match to count
    #[serde(default = "default_max_expect")]
    pub max_expect: f64,

    /// Minimum percent identity for a match to count
    #[serde(default)]
    pub min_identity: f32,
}

// Default value functions
fn default_min_reads() -> usize { 10 }
fn default_true() -> bool { true }
fn default_top_percent() -> f32 { 10.0 }
fn default_max_expect() -> f64 { 0.01 }

impl Default for Config {
    fn default() -> Self {
        Self {
            stack: StackSection {
                min_reads: default_min_reads(),
                identity_filter: false,
                show_insertions: true,
            },
            select: SelectSection {
                min_score: 0.0,
                top_percent: default_top_percent(),
                max_expect: default_max_expect(),
                min_identity: 0.0,
            },
        }
    }
}

impl Config {
    /// Load configuration from file or use defaults
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let config = match config_path {
            Some(path) => {
                log::info!("Loading configuration from: {}", path.display());
                Self::load_from_file(path)?
            }
            None => {
                let default_path = PathBuf::from("lanestack.toml");
                if default_path.exists() {
                    log::info!("Loading configuration from: lanestack.toml");
                    Self::load_from_file(&default_path)?
                } else {
                    log::debug!("Using default configuration");
                    Self::default()
                }
            }
        };

        Ok(config)
    }

    /// Load configuration from a specific TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse configuration file: {}", path.display()))?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write configuration file: {}", path.display()))?;

        Ok(())
    }
}

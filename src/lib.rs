//! Note Graph Analysis
//!
//! Graph analytics over a vault of markdown notes:
//! - Link graph construction with tag, path and extension filters
//! - Similarity, link prediction, centrality and community algorithms
//! - Text-aware co-citation scoring from sentence, list and heading structure
//! - Ranking of results for a chosen note

pub mod error;
pub mod graph;
pub mod ranking;
pub mod text;
pub mod vault;

use anyhow::Result;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use graph::{Algorithm, Settings};

// ============================================================================
// YAML config structs (deserialization targets)
// ============================================================================

/// Top-level YAML configuration file structure
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub vault: VaultYamlConfig,
    /// Engine settings; every field has its own default
    pub analysis: Settings,
}

/// Vault configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VaultYamlConfig {
    pub path: String,
    /// Quiet period before a watched vault is re-analysed
    pub debounce_ms: u64,
}

impl Default for VaultYamlConfig {
    fn default() -> Self {
        Self {
            path: ".".into(),
            debounce_ms: 500,
        }
    }
}

// ============================================================================
// Runtime config (what the application actually uses)
// ============================================================================

#[derive(Debug, Clone)]
pub struct Config {
    pub vault_path: PathBuf,
    pub debounce_ms: u64,
    pub settings: Settings,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_yaml_and_env(None)
    }

    pub fn from_yaml_and_env(yaml_path: Option<&Path>) -> Result<Self> {
        // 1. Load YAML config (or defaults if file not found)
        let yaml = Self::load_yaml(yaml_path);
        let mut settings = yaml.analysis;

        // 2. Env var overrides
        if let Ok(pattern) = std::env::var("GRAPH_ANALYSIS_EXCLUSION_REGEX") {
            settings.exclusion_regex = pattern;
        }
        if let Some(add) = std::env::var("GRAPH_ANALYSIS_ADD_UNRESOLVED")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            settings.add_unresolved = add;
        }
        if let Ok(name) = std::env::var("GRAPH_ANALYSIS_DEFAULT_ALGORITHM") {
            settings.default_algorithm = name.parse::<Algorithm>()?;
        }

        // 3. Reject bad settings before any graph work
        settings.validate()?;

        Ok(Self {
            vault_path: std::env::var("GRAPH_ANALYSIS_VAULT")
                .unwrap_or(yaml.vault.path)
                .into(),
            debounce_ms: yaml.vault.debounce_ms,
            settings,
        })
    }

    fn load_yaml(yaml_path: Option<&Path>) -> YamlConfig {
        let default_path = Path::new("config.yaml");
        let path = yaml_path.unwrap_or(default_path);

        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_yaml::from_str(&contents) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                    YamlConfig::default()
                }
            },
            Err(_) => {
                tracing::debug!(
                    "No config file at {}, using env vars / defaults",
                    path.display()
                );
                YamlConfig::default()
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

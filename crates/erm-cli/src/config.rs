//! CLI configuration
//!
//! Stored as TOML at `<config dir>/erm/config.toml`, or wherever
//! `ERM_CONFIG` points.

use std::path::PathBuf;

use erm_core::validation::valid_uuid;
use serde::{Deserialize, Serialize};

/// Get default data directory
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("erm")
}

/// Location of the config file
pub fn config_file_path() -> PathBuf {
    if let Some(path) = std::env::var_os("ERM_CONFIG") {
        return PathBuf::from(path);
    }
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("erm")
        .join("config.toml")
}

/// Configuration for the CLI
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_workspace: Option<String>,
}

impl Config {
    /// Load the config file, falling back to defaults when absent or unreadable
    pub fn load() -> Self {
        let path = config_file_path();
        match std::fs::read_to_string(&path) {
            Ok(content) => Self::parse(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring invalid config at {}: {}", path.display(), e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let path = config_file_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, toml::to_string_pretty(self)?)?;
        tracing::debug!("Saved config to {}", path.display());
        Ok(())
    }

    pub fn keys() -> &'static [&'static str] {
        &["data_dir", "default_workspace"]
    }

    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "data_dir" => self.data_dir.as_ref().map(|p| p.display().to_string()),
            "default_workspace" => self.default_workspace.clone(),
            _ => None,
        }
    }

    /// Store a value; `default_workspace` must be a UUID
    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        match key {
            "data_dir" => self.data_dir = Some(PathBuf::from(value)),
            "default_workspace" => {
                if !valid_uuid(value) {
                    anyhow::bail!("default_workspace must be a UUID, got {:?}", value);
                }
                self.default_workspace = Some(value.to_string());
            }
            other => anyhow::bail!("Unknown config key: {}", other),
        }
        Ok(())
    }

    /// Clear a value, reporting whether it was set
    pub fn unset(&mut self, key: &str) -> bool {
        match key {
            "data_dir" => self.data_dir.take().is_some(),
            "default_workspace" => self.default_workspace.take().is_some(),
            _ => false,
        }
    }
}

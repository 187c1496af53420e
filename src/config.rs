//! Configuration Management
//!
//! Handles persistent configuration storage for ec2emu.

use crate::context::{DEFAULT_ACCOUNT_ID, DEFAULT_REGION};
use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Account id reported as the owner of created resources
    #[serde(default)]
    pub account_id: Option<String>,
    /// Region used to derive availability zones
    #[serde(default)]
    pub region: Option<String>,
    /// Log file location (defaults next to the config file)
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Config {
    /// Get the config directory
    pub fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("ec2emu"))
    }

    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        Self::load_from(&path)
    }

    /// Load configuration from `path`, falling back to defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring unreadable config {:?}: {}", path, e);
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

    /// Save configuration to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create parent directory
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {:?}", parent))?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).with_context(|| format!("Failed to write {:?}", path))?;

        Ok(())
    }

    /// Get effective account id (CLI > config > default)
    pub fn effective_account_id(&self) -> String {
        self.account_id
            .clone()
            .unwrap_or_else(|| DEFAULT_ACCOUNT_ID.to_string())
    }

    /// Get effective region (CLI > config > default)
    pub fn effective_region(&self) -> String {
        self.region
            .clone()
            .unwrap_or_else(|| DEFAULT_REGION.to_string())
    }

    /// Get the log file path
    pub fn effective_log_file(&self) -> PathBuf {
        if let Some(path) = &self.log_file {
            return path.clone();
        }
        if let Some(dir) = Self::config_dir() {
            return dir.join("ec2emu.log");
        }
        if let Some(home) = dirs::home_dir() {
            return home.join(".ec2emu").join("ec2emu.log");
        }
        PathBuf::from("ec2emu.log")
    }

    /// Apply command-line overrides
    pub fn with_overrides(mut self, account_id: Option<String>, region: Option<String>) -> Self {
        if account_id.is_some() {
            self.account_id = account_id;
        }
        if region.is_some() {
            self.region = region;
        }
        self
    }
}

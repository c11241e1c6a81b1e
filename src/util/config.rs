//! Configuration file support for stratus.
//!
//! Two configuration file locations are supported:
//! - Global: `<config-dir>/stratus/config.toml` - user-wide defaults
//! - Project: `./stratus.toml` - project-specific overrides
//!
//! Project config takes precedence over global config, field by field.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Project-local config file name.
pub const PROJECT_CONFIG_NAME: &str = "stratus.toml";

/// Stratus tool configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Platform/policy configuration source settings
    pub platform: PlatformSettings,

    /// Defaults applied when the manifest or CLI omit a value
    pub defaults: DefaultsSettings,
}

/// Settings for the remote platform/policy configuration source.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformSettings {
    /// Base URL of the configuration service (e.g. https://config.example.com)
    pub config_service: Option<String>,

    /// Request timeout in seconds for remote layer fetches
    pub timeout_secs: u64,
}

impl Default for PlatformSettings {
    fn default() -> Self {
        PlatformSettings {
            config_service: None,
            timeout_secs: 10,
        }
    }
}

/// Fallback values for context fields the manifest may omit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsSettings {
    /// Default target environment
    pub environment: Option<String>,

    /// Default deployment region
    pub region: Option<String>,

    /// Default account identifier
    pub account: Option<String>,
}

impl Config {
    /// Load configuration, merging project config over global config.
    pub fn load(project_dir: &Path) -> Result<Config> {
        let mut config = match global_config_path() {
            Some(path) if path.is_file() => Config::from_file(&path)?,
            _ => Config::default(),
        };

        let project_path = project_dir.join(PROJECT_CONFIG_NAME);
        if project_path.is_file() {
            config.merge(Config::from_file(&project_path)?);
        }

        Ok(config)
    }

    /// Parse a config file.
    pub fn from_file(path: &Path) -> Result<Config> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        toml::from_str(&text)
            .with_context(|| format!("failed to parse config at {}", path.display()))
    }

    /// Overlay `other` onto `self`; present fields in `other` win.
    fn merge(&mut self, other: Config) {
        if other.platform.config_service.is_some() {
            self.platform.config_service = other.platform.config_service;
        }
        if other.platform.timeout_secs != PlatformSettings::default().timeout_secs {
            self.platform.timeout_secs = other.platform.timeout_secs;
        }
        if other.defaults.environment.is_some() {
            self.defaults.environment = other.defaults.environment;
        }
        if other.defaults.region.is_some() {
            self.defaults.region = other.defaults.region;
        }
        if other.defaults.account.is_some() {
            self.defaults.account = other.defaults.account;
        }
    }
}

fn global_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "stratus")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

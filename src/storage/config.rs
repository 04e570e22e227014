//! Configuration handling for htnh
//!
//! Heuristic settings are stored in `htnh.toml` (project, found by walking up
//! from the current directory) and output preferences in
//! `~/.config/htnh/config.toml` (global).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::Cost;
use crate::heuristics::{HeuristicKind, UnreachablePolicy, UNREACHABLE_SENTINEL};

/// File name of the project configuration
pub const PROJECT_CONFIG_FILE: &str = "htnh.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// What an ordered estimate reports for unreachable tasks
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UnreachableMode {
    /// Report infinity
    #[default]
    Infinite,
    /// Report `sentinel_value`
    Sentinel,
}

impl UnreachableMode {
    pub fn as_str(&self) -> &str {
        match self {
            UnreachableMode::Infinite => "infinite",
            UnreachableMode::Sentinel => "sentinel",
        }
    }
}

/// Settings for the delete-relaxation heuristic
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DelRelaxConfig {
    /// Combine subtasks with max instead of sum
    pub ordering_relaxation: bool,

    /// Reporting of unreachable tasks in ordered sums
    pub unreachable: UnreachableMode,

    /// Value reported in sentinel mode
    pub sentinel_value: f64,
}

impl Default for DelRelaxConfig {
    fn default() -> Self {
        Self {
            ordering_relaxation: true,
            unreachable: UnreachableMode::Infinite,
            sentinel_value: UNREACHABLE_SENTINEL,
        }
    }
}

impl DelRelaxConfig {
    pub fn unreachable_policy(&self) -> UnreachablePolicy {
        match self.unreachable {
            UnreachableMode::Infinite => UnreachablePolicy::Infinite,
            UnreachableMode::Sentinel => UnreachablePolicy::Sentinel(
                Cost::new(self.sentinel_value).unwrap_or(Cost::INFINITE),
            ),
        }
    }
}

/// Project-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct HeuristicsConfig {
    /// Heuristic used when `--heuristic` is not given
    pub default_heuristic: HeuristicKind,

    /// Delete-relaxation settings
    pub del_relax: DelRelaxConfig,
}

impl HeuristicsConfig {
    /// Checks values serde cannot check
    pub fn validate(&self) -> Result<(), ConfigError> {
        if Cost::new(self.del_relax.sentinel_value).is_none() {
            return Err(ConfigError::Invalid(format!(
                "del_relax.sentinel_value must be a finite non-negative number, got {}",
                self.del_relax.sentinel_value
            )));
        }
        Ok(())
    }
}

/// Global user configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GlobalConfig {
    /// Default output format (text or json)
    pub default_format: OutputFormat,
}

/// Output format for commands
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Combined configuration (global + project)
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub heuristics: HeuristicsConfig,
    pub global: GlobalConfig,
    pub config_path: Option<PathBuf>,
}

impl Config {
    /// Loads configuration from default locations, or from `explicit` when
    /// given
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let global = Self::load_global()?;

        let config_path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => Self::find_project_config(),
        };

        let heuristics = match &config_path {
            Some(path) => Self::load_project_config(path)?,
            None => HeuristicsConfig::default(),
        };

        Ok(Self {
            heuristics,
            global,
            config_path,
        })
    }

    /// Returns the global config directory
    pub fn global_config_dir() -> Option<PathBuf> {
        ProjectDirs::from("dev", "htnh", "htn-heuristics")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Loads global configuration
    fn load_global() -> Result<GlobalConfig> {
        let config_dir = match Self::global_config_dir() {
            Some(dir) => dir,
            None => return Ok(GlobalConfig::default()),
        };

        let config_path = config_dir.join("config.toml");
        if !config_path.exists() {
            return Ok(GlobalConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read global config: {}", config_path.display()))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .context("Failed to parse global config")
    }

    /// Loads heuristic configuration from a file
    pub fn load_project_config(path: &Path) -> Result<HeuristicsConfig> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;

        let config: HeuristicsConfig = toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Finds `htnh.toml` in the current directory or one of its parents
    pub fn find_project_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;
        Self::find_project_config_from(&current)
    }

    fn find_project_config_from(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();

        loop {
            let candidate = current.join(PROJECT_CONFIG_FILE);
            if candidate.is_file() {
                return Some(candidate);
            }

            if !current.pop() {
                return None;
            }
        }
    }
}

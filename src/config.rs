//! Podplan Configuration Module
//!
//! Planner settings stored in `~/.config/podplan/config.toml`.
//!
//! ## Priority Order (highest to lowest)
//!
//! 1. Environment variables (`PODPLAN_DEFAULT_TIMEOUT`, `PODPLAN_DERIVE_MOUNTS`)
//! 2. Config file (`~/.config/podplan/config.toml`)
//! 3. Defaults

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ast::DEFAULT_TASK_TIMEOUT;
use crate::error::{PodplanError, Result};
use crate::util::parse_duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PlannerConfig {
    #[serde(default)]
    pub analysis: AnalysisConfig,

    #[serde(default)]
    pub defaults: Defaults,
}

/// Hazard analysis settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisConfig {
    /// Treat claim-backed volume mounts as resource handles
    #[serde(default = "default_true")]
    pub derive_mount_handles: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            derive_mount_handles: true,
        }
    }
}

/// Task defaults
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Defaults {
    /// Timeout for tasks that set none
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TASK_TIMEOUT.as_secs()
}

impl PlannerConfig {
    /// Get the config directory path
    ///
    /// Returns `~/.config/podplan/` on Unix, `%APPDATA%/podplan/` on Windows
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("podplan")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from the default path
    ///
    /// Returns default config if file doesn't exist.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `path`
    ///
    /// Returns default config if file doesn't exist.
    /// Returns error if file exists but is malformed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| PodplanError::ConfigError {
            reason: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        toml::from_str(&content).map_err(|e| PodplanError::ConfigError {
            reason: format!("Failed to parse config file {}: {}", path.display(), e),
        })
    }

    /// Save configuration to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir).map_err(|e| PodplanError::ConfigError {
                    reason: format!("Failed to create config directory: {}", e),
                })?;
            }
        }

        let content = toml::to_string_pretty(self).map_err(|e| PodplanError::ConfigError {
            reason: format!("Failed to serialize config: {}", e),
        })?;

        fs::write(path, content).map_err(|e| PodplanError::ConfigError {
            reason: format!("Failed to write config file: {}", e),
        })?;

        Ok(())
    }

    /// Merge with environment variables
    ///
    /// Environment variables take precedence over config file values.
    /// Unparseable values are ignored.
    pub fn with_env(mut self) -> Self {
        if let Ok(value) = std::env::var("PODPLAN_DEFAULT_TIMEOUT") {
            if let Some(timeout) = parse_duration(&value) {
                self.defaults.timeout_secs = timeout.as_secs();
            }
        }

        if let Ok(value) = std::env::var("PODPLAN_DERIVE_MOUNTS") {
            if let Some(flag) = parse_flag(&value) {
                self.analysis.derive_mount_handles = flag;
            }
        }

        self
    }

    /// Timeout applied to tasks that set none
    #[inline]
    pub fn default_timeout(&self) -> Duration {
        Duration::from_secs(self.defaults.timeout_secs)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

//! # Configuration Loader
//!
//! Loads and merges CLI configuration from multiple sources:
//! 1. Default values (lowest priority)
//! 2. Configuration file
//! 3. Environment variables
//!
//! Command-line flags are applied on top by the caller.

use std::env;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::Deserialize;
use thiserror::Error;

/// Environment variable naming an explicit configuration file
pub const CONFIG_ENV: &str = "DEVGROUP_CONFIG";

const ENV_PREFIX: &str = "DEVGROUP";

/// How command results are printed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// Messages and human-readable results
    #[default]
    Default,
    /// Compact JSON
    Json,
    /// Indented JSON
    #[value(name = "json_pretty")]
    JsonPretty,
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid value '{value}' for {var}")]
    InvalidEnv { var: String, value: String },
}

/// Effective CLI configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Output mode when `--output` isn't given
    pub output: OutputMode,
    /// Debug level when `--debug` isn't given
    pub debug: u8,
    /// Log filter directive, used when `RUST_LOG` is unset
    pub log: Option<String>,
}

/// Configuration loader with support for file and environment variable overrides
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
    env_prefix: String,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self {
            config_path: Self::default_config_path(),
            env_prefix: ENV_PREFIX.to_string(),
        }
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a specific file instead of the standard locations
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: Some(path.into()),
            env_prefix: ENV_PREFIX.to_string(),
        }
    }

    /// The file that will be read, if any
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// `DEVGROUP_CONFIG` first, then the first existing standard location
    fn default_config_path() -> Option<PathBuf> {
        if let Ok(path) = env::var(CONFIG_ENV) {
            return Some(PathBuf::from(path));
        }

        let candidates = [
            Some(PathBuf::from("devgroup.toml")),
            dirs::config_dir().map(|d| d.join("devgroup").join("config.toml")),
        ];
        candidates.into_iter().flatten().find(|path| path.exists())
    }

    /// Load configuration with full hierarchy
    pub fn load(&self) -> Result<CliConfig, ConfigError> {
        let config = match &self.config_path {
            Some(path) => Self::load_from_file(path)?,
            None => CliConfig::default(),
        };
        self.merge_env(config, |var| env::var(var).ok())
    }

    fn load_from_file(path: &Path) -> Result<CliConfig, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply `<PREFIX>_OUTPUT`, `<PREFIX>_DEBUG` and `<PREFIX>_LOG`
    fn merge_env<F>(&self, mut config: CliConfig, lookup: F) -> Result<CliConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let prefix = &self.env_prefix;

        let var = format!("{}_OUTPUT", prefix);
        if let Some(value) = lookup(&var) {
            config.output = OutputMode::from_str(&value, true)
                .map_err(|_| ConfigError::InvalidEnv { var, value })?;
        }

        let var = format!("{}_DEBUG", prefix);
        if let Some(value) = lookup(&var) {
            config.debug = value
                .parse()
                .map_err(|_| ConfigError::InvalidEnv { var, value })?;
        }

        if let Some(value) = lookup(&format!("{}_LOG", prefix)) {
            config.log = Some(value);
        }

        Ok(config)
    }
}

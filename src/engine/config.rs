//! LoanGuard Configuration Module
//! Handles loading and validating loanguard.config.json

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::engine::rbac::POLICY_FILE;

pub const CONFIG_FILE: &str = "loanguard.config.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),
    #[error("Project already initialized: {0} exists")]
    AlreadyExists(PathBuf),
    #[error("Failed to read config: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Invalid config format: {0}")]
    ParseError(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub version: String,
    pub service: ServiceConfig,
    #[serde(default)]
    pub policy: PolicyConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Directory holding policy.json, relative to the project directory
    #[serde(default = "default_policy_dir")]
    pub dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_host")]
    pub host: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive; RUST_LOG wins when set
    #[serde(default = "default_filter")]
    pub filter: String,
}

fn default_policy_dir() -> PathBuf {
    PathBuf::from("access")
}

fn default_port() -> u16 {
    54330
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_filter() -> String {
    "info".to_string()
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            dir: default_policy_dir(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

impl Config {
    pub fn load(project_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = project_dir.join(CONFIG_FILE);
        if !config_path.exists() {
            return Err(ConfigError::NotFound(config_path));
        }
        let content = std::fs::read_to_string(&config_path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Like [`Config::load`], but a missing file yields the defaults.
    pub fn load_or_default(project_dir: &Path) -> Result<Self, ConfigError> {
        match Self::load(project_dir) {
            Err(ConfigError::NotFound(_)) => Ok(Self::default_for_project("loanguard")),
            other => other,
        }
    }

    pub fn save(&self, project_dir: &Path) -> Result<(), ConfigError> {
        let config_path = project_dir.join(CONFIG_FILE);
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn default_for_project(name: &str) -> Self {
        Self {
            version: "0.1.0".to_string(),
            service: ServiceConfig {
                name: name.to_string(),
            },
            policy: PolicyConfig::default(),
            api: ApiConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Absolute location of the policy directory for a project
    pub fn policy_dir(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.policy.dir)
    }

    /// Fails when either the config or the policy file this config points at
    /// is already present, so `init` never replaces a customized policy.
    pub fn ensure_uninitialized(&self, project_dir: &Path) -> Result<(), ConfigError> {
        let existing = [
            project_dir.join(CONFIG_FILE),
            self.policy_dir(project_dir).join(POLICY_FILE),
        ];
        match existing.into_iter().find(|path| path.exists()) {
            Some(path) => Err(ConfigError::AlreadyExists(path)),
            None => Ok(()),
        }
    }
}

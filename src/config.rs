//! Configuration management for the migration pipeline.
//!
//! Loads configuration from a TOML file; CLI flags override file values.

use crate::utils::errors::{MigrationError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub migration: MigrationConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Base URL of the remote stateful service
    pub url: String,

    /// Optional bearer token passed on every call
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory for chunk artifacts (per-job backup/ and restore/ trees)
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationConfig {
    /// Records per chunk; shared by backup and restore planning
    #[serde(default = "default_step")]
    pub step: u64,

    /// Maximum concurrent range fetches during backup
    #[serde(default = "default_backup_workers")]
    pub backup_workers: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default values
fn default_step() -> u64 {
    5000
}

fn default_backup_workers() -> usize {
    4
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            step: default_step(),
            backup_workers: default_backup_workers(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &PathBuf) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make planning or execution meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.migration.step == 0 {
            return Err(MigrationError::Config("migration.step must be > 0".into()));
        }
        if self.migration.backup_workers == 0 {
            return Err(MigrationError::Config(
                "migration.backup_workers must be > 0".into(),
            ));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            service: ServiceConfig {
                url: "http://localhost:8000".to_string(),
                token: None,
            },
            storage: StorageConfig {
                data_dir: PathBuf::from("/var/lib/state-migrator"),
            },
            migration: MigrationConfig::default(),
            log: LogConfig::default(),
        }
    }
}

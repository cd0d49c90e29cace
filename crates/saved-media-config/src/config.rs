use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub migration: MigrationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BackendConfig {
    /// Scheme is optional; see `normalize_base_url` in the backend crate
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Upgrade plain http to https for non-loopback hosts
    #[serde(default = "default_true")]
    pub force_https: bool,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct StorageConfig {
    /// Overrides `PathManager::storage_dir`
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MigrationConfig {
    /// How long the pre-migration favorites backup is kept
    #[serde(default = "default_backup_retention_days")]
    pub backup_retention_days: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Write logs to `PathManager::log_file` instead of stderr
    #[serde(default)]
    pub to_file: bool,
}

fn default_true() -> bool {
    true
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_timeout_seconds() -> u64 {
    15
}

fn default_backup_retention_days() -> u32 {
    7
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            force_https: default_true(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            backup_retention_days: default_backup_retention_days(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            to_file: false,
        }
    }
}

impl Config {
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load the file if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.backend.base_url.trim().is_empty() {
            return Err(anyhow::anyhow!("backend.base_url cannot be empty"));
        }
        if self.backend.timeout_seconds == 0 {
            return Err(anyhow::anyhow!("backend.timeout_seconds must be greater than zero"));
        }
        if self.migration.backup_retention_days == 0 {
            return Err(anyhow::anyhow!("migration.backup_retention_days must be greater than zero"));
        }
        Ok(())
    }

    pub fn backup_retention(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.migration.backup_retention_days))
    }
}

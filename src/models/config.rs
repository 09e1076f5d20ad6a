//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Content store settings
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Route namespace and registry location
    #[serde(default)]
    pub routes: RoutesConfig,

    /// Page metadata fetching
    #[serde(default)]
    pub opengraph: OpenGraphConfig,

    /// Published catalog snapshot
    #[serde(default)]
    pub export: ExportConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        let namespace = &self.routes.namespace;
        if namespace.trim().is_empty() {
            return Err(AppError::config("routes.namespace is empty"));
        }
        if namespace.contains('.') || namespace.chars().any(char::is_whitespace) {
            return Err(AppError::config(
                "routes.namespace must not contain '.' or whitespace",
            ));
        }
        if self.routes.registry_file.trim().is_empty() {
            return Err(AppError::config("routes.registry_file is empty"));
        }
        if self.database.file.trim().is_empty() {
            return Err(AppError::config("database.file is empty"));
        }
        if self.database.max_connections == 0 {
            return Err(AppError::config("database.max_connections must be > 0"));
        }
        if self.opengraph.user_agent.trim().is_empty() {
            return Err(AppError::config("opengraph.user_agent is empty"));
        }
        if self.opengraph.timeout_secs == 0 {
            return Err(AppError::config("opengraph.timeout_secs must be > 0"));
        }
        if self.export.file.trim().is_empty() {
            return Err(AppError::config("export.file is empty"));
        }
        Ok(())
    }

    /// Path of the route registry file under the storage directory.
    pub fn registry_path(&self, storage_dir: &Path) -> PathBuf {
        storage_dir.join(&self.routes.registry_file)
    }

    /// Path of the catalog snapshot under the storage directory.
    pub fn export_path(&self, storage_dir: &Path) -> PathBuf {
        storage_dir.join(&self.export.file)
    }
}

/// Content store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file relative to the storage directory, or `:memory:`
    #[serde(default = "defaults::database_file")]
    pub file: String,

    /// Pool size for file-backed databases
    #[serde(default = "defaults::max_connections")]
    pub max_connections: u32,
}

impl DatabaseConfig {
    pub fn is_memory(&self) -> bool {
        self.file == ":memory:"
    }

    /// Resolve the database file against the storage directory.
    pub fn path(&self, storage_dir: &Path) -> PathBuf {
        storage_dir.join(&self.file)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            file: defaults::database_file(),
            max_connections: defaults::max_connections(),
        }
    }
}

/// Route namespace and registry settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutesConfig {
    /// Prefix of every cert route, e.g. `data` in `data.test_tst101`
    #[serde(default = "defaults::namespace")]
    pub namespace: String,

    /// TOML file listing the registered endpoints
    #[serde(default = "defaults::registry_file")]
    pub registry_file: String,
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            namespace: defaults::namespace(),
            registry_file: defaults::registry_file(),
        }
    }
}

/// HTTP settings for page metadata fetches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenGraphConfig {
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for OpenGraphConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Catalog snapshot settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "defaults::export_file")]
    pub file: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            file: defaults::export_file(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is unset
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

mod defaults {
    pub fn database_file() -> String {
        "certs.db".into()
    }
    pub fn max_connections() -> u32 {
        5
    }

    pub fn namespace() -> String {
        "data".into()
    }
    pub fn registry_file() -> String {
        "routes.toml".into()
    }

    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; cert-tracker/0.1)".into()
    }
    pub fn timeout() -> u64 {
        10
    }

    pub fn export_file() -> String {
        "catalog.json".into()
    }

    pub fn log_level() -> String {
        "info".into()
    }
}

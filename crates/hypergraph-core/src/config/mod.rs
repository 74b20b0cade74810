//! Configuration management with file persistence

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::graph::{DEFAULT_LIST_LIMIT, DEFAULT_SCOPE, ServiceSettings};
use crate::storage::{DatabaseConfig, default_database_path};

/// Environment variable overriding the config directory
pub const CONFIG_DIR_ENV: &str = "HYPERGRAPH_CONFIG_DIR";

/// Environment variable overriding `query.default_org`
pub const DEFAULT_ORG_ENV: &str = "HYPERGRAPH_DEFAULT_ORG";

/// Hypergraph configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub query: QueryConfig,
    pub metadata: MetadataConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Database file; the platform data directory when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    pub max_connections: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    pub default_org: String,
    pub default_limit: i64,
    pub max_query_depth: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    pub repository: String,
    pub branch: String,
    pub version: String,
}

/// Storage backend selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Process-local, lost on exit
    Memory,
    /// SQLite database file
    #[default]
    Sqlite,
}

impl StoreBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Sqlite => "sqlite",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "memory" => Some(Self::Memory),
            "sqlite" => Some(Self::Sqlite),
            _ => None,
        }
    }
}

impl std::fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Sqlite,
            path: None,
            max_connections: crate::storage::database::DEFAULT_MAX_CONNECTIONS,
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_org: DEFAULT_SCOPE.to_string(),
            default_limit: DEFAULT_LIST_LIMIT,
            max_query_depth: 5,
        }
    }
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            repository: "default".to_string(),
            branch: "main".to_string(),
            version: "1.0.0".to_string(),
        }
    }
}

impl StoreConfig {
    /// Database file in effect
    pub fn resolved_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(default_database_path)
    }
}

impl Config {
    /// Keys accepted by [`Config::get`] and [`Config::set`]
    pub const KEYS: &'static [&'static str] = &[
        "store.backend",
        "store.path",
        "store.max_connections",
        "query.default_org",
        "query.default_limit",
        "query.max_query_depth",
        "metadata.repository",
        "metadata.branch",
        "metadata.version",
    ];

    /// Get the config directory path
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        let dir = if let Ok(custom_dir) = env::var(CONFIG_DIR_ENV) {
            PathBuf::from(custom_dir)
        } else {
            dirs::config_dir()
                .ok_or_else(|| anyhow!("Could not determine config directory"))?
                .join("hypergraph")
        };
        Ok(dir)
    }

    /// Get the config file path
    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from the config directory, applying env overrides
    pub fn load() -> anyhow::Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_overrides(env::var(DEFAULT_ORG_ENV).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file, or defaults if it doesn't exist
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the config directory
    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to a file
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        self.validate()?;

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Apply an organization override taken from the environment
    pub fn apply_overrides(&mut self, default_org: Option<String>) {
        if let Some(org) = default_org.filter(|org| !org.trim().is_empty()) {
            self.query.default_org = org;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.query.default_limit <= 0 {
            return Err(anyhow!("query.default_limit must be positive"));
        }
        if self.query.max_query_depth == 0 {
            return Err(anyhow!("query.max_query_depth must be at least 1"));
        }
        if self.query.default_org.trim().is_empty() {
            return Err(anyhow!("query.default_org must not be empty"));
        }
        if self.store.max_connections == 0 {
            return Err(anyhow!("store.max_connections must be at least 1"));
        }
        Ok(())
    }

    /// Get a configuration value by key
    pub fn get(&self, key: &str) -> anyhow::Result<String> {
        match key {
            "store.backend" => Ok(self.store.backend.to_string()),
            "store.path" => Ok(self.store.resolved_path().display().to_string()),
            "store.max_connections" => Ok(self.store.max_connections.to_string()),

            "query.default_org" => Ok(self.query.default_org.clone()),
            "query.default_limit" => Ok(self.query.default_limit.to_string()),
            "query.max_query_depth" => Ok(self.query.max_query_depth.to_string()),

            "metadata.repository" => Ok(self.metadata.repository.clone()),
            "metadata.branch" => Ok(self.metadata.branch.clone()),
            "metadata.version" => Ok(self.metadata.version.clone()),

            _ => Err(unknown_key(key)),
        }
    }

    /// Set a configuration value by key
    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        match key {
            "store.backend" => {
                self.store.backend = StoreBackend::parse(value).ok_or_else(|| {
                    anyhow!("Invalid store backend: {}. Valid options: memory, sqlite", value)
                })?;
            }
            "store.path" => {
                self.store.path = if value.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(value))
                };
            }
            "store.max_connections" => {
                let max: u32 = value
                    .parse()
                    .with_context(|| format!("Invalid max_connections value: {}", value))?;
                if max == 0 {
                    return Err(anyhow!("store.max_connections must be at least 1"));
                }
                self.store.max_connections = max;
            }

            "query.default_org" => {
                if value.trim().is_empty() {
                    return Err(anyhow!("query.default_org must not be empty"));
                }
                self.query.default_org = value.to_string();
            }
            "query.default_limit" => {
                let limit: i64 = value
                    .parse()
                    .with_context(|| format!("Invalid default_limit value: {}", value))?;
                if limit <= 0 {
                    return Err(anyhow!("query.default_limit must be positive"));
                }
                self.query.default_limit = limit;
            }
            "query.max_query_depth" => {
                let depth: u32 = value
                    .parse()
                    .with_context(|| format!("Invalid max_query_depth value: {}", value))?;
                if depth == 0 {
                    return Err(anyhow!("query.max_query_depth must be at least 1"));
                }
                self.query.max_query_depth = depth;
            }

            "metadata.repository" => self.metadata.repository = value.to_string(),
            "metadata.branch" => self.metadata.branch = value.to_string(),
            "metadata.version" => self.metadata.version = value.to_string(),

            _ => return Err(unknown_key(key)),
        }
        Ok(())
    }

    /// List all configuration keys and their values
    pub fn list(&self) -> anyhow::Result<Vec<(String, String)>> {
        Self::KEYS
            .iter()
            .map(|key| Ok((key.to_string(), self.get(key)?)))
            .collect()
    }

    /// Settings for the hypergraph service
    pub fn service_settings(&self) -> ServiceSettings {
        ServiceSettings {
            default_org: self.query.default_org.clone(),
            max_query_depth: self.query.max_query_depth,
            repository: self.metadata.repository.clone(),
            branch: self.metadata.branch.clone(),
            version: self.metadata.version.clone(),
        }
    }

    /// Database configuration for the SQLite backend
    pub fn database_config(&self) -> DatabaseConfig {
        DatabaseConfig::with_path(self.store.resolved_path())
            .max_connections(self.store.max_connections)
    }
}

fn unknown_key(key: &str) -> anyhow::Error {
    anyhow!(
        "Unknown configuration key: {}. Use `hypergraph config show` to see available keys.",
        key
    )
}

//! SQLite database operations
//!
//! Provides connection pool management and database initialization for the
//! SQLite graph store.

use crate::infrastructure::graph::SqliteGraphStore;
use crate::storage::migrations;
use anyhow::{Context, Result};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Default maximum connections in the pool
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

const MEMORY_PATH: &str = ":memory:";

/// Database configuration options
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file
    pub path: PathBuf,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Whether to run migrations automatically
    pub auto_migrate: bool,
    /// Journal mode (default: WAL)
    pub journal_mode: SqliteJournalMode,
    /// Synchronous mode (default: NORMAL)
    pub synchronous: SqliteSynchronous,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            auto_migrate: true,
            journal_mode: SqliteJournalMode::Wal,
            synchronous: SqliteSynchronous::Normal,
        }
    }
}

impl DatabaseConfig {
    /// Create a new database config with the specified path
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Create a config for an in-memory database (useful for testing)
    pub fn in_memory() -> Self {
        Self {
            path: PathBuf::from(MEMORY_PATH),
            max_connections: 1, // In-memory requires single connection
            ..Default::default()
        }
    }

    /// Set the maximum number of connections
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Disable automatic migrations
    pub fn no_migrate(mut self) -> Self {
        self.auto_migrate = false;
        self
    }

    /// Whether this config points at an in-memory database
    pub fn is_in_memory(&self) -> bool {
        self.path.to_string_lossy() == MEMORY_PATH
    }
}

/// Get the default database path
pub fn default_database_path() -> PathBuf {
    if let Some(data_dir) = dirs::data_dir() {
        data_dir.join("hypergraph").join("hypergraph.db")
    } else {
        PathBuf::from("hypergraph.db")
    }
}

/// Database connection pool wrapper
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
    config: DatabaseConfig,
}

impl Database {
    /// Create a new database connection with the given configuration
    pub async fn new(config: DatabaseConfig) -> Result<Self> {
        let in_memory = config.is_in_memory();

        if let Some(parent) = config.path.parent() {
            if !in_memory && !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create database directory: {:?}", parent))?;
            }
        }

        let connection_str = if in_memory {
            "sqlite::memory:".to_string()
        } else {
            format!("sqlite:{}?mode=rwc", config.path.display())
        };

        let connect_options = SqliteConnectOptions::from_str(&connection_str)?
            .journal_mode(config.journal_mode)
            .synchronous(config.synchronous)
            .create_if_missing(true);

        let mut pool_options = SqlitePoolOptions::new().max_connections(config.max_connections);
        if in_memory {
            // The database lives only as long as its single connection
            pool_options = pool_options
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }

        let pool = pool_options
            .connect_with(connect_options)
            .await
            .with_context(|| format!("Failed to connect to database: {:?}", config.path))?;

        let db = Self {
            pool,
            config: config.clone(),
        };

        if config.auto_migrate {
            db.migrate().await?;
        }

        tracing::debug!(path = ?config.path, "Database opened");
        Ok(db)
    }

    /// Create a database connection with default configuration
    pub async fn default() -> Result<Self> {
        Self::new(DatabaseConfig::default()).await
    }

    /// Create an in-memory database (useful for testing)
    pub async fn in_memory() -> Result<Self> {
        Self::new(DatabaseConfig::in_memory()).await
    }

    /// Get the underlying connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Get the database configuration
    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Graph store backed by this database
    pub fn graph_store(&self) -> SqliteGraphStore {
        SqliteGraphStore::new(self.pool.clone())
    }

    /// Run database migrations
    pub async fn migrate(&self) -> Result<()> {
        migrations::run_migrations(&self.pool)
            .await
            .context("Failed to run database migrations")
    }

    /// Check migration status
    pub async fn migration_status(&self) -> Result<migrations::MigrationStatus> {
        migrations::migration_status(&self.pool)
            .await
            .context("Failed to check migration status")
    }

    /// Close the database connection pool
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Get the database file path
    pub fn path(&self) -> &Path {
        &self.config.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::graph::{Entity, GraphStore};

    #[tokio::test]
    async fn test_in_memory_database() {
        let db = Database::in_memory().await.expect("Failed to create in-memory database");

        let status = db.migration_status().await.expect("Failed to get migration status");
        assert!(!status.needs_migration);
        assert_eq!(status.current_version, migrations::CURRENT_VERSION);
        assert!(db.config().is_in_memory());
    }

    #[tokio::test]
    async fn test_database_config_builder() {
        let config = DatabaseConfig::with_path("/tmp/test.db")
            .max_connections(10)
            .no_migrate();

        assert_eq!(config.path, PathBuf::from("/tmp/test.db"));
        assert_eq!(config.max_connections, 10);
        assert!(!config.auto_migrate);
        assert!(!config.is_in_memory());
    }

    #[tokio::test]
    async fn test_file_database_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("graph.db");
        let entity = Entity::new("Dev");

        let db = Database::new(DatabaseConfig::with_path(&path)).await.unwrap();
        db.graph_store().insert_entity(&entity).await.unwrap();
        db.close().await;

        let db = Database::new(DatabaseConfig::with_path(&path)).await.unwrap();
        let found = db.graph_store().get_entity(&entity.id).await.unwrap();
        assert_eq!(found.map(|e| e.id), Some(entity.id));
        assert_eq!(db.path(), path.as_path());
    }
}

//! Database migrations
//!
//! This module manages SQLite schema migrations for the hypergraph store.
//! Migrations are versioned and applied automatically on database connection.

use sqlx::SqlitePool;

/// Current schema version
pub const CURRENT_VERSION: i32 = 2;

/// SQL for creating the migrations tracking table
const CREATE_MIGRATIONS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS _migrations (
        version INTEGER PRIMARY KEY NOT NULL,
        applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    );
"#;

/// Migration 1: Entities and relations
const MIGRATION_V1: &str = r#"
    -- Entities; seq preserves insertion order
    CREATE TABLE IF NOT EXISTS graph_entities (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        id TEXT NOT NULL UNIQUE,
        type TEXT NOT NULL,
        attributes TEXT NOT NULL DEFAULT '{}',
        organization TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_graph_entities_organization ON graph_entities(organization);
    CREATE INDEX IF NOT EXISTS idx_graph_entities_type ON graph_entities(type);

    -- Relations; endpoints are plain ids, not foreign keys, so dangling
    -- references survive entity deletion
    CREATE TABLE IF NOT EXISTS graph_relations (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        id TEXT NOT NULL UNIQUE,
        type TEXT NOT NULL,
        source TEXT NOT NULL,
        target TEXT NOT NULL,
        attributes TEXT NOT NULL DEFAULT '{}',
        organization TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_graph_relations_organization ON graph_relations(organization);
    CREATE INDEX IF NOT EXISTS idx_graph_relations_type ON graph_relations(type);
    CREATE INDEX IF NOT EXISTS idx_graph_relations_source ON graph_relations(source);
    CREATE INDEX IF NOT EXISTS idx_graph_relations_target ON graph_relations(target);
"#;

/// Migration 2: Composite indexes for typed traversal
const MIGRATION_V2: &str = r#"
    CREATE INDEX IF NOT EXISTS idx_graph_relations_source_type ON graph_relations(source, type);
    CREATE INDEX IF NOT EXISTS idx_graph_relations_target_type ON graph_relations(target, type);
"#;

/// Get the current schema version from the database
async fn get_current_version(pool: &SqlitePool) -> anyhow::Result<i32> {
    // Ensure migrations table exists
    sqlx::raw_sql(CREATE_MIGRATIONS_TABLE).execute(pool).await?;

    let row: Option<(Option<i32>,)> = sqlx::query_as("SELECT MAX(version) FROM _migrations")
        .fetch_optional(pool)
        .await?;

    Ok(row.and_then(|(v,)| v).unwrap_or(0))
}

/// Record that a migration has been applied
async fn record_migration(pool: &SqlitePool, version: i32) -> anyhow::Result<()> {
    sqlx::query("INSERT INTO _migrations (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;
    Ok(())
}

/// Run all pending migrations
pub async fn run_migrations(pool: &SqlitePool) -> anyhow::Result<()> {
    let current_version = get_current_version(pool).await?;

    tracing::info!(
        current_version = current_version,
        target_version = CURRENT_VERSION,
        "Checking database migrations"
    );

    if current_version >= CURRENT_VERSION {
        tracing::debug!("Database is up to date");
        return Ok(());
    }

    if current_version < 1 {
        tracing::info!("Applying migration v1: Entities and relations");
        sqlx::raw_sql(MIGRATION_V1).execute(pool).await?;
        record_migration(pool, 1).await?;
    }

    if current_version < 2 {
        tracing::info!("Applying migration v2: Typed traversal indexes");
        sqlx::raw_sql(MIGRATION_V2).execute(pool).await?;
        record_migration(pool, 2).await?;
    }

    tracing::info!("Database migrations completed");
    Ok(())
}

/// Get migration status information
pub async fn migration_status(pool: &SqlitePool) -> anyhow::Result<MigrationStatus> {
    let current_version = get_current_version(pool).await?;
    Ok(MigrationStatus {
        current_version,
        target_version: CURRENT_VERSION,
        needs_migration: current_version < CURRENT_VERSION,
    })
}

/// Migration status information
#[derive(Debug, Clone)]
pub struct MigrationStatus {
    /// Current schema version in the database
    pub current_version: i32,
    /// Target schema version (latest)
    pub target_version: i32,
    /// Whether migrations need to be run
    pub needs_migration: bool,
}

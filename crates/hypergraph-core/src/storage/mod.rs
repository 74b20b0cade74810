//! Storage layer - SQLite + projection files
//!
//! Provides database management, migrations and filesystem projection
//! export/import for the hypergraph store.
//!
//! # Architecture
//!
//! - `database`: Connection pool management and initialization
//! - `migrations`: Schema versioning and automatic migration
//! - `projection_fs`: One JSON file per record, laid out by projection path
//!
//! # Usage
//!
//! ```ignore
//! use hypergraph_core::storage::Database;
//!
//! // Create an in-memory database for testing
//! let db = Database::in_memory().await?;
//! let store = db.graph_store();
//! ```

pub mod database;
pub mod migrations;
pub mod projection_fs;

// Re-export commonly used types
pub use database::{Database, DatabaseConfig, default_database_path};
pub use migrations::{CURRENT_VERSION, MigrationStatus, migration_status, run_migrations};
pub use projection_fs::{
    ExportResult, ImportResult, METADATA_FILE, ProjectionMetadata, export_projections,
    import_projections,
};

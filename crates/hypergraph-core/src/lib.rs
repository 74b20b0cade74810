//! Hypergraph Core Library
//!
//! This crate provides a multi-tenant hypergraph store, including:
//! - Entities and typed binary relations scoped by organization
//! - Filtered, paginated listings
//! - Bounded breadth-first navigation
//! - Compression/expansion of snapshots by scope level
//! - Namespace path projection to and from JSON files
//! - Storage backends (in-memory, SQLite)

pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod storage;

pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::domain::graph::{
        Attributes, Entity, GraphStore, HyperGraph, HyperGraphService, ListOptions,
        NavigationRequest, OrganizationContext, RecordFilter, Relation, ScalingConfig,
        ScalingLevel, ScalingMode,
    };
    pub use crate::error::{Error, Result};
    pub use crate::infrastructure::graph::{InMemoryGraphStore, SqliteGraphStore};
}

#[cfg(test)]
mod config_tests;

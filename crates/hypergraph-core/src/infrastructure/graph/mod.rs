//! Hypergraph storage implementations
//!
//! This module contains concrete implementations of the [`GraphStore`]
//! trait: a process-local in-memory store and a SQLite store.
//!
//! [`GraphStore`]: crate::domain::graph::GraphStore

mod memory;
mod sqlite;

pub use memory::InMemoryGraphStore;
pub use sqlite::SqliteGraphStore;

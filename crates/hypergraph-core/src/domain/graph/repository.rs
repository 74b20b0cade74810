//! Storage trait for hypergraph persistence
//!
//! This module defines the trait for entity and relation storage.
//! The trait abstracts over different backends (in-memory, SQLite, etc.);
//! traversal and scaling only ever talk to this trait.

use async_trait::async_trait;

use crate::error::Result;

use super::entity::Entity;
use super::record::Attributes;
use super::relation::Relation;

/// Storage backend for entities and relations
///
/// Implementations must:
/// - return listings in insertion order
/// - apply attribute patches atomically per record (read-modify-write under a
///   write lock), never moving `created_at`
/// - never expose a partially written record to readers
#[async_trait]
pub trait GraphStore: Send + Sync {
    // ========== Entity Operations ==========

    /// Insert a new entity
    async fn insert_entity(&self, entity: &Entity) -> Result<()>;

    /// Get an entity by ID
    async fn get_entity(&self, id: &str) -> Result<Option<Entity>>;

    /// Get every entity present among `ids`, in the order of `ids`
    async fn get_entities(&self, ids: &[String]) -> Result<Vec<Entity>> {
        let mut entities = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(entity) = self.get_entity(id).await? {
                entities.push(entity);
            }
        }
        Ok(entities)
    }

    /// List all entities in insertion order
    async fn list_entities(&self) -> Result<Vec<Entity>>;

    /// Merge an attribute patch into an entity; `None` when absent
    async fn update_entity_attributes(&self, id: &str, patch: &Attributes) -> Result<Option<Entity>>;

    /// Delete an entity by ID
    async fn delete_entity(&self, id: &str) -> Result<bool>;

    /// Count entities
    async fn count_entities(&self) -> Result<u64>;

    // ========== Relation Operations ==========

    /// Insert a new relation
    async fn insert_relation(&self, relation: &Relation) -> Result<()>;

    /// Get a relation by ID
    async fn get_relation(&self, id: &str) -> Result<Option<Relation>>;

    /// List all relations in insertion order
    async fn list_relations(&self) -> Result<Vec<Relation>>;

    /// Relations whose source or target is any of `entity_ids`, in insertion order
    async fn relations_touching(&self, entity_ids: &[String]) -> Result<Vec<Relation>>;

    /// Merge an attribute patch into a relation; `None` when absent
    async fn update_relation_attributes(
        &self,
        id: &str,
        patch: &Attributes,
    ) -> Result<Option<Relation>>;

    /// Delete a relation by ID
    async fn delete_relation(&self, id: &str) -> Result<bool>;

    /// Count relations
    async fn count_relations(&self) -> Result<u64>;

    // ========== Statistics ==========

    /// Get store statistics
    async fn stats(&self) -> Result<GraphStats> {
        Ok(GraphStats {
            total_entities: self.count_entities().await?,
            total_relations: self.count_relations().await?,
        })
    }
}

/// Statistics about the store
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphStats {
    /// Total number of entities
    pub total_entities: u64,
    /// Total number of relations
    pub total_relations: u64,
}

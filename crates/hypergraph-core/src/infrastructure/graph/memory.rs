//! In-memory implementation of the GraphStore
//!
//! Records live in hash maps keyed by id, with a separate insertion-order
//! index so listings are stable. Each table sits behind its own lock.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::graph::{Attributes, Entity, GraphRecord, GraphStore, Relation};
use crate::error::{Error, Result};

/// A simple in-memory store for entities and relations
#[derive(Debug, Default)]
pub struct InMemoryGraphStore {
    entities: RwLock<Table<Entity>>,
    relations: RwLock<Table<Relation>>,
}

impl InMemoryGraphStore {
    /// Create a new in-memory store
    pub fn new() -> Self {
        Self::default()
    }
}

/// Records plus their insertion order
#[derive(Debug)]
struct Table<T> {
    records: HashMap<String, T>,
    order: Vec<String>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            records: HashMap::new(),
            order: Vec::new(),
        }
    }
}

impl<T: GraphRecord + Clone> Table<T> {
    fn insert(&mut self, record: &T) -> Result<()> {
        if self.records.contains_key(record.id()) {
            return Err(duplicate::<T>(record.id()));
        }
        self.order.push(record.id().to_string());
        self.records.insert(record.id().to_string(), record.clone());
        Ok(())
    }

    fn get(&self, id: &str) -> Option<T> {
        self.records.get(id).cloned()
    }

    fn list(&self) -> Vec<T> {
        self.ordered().cloned().collect()
    }

    fn ordered(&self) -> impl Iterator<Item = &T> {
        self.order.iter().filter_map(|id| self.records.get(id))
    }

    fn remove(&mut self, id: &str) -> bool {
        if self.records.remove(id).is_none() {
            return false;
        }
        self.order.retain(|existing| existing != id);
        true
    }

    fn len(&self) -> u64 {
        self.records.len() as u64
    }
}

fn duplicate<T: GraphRecord>(id: &str) -> Error {
    Error::InvalidInput(format!("{} {} already exists", T::KIND, id))
}

#[async_trait]
impl GraphStore for InMemoryGraphStore {
    // ========== Entity Operations ==========

    async fn insert_entity(&self, entity: &Entity) -> Result<()> {
        self.entities.write().await.insert(entity)
    }

    async fn get_entity(&self, id: &str) -> Result<Option<Entity>> {
        Ok(self.entities.read().await.get(id))
    }

    async fn get_entities(&self, ids: &[String]) -> Result<Vec<Entity>> {
        let table = self.entities.read().await;
        Ok(ids.iter().filter_map(|id| table.get(id)).collect())
    }

    async fn list_entities(&self) -> Result<Vec<Entity>> {
        Ok(self.entities.read().await.list())
    }

    async fn update_entity_attributes(&self, id: &str, patch: &Attributes) -> Result<Option<Entity>> {
        let mut table = self.entities.write().await;
        Ok(table.records.get_mut(id).map(|entity| {
            entity.apply_patch(patch);
            entity.clone()
        }))
    }

    async fn delete_entity(&self, id: &str) -> Result<bool> {
        Ok(self.entities.write().await.remove(id))
    }

    async fn count_entities(&self) -> Result<u64> {
        Ok(self.entities.read().await.len())
    }

    // ========== Relation Operations ==========

    async fn insert_relation(&self, relation: &Relation) -> Result<()> {
        self.relations.write().await.insert(relation)
    }

    async fn get_relation(&self, id: &str) -> Result<Option<Relation>> {
        Ok(self.relations.read().await.get(id))
    }

    async fn list_relations(&self) -> Result<Vec<Relation>> {
        Ok(self.relations.read().await.list())
    }

    async fn relations_touching(&self, entity_ids: &[String]) -> Result<Vec<Relation>> {
        let wanted: HashSet<&str> = entity_ids.iter().map(String::as_str).collect();
        let table = self.relations.read().await;
        Ok(table
            .ordered()
            .filter(|r| wanted.contains(r.source.as_str()) || wanted.contains(r.target.as_str()))
            .cloned()
            .collect())
    }

    async fn update_relation_attributes(
        &self,
        id: &str,
        patch: &Attributes,
    ) -> Result<Option<Relation>> {
        let mut table = self.relations.write().await;
        Ok(table.records.get_mut(id).map(|relation| {
            relation.apply_patch(patch);
            relation.clone()
        }))
    }

    async fn delete_relation(&self, id: &str) -> Result<bool> {
        Ok(self.relations.write().await.remove(id))
    }

    async fn count_relations(&self) -> Result<u64> {
        Ok(self.relations.read().await.len())
    }
}

//! SQLite implementation of the GraphStore
//!
//! Insertion order comes from the autoincrement `seq` column. Attribute
//! patches run as a read-modify-write inside a transaction, serialized by a
//! store-wide write lock.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, Sqlite, SqlitePool, Transaction};
use tokio::sync::Mutex;
use tracing::debug;

use crate::domain::graph::{Attributes, Entity, GraphStore, Relation};
use crate::error::{Error, Result};

const ENTITY_COLUMNS: &str = "id, type, attributes, organization, created_at, updated_at";
const RELATION_COLUMNS: &str =
    "id, type, source, target, attributes, organization, created_at, updated_at";

/// SQLite implementation of the graph store
#[derive(Clone)]
pub struct SqliteGraphStore {
    pool: SqlitePool,
    write_lock: Arc<Mutex<()>>,
}

impl SqliteGraphStore {
    /// Create a new SQLite graph store over a migrated pool
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    async fn fetch_entity(tx: &mut Transaction<'_, Sqlite>, id: &str) -> Result<Option<Entity>> {
        let row: Option<EntityRow> = sqlx::query_as(&format!(
            "SELECT {} FROM graph_entities WHERE id = ?",
            ENTITY_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;

        row.map(|r| r.into_entity()).transpose()
    }

    async fn fetch_relation(tx: &mut Transaction<'_, Sqlite>, id: &str) -> Result<Option<Relation>> {
        let row: Option<RelationRow> = sqlx::query_as(&format!(
            "SELECT {} FROM graph_relations WHERE id = ?",
            RELATION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;

        row.map(|r| r.into_relation()).transpose()
    }
}

#[async_trait]
impl GraphStore for SqliteGraphStore {
    // ========== Entity Operations ==========

    async fn insert_entity(&self, entity: &Entity) -> Result<()> {
        let attributes = encode_attributes(&entity.attributes)?;
        let _guard = self.write_lock.lock().await;

        sqlx::query(
            r#"
            INSERT INTO graph_entities (
                id, type, attributes, organization, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&entity.id)
        .bind(&entity.entity_type)
        .bind(&attributes)
        .bind(&entity.organization)
        .bind(entity.created_at.to_rfc3339())
        .bind(entity.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| duplicate_or_database("entity", &entity.id, e))?;

        debug!(entity_id = %entity.id, entity_type = %entity.entity_type, "Entity saved");
        Ok(())
    }

    async fn get_entity(&self, id: &str) -> Result<Option<Entity>> {
        let row: Option<EntityRow> = sqlx::query_as(&format!(
            "SELECT {} FROM graph_entities WHERE id = ?",
            ENTITY_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_entity()).transpose()
    }

    async fn list_entities(&self) -> Result<Vec<Entity>> {
        let rows: Vec<EntityRow> = sqlx::query_as(&format!(
            "SELECT {} FROM graph_entities ORDER BY seq",
            ENTITY_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.into_entity()).collect()
    }

    async fn update_entity_attributes(&self, id: &str, patch: &Attributes) -> Result<Option<Entity>> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;

        let Some(mut entity) = Self::fetch_entity(&mut tx, id).await? else {
            return Ok(None);
        };
        entity.apply_patch(patch);

        sqlx::query("UPDATE graph_entities SET attributes = ?, updated_at = ? WHERE id = ?")
            .bind(encode_attributes(&entity.attributes)?)
            .bind(entity.updated_at.to_rfc3339())
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(Some(entity))
    }

    async fn delete_entity(&self, id: &str) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let result = sqlx::query("DELETE FROM graph_entities WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_entities(&self) -> Result<u64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM graph_entities")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }

    // ========== Relation Operations ==========

    async fn insert_relation(&self, relation: &Relation) -> Result<()> {
        let attributes = encode_attributes(&relation.attributes)?;
        let _guard = self.write_lock.lock().await;

        sqlx::query(
            r#"
            INSERT INTO graph_relations (
                id, type, source, target, attributes, organization, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&relation.id)
        .bind(&relation.relation_type)
        .bind(&relation.source)
        .bind(&relation.target)
        .bind(&attributes)
        .bind(&relation.organization)
        .bind(relation.created_at.to_rfc3339())
        .bind(relation.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| duplicate_or_database("relation", &relation.id, e))?;

        debug!(
            relation_id = %relation.id,
            source = %relation.source,
            target = %relation.target,
            "Relation saved"
        );
        Ok(())
    }

    async fn get_relation(&self, id: &str) -> Result<Option<Relation>> {
        let row: Option<RelationRow> = sqlx::query_as(&format!(
            "SELECT {} FROM graph_relations WHERE id = ?",
            RELATION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_relation()).transpose()
    }

    async fn list_relations(&self) -> Result<Vec<Relation>> {
        let rows: Vec<RelationRow> = sqlx::query_as(&format!(
            "SELECT {} FROM graph_relations ORDER BY seq",
            RELATION_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.into_relation()).collect()
    }

    async fn relations_touching(&self, entity_ids: &[String]) -> Result<Vec<Relation>> {
        if entity_ids.is_empty() {
            return Ok(Vec::new());
        }

        // One JSON array parameter keeps large frontiers under the bind limit
        let ids = serde_json::to_string(entity_ids)
            .map_err(|e| Error::Serialization(format!("frontier ids: {}", e)))?;

        let rows: Vec<RelationRow> = sqlx::query_as(&format!(
            r#"
            SELECT {} FROM graph_relations
            WHERE source IN (SELECT value FROM json_each(?1))
               OR target IN (SELECT value FROM json_each(?1))
            ORDER BY seq
            "#,
            RELATION_COLUMNS
        ))
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.into_relation()).collect()
    }

    async fn update_relation_attributes(
        &self,
        id: &str,
        patch: &Attributes,
    ) -> Result<Option<Relation>> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;

        let Some(mut relation) = Self::fetch_relation(&mut tx, id).await? else {
            return Ok(None);
        };
        relation.apply_patch(patch);

        sqlx::query("UPDATE graph_relations SET attributes = ?, updated_at = ? WHERE id = ?")
            .bind(encode_attributes(&relation.attributes)?)
            .bind(relation.updated_at.to_rfc3339())
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(Some(relation))
    }

    async fn delete_relation(&self, id: &str) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let result = sqlx::query("DELETE FROM graph_relations WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_relations(&self) -> Result<u64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM graph_relations")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }
}

fn encode_attributes(attributes: &Attributes) -> Result<String> {
    serde_json::to_string(attributes)
        .map_err(|e| Error::Serialization(format!("Failed to serialize attributes: {}", e)))
}

fn duplicate_or_database(kind: &str, id: &str, err: sqlx::Error) -> Error {
    let unique = err
        .as_database_error()
        .is_some_and(|db| db.is_unique_violation());
    if unique {
        Error::InvalidInput(format!("{} {} already exists", kind, id))
    } else {
        Error::DatabaseError(err)
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Other(format!("Invalid timestamp '{}': {}", value, e)))
}

// ========== Database Row Types ==========

#[derive(Debug, FromRow)]
struct EntityRow {
    id: String,
    #[sqlx(rename = "type")]
    entity_type: String,
    attributes: String,
    organization: Option<String>,
    created_at: String,
    updated_at: String,
}

impl EntityRow {
    fn into_entity(self) -> Result<Entity> {
        Ok(Entity {
            attributes: serde_json::from_str(&self.attributes)?,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
            id: self.id,
            entity_type: self.entity_type,
            organization: self.organization,
        })
    }
}

#[derive(Debug, FromRow)]
struct RelationRow {
    id: String,
    #[sqlx(rename = "type")]
    relation_type: String,
    source: String,
    target: String,
    attributes: String,
    organization: Option<String>,
    created_at: String,
    updated_at: String,
}

impl RelationRow {
    fn into_relation(self) -> Result<Relation> {
        Ok(Relation {
            attributes: serde_json::from_str(&self.attributes)?,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
            id: self.id,
            relation_type: self.relation_type,
            source: self.source,
            target: self.target,
            organization: self.organization,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::migrations::run_migrations;
    use serde_json::json;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_test_db() -> SqliteGraphStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create test pool");

        run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        SqliteGraphStore::new(pool)
    }

    #[tokio::test]
    async fn test_entity_round_trip() {
        let store = setup_test_db().await;
        let entity = Entity::new("Developer")
            .with_attribute("name", "Ada")
            .with_attribute("skills", json!(["rust", "sql"]))
            .with_organization(Some("acme".into()));

        store.insert_entity(&entity).await.unwrap();

        let found = store.get_entity(&entity.id).await.unwrap();
        assert_eq!(found, Some(entity));
        assert!(store.get_entity("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_keeps_insertion_order() {
        let store = setup_test_db().await;
        let entities = [Entity::new("Dev"), Entity::new("Proj"), Entity::new("Dev")];
        for entity in &entities {
            store.insert_entity(entity).await.unwrap();
        }
        let ids: Vec<String> = entities.into_iter().map(|e| e.id).collect();

        let listed: Vec<String> = store
            .list_entities()
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(listed, ids);
    }

    #[tokio::test]
    async fn test_duplicate_id_is_invalid_input() {
        let store = setup_test_db().await;
        let relation = Relation::new("WorksOn", "a", "b");
        store.insert_relation(&relation).await.unwrap();

        let err = store.insert_relation(&relation).await.unwrap_err();
        assert_eq!(err.code(), "E800");
    }

    #[tokio::test]
    async fn test_update_attributes_merges() {
        let store = setup_test_db().await;
        let entity = Entity::new("Dev").with_attribute("level", 1).with_attribute("name", "Ada");
        store.insert_entity(&entity).await.unwrap();

        let mut patch = Attributes::new();
        patch.insert("level".into(), json!(2));
        let updated = store
            .update_entity_attributes(&entity.id, &patch)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.attributes["level"], 2);
        assert_eq!(updated.attributes["name"], "Ada");
        assert_eq!(updated.created_at, entity.created_at);
        assert_eq!(store.get_entity(&entity.id).await.unwrap(), Some(updated));

        assert!(store
            .update_entity_attributes("missing", &patch)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_relations_touching_in_order() {
        let store = setup_test_db().await;
        let ab = Relation::new("Knows", "a", "b");
        let cd = Relation::new("Knows", "c", "d");
        let ba = Relation::new("Knows", "b", "a");
        for r in [&ab, &cd, &ba] {
            store.insert_relation(r).await.unwrap();
        }

        let touching = store.relations_touching(&["a".to_string()]).await.unwrap();
        assert_eq!(touching, vec![ab.clone(), ba.clone()]);

        let touching = store
            .relations_touching(&["a".to_string(), "d".to_string()])
            .await
            .unwrap();
        assert_eq!(touching, vec![ab, cd, ba]);

        assert!(store.relations_touching(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_and_count() {
        let store = setup_test_db().await;
        let entity = Entity::new("Dev");
        let relation = Relation::new("Knows", &entity.id, "ghost");
        store.insert_entity(&entity).await.unwrap();
        store.insert_relation(&relation).await.unwrap();

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total_entities, 1);
        assert_eq!(stats.total_relations, 1);

        assert!(store.delete_entity(&entity.id).await.unwrap());
        assert!(!store.delete_entity(&entity.id).await.unwrap());

        // Relations are independent of their endpoints
        assert!(store.get_relation(&relation.id).await.unwrap().is_some());
        assert!(store.delete_relation(&relation.id).await.unwrap());
        assert_eq!(store.count_relations().await.unwrap(), 0);
    }
}

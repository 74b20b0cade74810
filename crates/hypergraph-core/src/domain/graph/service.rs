//! Hypergraph service
//!
//! This module provides the main entry point over a [`GraphStore`]:
//! scoped reads, filtered listings, attribute patches, navigation and
//! scaling, with an in-process audit trail of what was done.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{Error, Result};

use super::entity::Entity;
use super::event::GraphEvent;
use super::filter::{ListOptions, RecordFilter};
use super::hypergraph::{HyperGraph, HyperGraphMetadata, OrganizationContext};
use super::record::{Attributes, DEFAULT_SCOPE, GraphRecord};
use super::relation::Relation;
use super::repository::{GraphStats, GraphStore};
use super::scaling::{self, ScalingConfig};
use super::traversal::{self, NavigationRequest};

/// Number of events kept before the oldest are dropped
pub const MAX_RETAINED_EVENTS: usize = 1000;

/// Defaults the service applies to snapshots and navigation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSettings {
    /// Organization used when a snapshot has no better one
    pub default_org: String,
    /// Upper bound on navigation depth
    pub max_query_depth: u32,
    /// Repository recorded in snapshot metadata
    pub repository: String,
    /// Branch recorded in snapshot metadata
    pub branch: String,
    /// Version recorded in snapshot metadata
    pub version: String,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            default_org: DEFAULT_SCOPE.to_string(),
            max_query_depth: 5,
            repository: "default".to_string(),
            branch: "main".to_string(),
            version: "1.0.0".to_string(),
        }
    }
}

impl ServiceSettings {
    /// Snapshot metadata for an organization, stamped now
    pub fn metadata(&self, organization: impl Into<String>) -> HyperGraphMetadata {
        HyperGraphMetadata::new(organization)
            .with_repository(&self.repository)
            .with_branch(&self.branch)
            .with_version(&self.version)
    }
}

/// Outcome of loading a hypergraph into the store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub entities_imported: usize,
    pub relations_imported: usize,
    /// Records whose id was already present
    pub skipped: usize,
}

/// Hypergraph service over a storage backend
pub struct HyperGraphService<S: GraphStore + ?Sized> {
    /// Storage backend
    store: Arc<S>,
    /// Snapshot and navigation defaults
    settings: ServiceSettings,
    /// Event store for audit trail
    events: Mutex<Vec<GraphEvent>>,
}

impl<S: GraphStore + ?Sized> HyperGraphService<S> {
    /// Create a new service with default settings
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            settings: ServiceSettings::default(),
            events: Mutex::new(Vec::new()),
        }
    }

    /// Replace the settings
    pub fn with_settings(mut self, settings: ServiceSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Get the storage backend
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Get the settings
    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    // ========== Entities ==========

    /// Create and store a new entity
    pub async fn create_entity(
        &self,
        entity_type: &str,
        attributes: Attributes,
        organization: Option<String>,
    ) -> Result<Entity> {
        let entity = Entity::new(entity_type)
            .with_attributes(attributes)
            .with_organization(organization);

        self.store.insert_entity(&entity).await?;
        debug!(entity_id = %entity.id, entity_type = %entity.entity_type, "Entity created");

        self.record(GraphEvent::entity_created(
            &entity.id,
            &entity.entity_type,
            entity.organization.as_deref(),
        ))
        .await;
        Ok(entity)
    }

    /// Get an entity, hidden when `organization` is given and differs
    pub async fn get_entity(&self, id: &str, organization: Option<&str>) -> Result<Option<Entity>> {
        let entity = self.store.get_entity(id).await?;
        Ok(entity.filter(|e| e.in_scope(organization)))
    }

    /// List entities matching the options' filter, paginated
    pub async fn list_entities(&self, options: &ListOptions) -> Result<Vec<Entity>> {
        let entities = self.store.list_entities().await?;
        Ok(options.apply(entities))
    }

    /// Merge `patch` into an entity's attributes
    pub async fn update_entity(&self, id: &str, patch: &Attributes) -> Result<Entity> {
        let entity = self
            .store
            .update_entity_attributes(id, patch)
            .await?
            .ok_or_else(|| Error::EntityNotFound(id.to_string()))?;

        debug!(entity_id = %id, keys = patch.len(), "Entity updated");
        self.record(GraphEvent::entity_updated(id, patch.keys().cloned().collect()))
            .await;
        Ok(entity)
    }

    /// Delete an entity; `false` when it did not exist
    pub async fn delete_entity(&self, id: &str) -> Result<bool> {
        let deleted = self.store.delete_entity(id).await?;
        if deleted {
            debug!(entity_id = %id, "Entity deleted");
            self.record(GraphEvent::entity_deleted(id)).await;
        }
        Ok(deleted)
    }

    /// Relations where the entity is source or target
    pub async fn entity_relations(&self, entity_id: &str) -> Result<Vec<Relation>> {
        self.store.relations_touching(&[entity_id.to_string()]).await
    }

    // ========== Relations ==========

    /// Create and store a new relation
    ///
    /// Endpoints are not checked against the store.
    pub async fn create_relation(
        &self,
        relation_type: &str,
        source: &str,
        target: &str,
        attributes: Attributes,
        organization: Option<String>,
    ) -> Result<Relation> {
        let relation = Relation::new(relation_type, source, target)
            .with_attributes(attributes)
            .with_organization(organization);

        self.store.insert_relation(&relation).await?;
        debug!(
            relation_id = %relation.id,
            relation_type = %relation.relation_type,
            source = %relation.source,
            target = %relation.target,
            "Relation created"
        );

        self.record(GraphEvent::relation_created(
            &relation.id,
            &relation.relation_type,
            &relation.source,
            &relation.target,
        ))
        .await;
        Ok(relation)
    }

    /// Get a relation, hidden when `organization` is given and differs
    pub async fn get_relation(&self, id: &str, organization: Option<&str>) -> Result<Option<Relation>> {
        let relation = self.store.get_relation(id).await?;
        Ok(relation.filter(|r| r.in_scope(organization)))
    }

    /// List relations matching the options' filter, paginated
    pub async fn list_relations(&self, options: &ListOptions) -> Result<Vec<Relation>> {
        let relations = self.store.list_relations().await?;
        Ok(options.apply(relations))
    }

    /// Merge `patch` into a relation's attributes
    pub async fn update_relation(&self, id: &str, patch: &Attributes) -> Result<Relation> {
        let relation = self
            .store
            .update_relation_attributes(id, patch)
            .await?
            .ok_or_else(|| Error::RelationNotFound(id.to_string()))?;

        debug!(relation_id = %id, keys = patch.len(), "Relation updated");
        self.record(GraphEvent::relation_updated(id, patch.keys().cloned().collect()))
            .await;
        Ok(relation)
    }

    /// Delete a relation; `false` when it did not exist
    pub async fn delete_relation(&self, id: &str) -> Result<bool> {
        let deleted = self.store.delete_relation(id).await?;
        if deleted {
            debug!(relation_id = %id, "Relation deleted");
            self.record(GraphEvent::relation_deleted(id)).await;
        }
        Ok(deleted)
    }

    /// Source and target entities of a relation, when present
    pub async fn relation_endpoints(
        &self,
        relation: &Relation,
    ) -> Result<(Option<Entity>, Option<Entity>)> {
        let source = self.store.get_entity(&relation.source).await?;
        let target = self.store.get_entity(&relation.target).await?;
        Ok((source, target))
    }

    // ========== Graph Views ==========

    /// Navigate from an entity, with depth capped at the configured maximum
    pub async fn navigate(&self, request: &NavigationRequest) -> Result<HyperGraph> {
        let requested = request.effective_depth();
        let depth = requested.min(self.settings.max_query_depth);
        if depth < requested {
            debug!(
                start = %request.entity_id,
                requested,
                max_query_depth = self.settings.max_query_depth,
                "Navigation depth capped"
            );
        }
        let capped = NavigationRequest {
            depth: Some(depth),
            ..request.clone()
        };

        let neighborhood = traversal::navigate(self.store.as_ref(), &capped).await?;

        let organization = neighborhood
            .entities
            .first()
            .filter(|e| e.id == request.entity_id)
            .and_then(|e| e.organization.clone())
            .unwrap_or_else(|| self.settings.default_org.clone());

        self.record(GraphEvent::graph_navigated(
            &request.entity_id,
            depth,
            neighborhood.entities.len(),
            neighborhood.relations.len(),
        ))
        .await;

        Ok(neighborhood.into_hypergraph(self.settings.metadata(organization)))
    }

    /// Every entity and relation of one organization
    pub async fn organization_hypergraph(&self, organization: &str) -> Result<HyperGraph> {
        let filter = RecordFilter::new().with_organization(organization);
        let entities = filter.apply(self.store.list_entities().await?);
        let relations = filter.apply(self.store.list_relations().await?);

        debug!(
            org = %organization,
            entities = entities.len(),
            relations = relations.len(),
            "Organization hypergraph assembled"
        );
        Ok(HyperGraph::from_parts(
            entities,
            relations,
            self.settings.metadata(organization),
        ))
    }

    /// Every entity and relation in the store, under the default organization
    pub async fn full_hypergraph(&self) -> Result<HyperGraph> {
        let entities = self.store.list_entities().await?;
        let relations = self.store.list_relations().await?;
        Ok(HyperGraph::from_parts(
            entities,
            relations,
            self.settings.metadata(&self.settings.default_org),
        ))
    }

    /// Compress or expand a hypergraph; the store is left untouched
    pub async fn scale(
        &self,
        graph: &HyperGraph,
        config: &ScalingConfig,
        ctx: &OrganizationContext,
    ) -> HyperGraph {
        let scaled = scaling::scale(graph, config, ctx);
        self.record(GraphEvent::graph_scaled(
            config.mode,
            config.level,
            &ctx.org_name,
            scaled.entities.len(),
            scaled.relations.len(),
        ))
        .await;
        scaled
    }

    /// Store the records of a hypergraph, keeping their ids and timestamps
    ///
    /// Records whose id is already present are skipped.
    pub async fn import_hypergraph(&self, graph: &HyperGraph) -> Result<ImportSummary> {
        let mut summary = ImportSummary::default();

        for entity in &graph.entities {
            if self.store.get_entity(&entity.id).await?.is_some() {
                summary.skipped += 1;
                continue;
            }
            self.store.insert_entity(entity).await?;
            self.record(GraphEvent::entity_created(
                &entity.id,
                &entity.entity_type,
                entity.organization.as_deref(),
            ))
            .await;
            summary.entities_imported += 1;
        }

        for relation in &graph.relations {
            if self.store.get_relation(&relation.id).await?.is_some() {
                summary.skipped += 1;
                continue;
            }
            self.store.insert_relation(relation).await?;
            self.record(GraphEvent::relation_created(
                &relation.id,
                &relation.relation_type,
                &relation.source,
                &relation.target,
            ))
            .await;
            summary.relations_imported += 1;
        }

        info!(
            entities = summary.entities_imported,
            relations = summary.relations_imported,
            skipped = summary.skipped,
            "Hypergraph imported"
        );
        Ok(summary)
    }

    // ========== Audit Trail ==========

    /// Recorded events, oldest first
    pub async fn events(&self) -> Vec<GraphEvent> {
        self.events.lock().await.clone()
    }

    /// Get store statistics
    pub async fn stats(&self) -> Result<GraphStats> {
        self.store.stats().await
    }

    async fn record(&self, event: GraphEvent) {
        let mut events = self.events.lock().await;
        if events.len() >= MAX_RETAINED_EVENTS {
            let excess = events.len() + 1 - MAX_RETAINED_EVENTS;
            events.drain(..excess);
        }
        events.push(event);
    }
}

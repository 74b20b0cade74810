//! Bounded breadth-first navigation over the relation graph
//!
//! Traversal works purely on identifiers: endpoints are never dereferenced as
//! required lookups, so dangling relations are followed like any other.
//! The visited set plus the depth bound guarantee termination on cycles.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

use super::entity::Entity;
use super::hypergraph::{HyperGraph, HyperGraphMetadata};
use super::relation::Relation;
use super::repository::GraphStore;

/// Depth used when a request does not specify one
pub const DEFAULT_NAVIGATION_DEPTH: u32 = 1;

/// Parameters of a navigation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationRequest {
    /// Entity identifier to start from (need not exist in the store)
    pub entity_id: String,
    /// Number of relation hops to expand; defaults to 1
    pub depth: Option<u32>,
    /// Only follow relations of these types
    pub relation_types: Option<Vec<String>>,
}

impl NavigationRequest {
    /// Navigate from an entity with the default depth
    pub fn new(entity_id: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            depth: None,
            relation_types: None,
        }
    }

    /// Set the depth
    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = Some(depth);
        self
    }

    /// Restrict the relation types that are followed
    pub fn with_relation_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.relation_types = Some(types.into_iter().map(Into::into).collect());
        self
    }

    /// Depth after applying the default
    pub fn effective_depth(&self) -> u32 {
        self.depth.unwrap_or(DEFAULT_NAVIGATION_DEPTH)
    }

    fn allows(&self, relation: &Relation) -> bool {
        match &self.relation_types {
            Some(types) => types.iter().any(|t| *t == relation.relation_type),
            None => true,
        }
    }
}

/// Induced sub-hypergraph produced by a navigation
#[derive(Debug, Clone, PartialEq)]
pub struct Neighborhood {
    /// Visited entities that exist in the store, in visit order
    pub entities: Vec<Entity>,
    /// Relations encountered during expansion, each once, in first-seen order
    pub relations: Vec<Relation>,
    /// Every visited identifier, including dangling ones, start first
    pub visited: Vec<String>,
    /// Number of levels actually expanded
    pub levels_expanded: u32,
}

impl Neighborhood {
    /// Wrap into a HyperGraph snapshot
    pub fn into_hypergraph(self, metadata: HyperGraphMetadata) -> HyperGraph {
        HyperGraph::from_parts(self.entities, self.relations, metadata)
    }
}

/// Breadth-first expansion from `request.entity_id`
///
/// Each level examines every relation touching the frontier (restricted to
/// the allowed types); endpoints not yet visited form the next frontier.
/// Stops after `depth` levels or when the frontier is empty.
pub async fn navigate<S>(store: &S, request: &NavigationRequest) -> Result<Neighborhood>
where
    S: GraphStore + ?Sized,
{
    let depth = request.effective_depth();

    let mut visited: HashSet<String> = HashSet::new();
    let mut visit_order: Vec<String> = Vec::new();
    let mut seen_relations: HashSet<String> = HashSet::new();
    let mut relations: Vec<Relation> = Vec::new();

    visited.insert(request.entity_id.clone());
    visit_order.push(request.entity_id.clone());

    let mut frontier = vec![request.entity_id.clone()];
    let mut levels_expanded = 0;

    while levels_expanded < depth && !frontier.is_empty() {
        let mut next_frontier = Vec::new();

        for relation in store.relations_touching(&frontier).await? {
            if !request.allows(&relation) || !seen_relations.insert(relation.id.clone()) {
                continue;
            }

            for endpoint in relation.endpoints() {
                if visited.insert(endpoint.to_string()) {
                    visit_order.push(endpoint.to_string());
                    next_frontier.push(endpoint.to_string());
                }
            }
            relations.push(relation);
        }

        levels_expanded += 1;
        frontier = next_frontier;
    }

    let entities = store.get_entities(&visit_order).await?;

    debug!(
        start = %request.entity_id,
        depth,
        levels_expanded,
        visited = visit_order.len(),
        relations = relations.len(),
        "Navigation complete"
    );

    Ok(Neighborhood {
        entities,
        relations,
        visited: visit_order,
        levels_expanded,
    })
}

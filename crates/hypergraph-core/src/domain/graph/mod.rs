//! Hypergraph domain module
//!
//! Organization-scoped entities and typed binary relations, with:
//!
//! - **Storage abstraction**: [`GraphStore`] backends keep records in insertion order
//! - **Filtering**: conjunctive organization/type/attribute predicates plus pagination
//! - **Traversal**: bounded breadth-first navigation that terminates on cycles
//! - **Scaling**: per-type compression and pass-through expansion of snapshots
//! - **Projection**: mapping records to and from namespace paths
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use hypergraph_core::domain::graph::{HyperGraphService, NavigationRequest};
//! use hypergraph_core::infrastructure::graph::InMemoryGraphStore;
//!
//! let service = HyperGraphService::new(Arc::new(InMemoryGraphStore::new()));
//! let dev = service.create_entity("Developer", attrs, Some("acme".into())).await?;
//! let graph = service.navigate(&NavigationRequest::new(&dev.id).with_depth(2)).await?;
//! ```

mod entity;
mod event;
mod filter;
mod hypergraph;
mod projection;
mod record;
mod relation;
mod repository;
mod scaling;
mod service;
mod traversal;

pub use entity::Entity;
pub use event::GraphEvent;
pub use filter::{DEFAULT_LIST_LIMIT, ListOptions, RecordFilter, paginate};
pub use hypergraph::{HyperGraph, HyperGraphMetadata, OrgLevel, OrganizationContext};
pub use projection::{
    ProjectedRecord, Projection, generate_org_structure, kind_of_path, parse_entity_from_path,
    parse_relation_from_path, project_entity, project_relation, projection_content,
    projection_path,
};
pub use record::{Attributes, DEFAULT_SCOPE, GraphRecord, RecordKind, attributes_from_value};
pub use relation::Relation;
pub use repository::{GraphStats, GraphStore};
pub use scaling::{
    AGGREGATED_PREFIX, COUNT_ATTRIBUTE, ScalingConfig, ScalingLevel, ScalingMode, aggregated_id,
    compress, expand, scale,
};
pub use service::{HyperGraphService, ImportSummary, MAX_RETAINED_EVENTS, ServiceSettings};
pub use traversal::{DEFAULT_NAVIGATION_DEPTH, NavigationRequest, Neighborhood, navigate};

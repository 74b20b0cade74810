//! Namespace path projection
//!
//! Maps records to and from paths of the form
//!
//! ```text
//! {org}/{scope}/entities/{type}/{id}.json
//! {org}/{scope}/relations/{type}/{id}.json
//! ```
//!
//! where `org` is the context organization and `scope` is the record's own
//! organization (or `default`). Content is the JSON-serialized record with
//! ISO-8601 timestamps.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};

use super::entity::Entity;
use super::hypergraph::OrganizationContext;
use super::record::{GraphRecord, RecordKind};
use super::relation::Relation;

/// Projected record content
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ProjectedRecord {
    Entity(Entity),
    Relation(Relation),
}

/// A record mapped onto a namespace path
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Projection {
    /// Path relative to the namespace root
    pub path: String,
    /// Kind of the projected record
    #[serde(rename = "type")]
    pub kind: RecordKind,
    /// The record itself
    pub content: ProjectedRecord,
    /// Context organization the projection was made under
    pub organization: String,
}

/// Path of a record under an organization context
pub fn projection_path<R: GraphRecord>(record: &R, ctx: &OrganizationContext) -> String {
    format!(
        "{}/{}/{}/{}/{}.json",
        ctx.org_name,
        record.scope_segment(),
        R::KIND.folder(),
        record.record_type(),
        record.id()
    )
}

/// Project an entity to its namespace path
pub fn project_entity(entity: &Entity, ctx: &OrganizationContext) -> Projection {
    Projection {
        path: projection_path(entity, ctx),
        kind: RecordKind::Entity,
        content: ProjectedRecord::Entity(entity.clone()),
        organization: ctx.org_name.clone(),
    }
}

/// Project a relation to its namespace path
pub fn project_relation(relation: &Relation, ctx: &OrganizationContext) -> Projection {
    Projection {
        path: projection_path(relation, ctx),
        kind: RecordKind::Relation,
        content: ProjectedRecord::Relation(relation.clone()),
        organization: ctx.org_name.clone(),
    }
}

/// Folder layout of an organization: shared folders, then one pair per repo
pub fn generate_org_structure(ctx: &OrganizationContext) -> Vec<String> {
    let kinds = [RecordKind::Entity, RecordKind::Relation];
    let mut folders: Vec<String> = kinds
        .iter()
        .map(|k| format!("{}/{}", ctx.org_name, k.folder()))
        .collect();

    for repo in &ctx.repos {
        for kind in &kinds {
            folders.push(format!("{}/{}/{}", ctx.org_name, repo, kind.folder()));
        }
    }
    folders
}

/// Pretty-printed JSON content of a projection
pub fn projection_content(projection: &Projection) -> Result<String> {
    let content = match &projection.content {
        ProjectedRecord::Entity(entity) => serde_json::to_string_pretty(entity),
        ProjectedRecord::Relation(relation) => serde_json::to_string_pretty(relation),
    };
    content.map_err(|e| Error::Serialization(format!("{}: {}", projection.path, e)))
}

/// Parse an entity from a projected path and its content
///
/// Returns `Ok(None)` when the path is not under an `entities` kind folder or
/// the JSON is not an entity. Fails only when `content` is not valid JSON.
pub fn parse_entity_from_path(path: &str, content: &str) -> Result<Option<Entity>> {
    parse_from_path(path, content)
}

/// Parse a relation from a projected path and its content
///
/// Returns `Ok(None)` when the path is not under a `relations` kind folder or
/// the JSON is not a relation. Fails only when `content` is not valid JSON.
pub fn parse_relation_from_path(path: &str, content: &str) -> Result<Option<Relation>> {
    parse_from_path(path, content)
}

/// Kind of record a path points at
///
/// The kind folder sits at a fixed position, `.../<kind>/<type>/<id>.json`,
/// so organization segments named `entities` or `relations` do not count.
pub fn kind_of_path(path: &str) -> Option<RecordKind> {
    let folder = path.rsplit('/').nth(2)?;
    [RecordKind::Entity, RecordKind::Relation]
        .into_iter()
        .find(|kind| kind.folder() == folder)
}

fn parse_from_path<R>(path: &str, content: &str) -> Result<Option<R>>
where
    R: GraphRecord + DeserializeOwned,
{
    if kind_of_path(path) != Some(R::KIND) {
        return Ok(None);
    }

    let value: serde_json::Value = serde_json::from_str(content)?;
    match serde_json::from_value::<R>(value) {
        Ok(record) => Ok(Some(record)),
        Err(e) => {
            debug!(path = %path, kind = %R::KIND, error = %e, "Content is not a record of this kind");
            Ok(None)
        }
    }
}

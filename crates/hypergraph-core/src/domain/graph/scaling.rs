//! Scaling of hypergraphs across organizational granularities
//!
//! - **compress** narrows scope. At `folder` level records collapse into one
//!   synthetic record per type (lossy); at `repo` level records are filtered to
//!   the context organization; `org` and `enterprise` pass through.
//! - **expand** widens scope. The input carries no deeper data, so it only
//!   relabels the version; it cannot recover what `compress` aggregated away.
//!
//! Synthetic records exist only in the returned graph and are never written
//! back to the store.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::entity::Entity;
use super::hypergraph::{HyperGraph, OrganizationContext};
use super::record::GraphRecord;
use super::relation::Relation;

/// Attribute holding the number of aggregated members
pub const COUNT_ATTRIBUTE: &str = "count";

/// Identifier prefix of synthetic aggregated records
pub const AGGREGATED_PREFIX: &str = "aggregated_";

/// Direction of a scaling transform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalingMode {
    Compress,
    Expand,
}

impl ScalingMode {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Compress => "compress",
            Self::Expand => "expand",
        }
    }

    /// Parse from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "compress" => Some(Self::Compress),
            "expand" => Some(Self::Expand),
            _ => None,
        }
    }
}

impl std::fmt::Display for ScalingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Organizational granularity, narrowest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalingLevel {
    Folder,
    Repo,
    Org,
    Enterprise,
}

impl ScalingLevel {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Folder => "folder",
            Self::Repo => "repo",
            Self::Org => "org",
            Self::Enterprise => "enterprise",
        }
    }

    /// Parse from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "folder" => Some(Self::Folder),
            "repo" | "repository" => Some(Self::Repo),
            "org" | "organization" => Some(Self::Org),
            "enterprise" => Some(Self::Enterprise),
            _ => None,
        }
    }
}

impl std::fmt::Display for ScalingLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parameters of a scaling transform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScalingConfig {
    pub mode: ScalingMode,
    pub level: ScalingLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_path: Option<String>,
}

impl ScalingConfig {
    /// Compress to a level
    pub fn compress(level: ScalingLevel) -> Self {
        Self {
            mode: ScalingMode::Compress,
            level,
            target_path: None,
        }
    }

    /// Expand to a level
    pub fn expand(level: ScalingLevel) -> Self {
        Self {
            mode: ScalingMode::Expand,
            level,
            target_path: None,
        }
    }

    /// Set the target path
    pub fn with_target_path(mut self, path: impl Into<String>) -> Self {
        self.target_path = Some(path.into());
        self
    }
}

/// Dispatch to [`compress`] or [`expand`] on `config.mode`
pub fn scale(graph: &HyperGraph, config: &ScalingConfig, ctx: &OrganizationContext) -> HyperGraph {
    match config.mode {
        ScalingMode::Compress => compress(graph, config, ctx),
        ScalingMode::Expand => expand(graph, config, ctx),
    }
}

/// Narrow a hypergraph to `config.level`
pub fn compress(graph: &HyperGraph, config: &ScalingConfig, ctx: &OrganizationContext) -> HyperGraph {
    let metadata = graph.metadata.suffixed("compressed");

    let (entities, relations) = match config.level {
        ScalingLevel::Folder => (
            aggregate_by_type(&graph.entities),
            aggregate_by_type(&graph.relations),
        ),
        ScalingLevel::Repo => (
            in_organization(&graph.entities, &ctx.org_name),
            in_organization(&graph.relations, &ctx.org_name),
        ),
        ScalingLevel::Org | ScalingLevel::Enterprise => {
            (graph.entities.clone(), graph.relations.clone())
        }
    };

    debug!(
        level = %config.level,
        org = %ctx.org_name,
        entities_in = graph.entities.len(),
        entities_out = entities.len(),
        relations_in = graph.relations.len(),
        relations_out = relations.len(),
        "Hypergraph compressed"
    );

    HyperGraph {
        entities,
        relations,
        metadata,
    }
}

/// Widen a hypergraph to `config.level`
///
/// Always a pass-through with the version relabelled; `expand(compress(g))`
/// does not reconstruct `g`.
pub fn expand(graph: &HyperGraph, config: &ScalingConfig, ctx: &OrganizationContext) -> HyperGraph {
    debug!(level = %config.level, org = %ctx.org_name, "Hypergraph expanded");

    HyperGraph {
        entities: graph.entities.clone(),
        relations: graph.relations.clone(),
        metadata: graph.metadata.suffixed("expanded"),
    }
}

/// Synthetic identifier for the aggregate of a type
pub fn aggregated_id(record_type: &str) -> String {
    format!("{}{}", AGGREGATED_PREFIX, record_type)
}

/// Collapse records into one per type, in first-seen order
///
/// The aggregate copies the first member (with a synthetic id) and sets
/// `count` to the total number of members of that type.
fn aggregate_by_type<R: Aggregate>(records: &[R]) -> Vec<R> {
    let mut order: Vec<&R> = Vec::new();
    let mut counts: HashMap<&str, u64> = HashMap::new();

    for record in records {
        let count = counts.entry(record.record_type()).or_insert(0);
        if *count == 0 {
            order.push(record);
        }
        *count += 1;
    }

    order
        .into_iter()
        .map(|first| {
            let record_type = first.record_type();
            let total = counts.get(record_type).copied().unwrap_or(1);
            first.synthesize(aggregated_id(record_type), total)
        })
        .collect()
}

/// Records that can stand in for a whole type group
trait Aggregate: GraphRecord + Clone {
    fn synthesize(&self, id: String, count: u64) -> Self;
}

impl Aggregate for Entity {
    fn synthesize(&self, id: String, count: u64) -> Self {
        let mut aggregate = Entity { id, ..self.clone() };
        aggregate
            .attributes
            .insert(COUNT_ATTRIBUTE.to_string(), serde_json::Value::from(count));
        aggregate
    }
}

impl Aggregate for Relation {
    fn synthesize(&self, id: String, count: u64) -> Self {
        let mut aggregate = Relation { id, ..self.clone() };
        aggregate
            .attributes
            .insert(COUNT_ATTRIBUTE.to_string(), serde_json::Value::from(count));
        aggregate
    }
}

fn in_organization<R: GraphRecord + Clone>(records: &[R], org_name: &str) -> Vec<R> {
    records
        .iter()
        .filter(|r| r.organization() == Some(org_name))
        .cloned()
        .collect()
}

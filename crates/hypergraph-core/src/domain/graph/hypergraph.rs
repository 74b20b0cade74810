//! HyperGraph snapshot and organizational context types

use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity::Entity;
use super::relation::Relation;

/// A snapshot bundle of entities, relations and provenance metadata
///
/// `entities` and `relations` never hold duplicate identifiers; use
/// [`HyperGraph::push_entity`] / [`HyperGraph::push_relation`] to keep that true.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HyperGraph {
    /// Entities in deterministic order
    pub entities: Vec<Entity>,
    /// Relations in deterministic order
    pub relations: Vec<Relation>,
    /// Provenance of this snapshot
    pub metadata: HyperGraphMetadata,
}

impl HyperGraph {
    /// Create an empty hypergraph with the given metadata
    pub fn new(metadata: HyperGraphMetadata) -> Self {
        Self {
            entities: Vec::new(),
            relations: Vec::new(),
            metadata,
        }
    }

    /// Build from records, dropping later duplicates of an identifier
    pub fn from_parts(
        entities: impl IntoIterator<Item = Entity>,
        relations: impl IntoIterator<Item = Relation>,
        metadata: HyperGraphMetadata,
    ) -> Self {
        let mut graph = Self::new(metadata);
        for entity in entities {
            graph.push_entity(entity);
        }
        for relation in relations {
            graph.push_relation(relation);
        }
        graph
    }

    /// Append an entity unless its id is already present
    pub fn push_entity(&mut self, entity: Entity) -> bool {
        if self.contains_entity(&entity.id) {
            return false;
        }
        self.entities.push(entity);
        true
    }

    /// Append a relation unless its id is already present
    pub fn push_relation(&mut self, relation: Relation) -> bool {
        if self.contains_relation(&relation.id) {
            return false;
        }
        self.relations.push(relation);
        true
    }

    /// Check whether an entity id is present
    pub fn contains_entity(&self, id: &str) -> bool {
        self.entities.iter().any(|e| e.id == id)
    }

    /// Check whether a relation id is present
    pub fn contains_relation(&self, id: &str) -> bool {
        self.relations.iter().any(|r| r.id == id)
    }

    /// Find an entity by id
    pub fn entity(&self, id: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    /// Entity ids in order
    pub fn entity_ids(&self) -> Vec<&str> {
        self.entities.iter().map(|e| e.id.as_str()).collect()
    }

    /// Relation ids in order
    pub fn relation_ids(&self) -> Vec<&str> {
        self.relations.iter().map(|r| r.id.as_str()).collect()
    }

    /// True when there are neither entities nor relations
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.relations.is_empty()
    }

    /// Check that neither sequence repeats an identifier
    pub fn has_unique_ids(&self) -> bool {
        let mut seen = HashSet::new();
        if !self.entities.iter().all(|e| seen.insert(e.id.as_str())) {
            return false;
        }
        seen.clear();
        self.relations.iter().all(|r| seen.insert(r.id.as_str()))
    }
}

/// Provenance/snapshot context of a hypergraph (not part of its identity)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HyperGraphMetadata {
    pub organization: String,
    pub repository: String,
    pub branch: String,
    pub version: String,
    pub last_sync: DateTime<Utc>,
}

impl HyperGraphMetadata {
    /// Metadata for an organization with default repository, branch and version
    pub fn new(organization: impl Into<String>) -> Self {
        Self {
            organization: organization.into(),
            repository: "default".to_string(),
            branch: "main".to_string(),
            version: "1.0.0".to_string(),
            last_sync: Utc::now(),
        }
    }

    /// Set the repository
    pub fn with_repository(mut self, repository: impl Into<String>) -> Self {
        self.repository = repository.into();
        self
    }

    /// Set the branch
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    /// Set the version
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Copy with `-<suffix>` appended to the version
    pub fn suffixed(&self, suffix: &str) -> Self {
        Self {
            version: format!("{}-{}", self.version, suffix),
            ..self.clone()
        }
    }
}

/// Namespace scope under which scaling and projection operate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationContext {
    pub org_id: String,
    pub org_name: String,
    #[serde(default)]
    pub repos: BTreeSet<String>,
    pub level: OrgLevel,
}

impl OrganizationContext {
    /// Create an organization-level context
    pub fn new(org_id: impl Into<String>, org_name: impl Into<String>) -> Self {
        Self {
            org_id: org_id.into(),
            org_name: org_name.into(),
            repos: BTreeSet::new(),
            level: OrgLevel::Org,
        }
    }

    /// Set the repositories
    pub fn with_repos<I, S>(mut self, repos: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.repos = repos.into_iter().map(Into::into).collect();
        self
    }

    /// Set the level
    pub fn with_level(mut self, level: OrgLevel) -> Self {
        self.level = level;
        self
    }
}

/// Level of an organization context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrgLevel {
    Repo,
    Org,
    Enterprise,
}

impl OrgLevel {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Repo => "repo",
            Self::Org => "org",
            Self::Enterprise => "enterprise",
        }
    }

    /// Parse from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "repo" | "repository" => Some(Self::Repo),
            "org" | "organization" => Some(Self::Org),
            "enterprise" => Some(Self::Enterprise),
            _ => None,
        }
    }
}

impl std::fmt::Display for OrgLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

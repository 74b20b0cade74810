//! Relation type for the hypergraph
//!
//! Relations are typed, directed edges between two entity identifiers.
//! Endpoints are plain identifiers: they may reference entities that are not
//! (yet) in the store, since source data can arrive out of order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::record::{merge_attributes, touch, Attributes, GraphRecord, RecordKind};

/// A typed, directed edge between two entity identifiers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relation {
    /// Unique identifier, assigned at creation and never changed
    pub id: String,
    /// Relation type (e.g. "WorksOn")
    #[serde(rename = "type")]
    pub relation_type: String,
    /// ID of the source entity
    pub source: String,
    /// ID of the target entity
    pub target: String,
    /// Open attributes
    #[serde(default)]
    pub attributes: Attributes,
    /// Owning organization (advisory, used for filtering)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    /// When the relation was created
    pub created_at: DateTime<Utc>,
    /// When the relation was last updated
    pub updated_at: DateTime<Utc>,
}

impl Relation {
    /// Create a new relation between two entity identifiers
    pub fn new(
        relation_type: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4().to_string(),
            relation_type: relation_type.into(),
            source: source.into(),
            target: target.into(),
            attributes: Attributes::new(),
            organization: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set all attributes
    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    /// Set a single attribute
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Set the owning organization
    pub fn with_organization(mut self, organization: Option<String>) -> Self {
        self.organization = organization;
        self
    }

    /// Merge an attribute patch and refresh `updated_at`
    pub fn apply_patch(&mut self, patch: &Attributes) {
        merge_attributes(&mut self.attributes, patch);
        self.updated_at = touch(self.created_at);
    }

    /// Whether either endpoint is the given entity
    pub fn touches(&self, entity_id: &str) -> bool {
        self.source == entity_id || self.target == entity_id
    }

    /// Both endpoints, source first
    pub fn endpoints(&self) -> [&str; 2] {
        [&self.source, &self.target]
    }
}

impl GraphRecord for Relation {
    const KIND: RecordKind = RecordKind::Relation;

    fn id(&self) -> &str {
        &self.id
    }

    fn record_type(&self) -> &str {
        &self.relation_type
    }

    fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    fn organization(&self) -> Option<&str> {
        self.organization.as_deref()
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

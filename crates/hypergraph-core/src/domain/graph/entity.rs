//! Entity type for the hypergraph
//!
//! Entities are typed nodes with an open attribute map. The type is a free
//! string; no schema is enforced beyond it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::record::{merge_attributes, touch, Attributes, GraphRecord, RecordKind};

/// A typed node in the hypergraph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    /// Unique identifier, assigned at creation and never changed
    pub id: String,
    /// Entity type (e.g. "Developer")
    #[serde(rename = "type")]
    pub entity_type: String,
    /// Open attributes
    #[serde(default)]
    pub attributes: Attributes,
    /// Owning organization (advisory, used for filtering)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    /// When the entity was created
    pub created_at: DateTime<Utc>,
    /// When the entity was last updated
    pub updated_at: DateTime<Utc>,
}

impl Entity {
    /// Create a new entity with a fresh identifier
    pub fn new(entity_type: impl Into<String>) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4().to_string(),
            entity_type: entity_type.into(),
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
}

impl GraphRecord for Entity {
    const KIND: RecordKind = RecordKind::Entity;

    fn id(&self) -> &str {
        &self.id
    }

    fn record_type(&self) -> &str {
        &self.entity_type
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

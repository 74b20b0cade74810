//! Shared record abstractions
//!
//! Entities and relations share the same envelope (id, type, attributes,
//! organization, timestamps). The [`GraphRecord`] trait exposes that envelope
//! so filtering, scaling and projection can be written once for both kinds.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Open attribute mapping carried by every record
pub type Attributes = serde_json::Map<String, serde_json::Value>;

/// Organization segment used when a record has no organization
pub const DEFAULT_SCOPE: &str = "default";

/// The two kinds of records held by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// A typed node
    Entity,
    /// A typed, directed edge between two entity identifiers
    Relation,
}

impl RecordKind {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Entity => "entity",
            Self::Relation => "relation",
        }
    }

    /// Namespace folder holding records of this kind
    pub fn folder(&self) -> &'static str {
        match self {
            Self::Entity => "entities",
            Self::Relation => "relations",
        }
    }

    /// Parse from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "entity" | "entities" => Some(Self::Entity),
            "relation" | "relations" => Some(Self::Relation),
            _ => None,
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Common envelope of entities and relations
pub trait GraphRecord {
    /// Kind of this record
    const KIND: RecordKind;

    /// Unique identifier
    fn id(&self) -> &str;

    /// Record type (e.g. "Developer", "WorksOn")
    fn record_type(&self) -> &str;

    /// Open attributes
    fn attributes(&self) -> &Attributes;

    /// Owning organization, if any
    fn organization(&self) -> Option<&str>;

    /// Creation timestamp
    fn created_at(&self) -> DateTime<Utc>;

    /// Last update timestamp
    fn updated_at(&self) -> DateTime<Utc>;

    /// Whether this record is visible under an optional organization scope
    fn in_scope(&self, organization: Option<&str>) -> bool {
        match organization {
            Some(org) => self.organization() == Some(org),
            None => true,
        }
    }

    /// Organization segment used in namespace paths
    fn scope_segment(&self) -> &str {
        self.organization().unwrap_or(DEFAULT_SCOPE)
    }
}

/// Shallow merge: keys in `patch` overwrite, other keys are kept
pub(crate) fn merge_attributes(target: &mut Attributes, patch: &Attributes) {
    for (key, value) in patch {
        target.insert(key.clone(), value.clone());
    }
}

/// Timestamp for an update, never earlier than the creation time
pub(crate) fn touch(created_at: DateTime<Utc>) -> DateTime<Utc> {
    Utc::now().max(created_at)
}

/// Convert an arbitrary JSON value into an attribute map
///
/// `null` becomes an empty map; anything other than an object is rejected.
pub fn attributes_from_value(value: serde_json::Value) -> crate::Result<Attributes> {
    match value {
        serde_json::Value::Object(map) => Ok(map),
        serde_json::Value::Null => Ok(Attributes::new()),
        other => Err(crate::Error::InvalidInput(format!(
            "attributes must be a JSON object, got {}",
            other
        ))),
    }
}

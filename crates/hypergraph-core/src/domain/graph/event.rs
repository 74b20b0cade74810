//! Domain events for the hypergraph
//!
//! Events record what happened to the store and the views derived from it.
//! They form an audit trail; they are not used to rebuild state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::scaling::{ScalingLevel, ScalingMode};

/// Events that can occur in the hypergraph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum GraphEvent {
    /// A new entity was created
    EntityCreated {
        entity_id: String,
        entity_type: String,
        organization: Option<String>,
        timestamp: DateTime<Utc>,
    },
    /// Entity attributes were patched
    EntityUpdated {
        entity_id: String,
        changed_keys: Vec<String>,
        timestamp: DateTime<Utc>,
    },
    /// An entity was deleted
    EntityDeleted {
        entity_id: String,
        timestamp: DateTime<Utc>,
    },
    /// A new relation was created
    RelationCreated {
        relation_id: String,
        relation_type: String,
        source: String,
        target: String,
        timestamp: DateTime<Utc>,
    },
    /// Relation attributes were patched
    RelationUpdated {
        relation_id: String,
        changed_keys: Vec<String>,
        timestamp: DateTime<Utc>,
    },
    /// A relation was deleted
    RelationDeleted {
        relation_id: String,
        timestamp: DateTime<Utc>,
    },
    /// A navigation was performed
    GraphNavigated {
        start_entity_id: String,
        depth: u32,
        entity_count: usize,
        relation_count: usize,
        timestamp: DateTime<Utc>,
    },
    /// A hypergraph was compressed or expanded
    GraphScaled {
        mode: ScalingMode,
        level: ScalingLevel,
        organization: String,
        entity_count: usize,
        relation_count: usize,
        timestamp: DateTime<Utc>,
    },
}

impl GraphEvent {
    /// Get the timestamp of the event
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::EntityCreated { timestamp, .. }
            | Self::EntityUpdated { timestamp, .. }
            | Self::EntityDeleted { timestamp, .. }
            | Self::RelationCreated { timestamp, .. }
            | Self::RelationUpdated { timestamp, .. }
            | Self::RelationDeleted { timestamp, .. }
            | Self::GraphNavigated { timestamp, .. }
            | Self::GraphScaled { timestamp, .. } => *timestamp,
        }
    }

    /// Get the event type name
    pub fn event_type_name(&self) -> &'static str {
        match self {
            Self::EntityCreated { .. } => "entity_created",
            Self::EntityUpdated { .. } => "entity_updated",
            Self::EntityDeleted { .. } => "entity_deleted",
            Self::RelationCreated { .. } => "relation_created",
            Self::RelationUpdated { .. } => "relation_updated",
            Self::RelationDeleted { .. } => "relation_deleted",
            Self::GraphNavigated { .. } => "graph_navigated",
            Self::GraphScaled { .. } => "graph_scaled",
        }
    }

    /// Identifier of the record the event is about, if any
    pub fn subject_id(&self) -> Option<&str> {
        match self {
            Self::EntityCreated { entity_id, .. }
            | Self::EntityUpdated { entity_id, .. }
            | Self::EntityDeleted { entity_id, .. } => Some(entity_id),
            Self::RelationCreated { relation_id, .. }
            | Self::RelationUpdated { relation_id, .. }
            | Self::RelationDeleted { relation_id, .. } => Some(relation_id),
            Self::GraphNavigated { start_entity_id, .. } => Some(start_entity_id),
            Self::GraphScaled { .. } => None,
        }
    }

    pub fn entity_created(entity_id: &str, entity_type: &str, organization: Option<&str>) -> Self {
        Self::EntityCreated {
            entity_id: entity_id.to_string(),
            entity_type: entity_type.to_string(),
            organization: organization.map(String::from),
            timestamp: Utc::now(),
        }
    }

    pub fn entity_updated(entity_id: &str, changed_keys: Vec<String>) -> Self {
        Self::EntityUpdated {
            entity_id: entity_id.to_string(),
            changed_keys,
            timestamp: Utc::now(),
        }
    }

    pub fn entity_deleted(entity_id: &str) -> Self {
        Self::EntityDeleted {
            entity_id: entity_id.to_string(),
            timestamp: Utc::now(),
        }
    }

    pub fn relation_created(relation_id: &str, relation_type: &str, source: &str, target: &str) -> Self {
        Self::RelationCreated {
            relation_id: relation_id.to_string(),
            relation_type: relation_type.to_string(),
            source: source.to_string(),
            target: target.to_string(),
            timestamp: Utc::now(),
        }
    }

    pub fn relation_updated(relation_id: &str, changed_keys: Vec<String>) -> Self {
        Self::RelationUpdated {
            relation_id: relation_id.to_string(),
            changed_keys,
            timestamp: Utc::now(),
        }
    }

    pub fn relation_deleted(relation_id: &str) -> Self {
        Self::RelationDeleted {
            relation_id: relation_id.to_string(),
            timestamp: Utc::now(),
        }
    }

    pub fn graph_navigated(start_entity_id: &str, depth: u32, entity_count: usize, relation_count: usize) -> Self {
        Self::GraphNavigated {
            start_entity_id: start_entity_id.to_string(),
            depth,
            entity_count,
            relation_count,
            timestamp: Utc::now(),
        }
    }

    pub fn graph_scaled(
        mode: ScalingMode,
        level: ScalingLevel,
        organization: &str,
        entity_count: usize,
        relation_count: usize,
    ) -> Self {
        Self::GraphScaled {
            mode,
            level,
            organization: organization.to_string(),
            entity_count,
            relation_count,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_names() {
        let created = GraphEvent::entity_created("e1", "Dev", Some("acme"));
        assert_eq!(created.event_type_name(), "entity_created");
        assert_eq!(created.subject_id(), Some("e1"));

        let scaled = GraphEvent::graph_scaled(ScalingMode::Compress, ScalingLevel::Folder, "acme", 2, 1);
        assert_eq!(scaled.event_type_name(), "graph_scaled");
        assert_eq!(scaled.subject_id(), None);
    }

    #[test]
    fn test_event_serialization_is_tagged() {
        let event = GraphEvent::relation_created("r1", "WorksOn", "e1", "e3");
        let value = serde_json::to_value(&event).unwrap();

        assert_eq!(value["event_type"], "relation_created");
        assert_eq!(value["source"], "e1");

        let back: GraphEvent = serde_json::from_value(value).unwrap();
        assert_eq!(back, event);
    }
}

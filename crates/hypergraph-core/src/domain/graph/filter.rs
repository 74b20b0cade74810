//! Declarative record filtering and pagination
//!
//! A [`RecordFilter`] is a conjunction of optional predicates: organization,
//! type, and attribute equality. Matching preserves the input order so that
//! paginated listings stay stable while the store is unchanged.

use serde::{Deserialize, Serialize};

use super::record::{Attributes, GraphRecord};

/// Default page size for listings
pub const DEFAULT_LIST_LIMIT: i64 = 100;

/// Conjunctive filter over records
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordFilter {
    /// Record must belong to this organization
    pub organization: Option<String>,
    /// Record type must equal this value
    #[serde(rename = "type")]
    pub record_type: Option<String>,
    /// Every listed attribute must be present and deeply equal
    #[serde(default)]
    pub attributes: Attributes,
}

impl RecordFilter {
    /// Create an empty filter (matches everything)
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to an organization
    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    /// Restrict to a record type
    pub fn with_type(mut self, record_type: impl Into<String>) -> Self {
        self.record_type = Some(record_type.into());
        self
    }

    /// Require an attribute value
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Whether a single record satisfies every predicate
    pub fn matches<R: GraphRecord>(&self, record: &R) -> bool {
        if let Some(org) = &self.organization {
            if record.organization() != Some(org.as_str()) {
                return false;
            }
        }

        if let Some(record_type) = &self.record_type {
            if record.record_type() != record_type {
                return false;
            }
        }

        self.attributes
            .iter()
            .all(|(key, expected)| record.attributes().get(key) == Some(expected))
    }

    /// Keep matching records, in input order
    pub fn apply<R: GraphRecord>(&self, records: impl IntoIterator<Item = R>) -> Vec<R> {
        records.into_iter().filter(|r| self.matches(r)).collect()
    }
}

/// Filter plus pagination for list operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListOptions {
    pub filter: RecordFilter,
    pub limit: i64,
    pub offset: i64,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            filter: RecordFilter::default(),
            limit: DEFAULT_LIST_LIMIT,
            offset: 0,
        }
    }
}

impl ListOptions {
    /// List options for a filter with default pagination
    pub fn new(filter: RecordFilter) -> Self {
        Self {
            filter,
            ..Default::default()
        }
    }

    /// Set the page size
    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    /// Set the number of records to skip
    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }

    /// Filter then paginate
    pub fn apply<R: GraphRecord>(&self, records: impl IntoIterator<Item = R>) -> Vec<R> {
        paginate(self.filter.apply(records), self.limit, self.offset)
    }
}

/// Skip `offset` records then take `limit`
///
/// A negative offset counts as zero. `limit <= 0` or an offset past the end
/// yields an empty result.
pub fn paginate<T>(items: Vec<T>, limit: i64, offset: i64) -> Vec<T> {
    if limit <= 0 {
        return Vec::new();
    }
    let offset = usize::try_from(offset.max(0)).unwrap_or(usize::MAX);
    let limit = usize::try_from(limit).unwrap_or(usize::MAX);

    items.into_iter().skip(offset).take(limit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::graph::Entity;
    use serde_json::json;

    fn sample() -> Vec<Entity> {
        vec![
            Entity::new("Dev")
                .with_organization(Some("acme".into()))
                .with_attribute("team", "core")
                .with_attribute("meta", json!({"level": 2, "tags": ["a"]})),
            Entity::new("Dev")
                .with_organization(Some("globex".into()))
                .with_attribute("team", "core"),
            Entity::new("Proj").with_organization(Some("acme".into())),
            Entity::new("Dev").with_attribute("team", "web"),
        ]
    }

    #[test]
    fn test_empty_filter_matches_everything_in_order() {
        let records = sample();
        let ids: Vec<_> = records.iter().map(|e| e.id.clone()).collect();

        let matched = RecordFilter::new().apply(records);
        let matched_ids: Vec<_> = matched.iter().map(|e| e.id.clone()).collect();
        assert_eq!(matched_ids, ids);
    }

    #[test]
    fn test_predicates_are_anded() {
        let filter = RecordFilter::new()
            .with_organization("acme")
            .with_type("Dev")
            .with_attribute("team", "core");

        let matched = filter.apply(sample());
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].organization.as_deref(), Some("acme"));
    }

    #[test]
    fn test_removing_a_predicate_never_shrinks_result() {
        let narrow = RecordFilter::new().with_type("Dev").with_attribute("team", "core");
        let wide = RecordFilter::new().with_type("Dev");

        let narrow_count = narrow.apply(sample()).len();
        let wide_count = wide.apply(sample()).len();
        assert_eq!(narrow_count, 2);
        assert_eq!(wide_count, 3);
    }

    #[test]
    fn test_attribute_equality_is_deep() {
        let hit = RecordFilter::new().with_attribute("meta", json!({"tags": ["a"], "level": 2}));
        let miss = RecordFilter::new().with_attribute("meta", json!({"level": 2}));

        assert_eq!(hit.apply(sample()).len(), 1);
        assert!(miss.apply(sample()).is_empty());
    }

    #[test]
    fn test_missing_attribute_never_matches() {
        let filter = RecordFilter::new().with_attribute("team", serde_json::Value::Null);
        assert!(filter.apply(sample()).is_empty());
    }

    #[test]
    fn test_paginate_edges() {
        let items: Vec<i32> = (0..5).collect();

        assert_eq!(paginate(items.clone(), 2, 1), vec![1, 2]);
        assert_eq!(paginate(items.clone(), 10, 3), vec![3, 4]);
        assert!(paginate(items.clone(), 2, 5).is_empty());
        assert!(paginate(items.clone(), 2, 99).is_empty());
        assert!(paginate(items.clone(), 0, 0).is_empty());
        assert!(paginate(items.clone(), -1, 0).is_empty());
        assert_eq!(paginate(items, 1, -4), vec![0]);
    }

    #[test]
    fn test_list_options_defaults() {
        let options = ListOptions::default();
        assert_eq!(options.limit, DEFAULT_LIST_LIMIT);
        assert_eq!(options.offset, 0);
        assert_eq!(options.apply(sample()).len(), 4);
    }
}

//! Entity (node) types

use crate::ids::{EntityId, WorkspaceId};
use crate::properties::Properties;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An entity in a workspace graph (a node)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Unique identifier
    pub id: EntityId,

    /// Workspace this entity belongs to
    pub workspace_id: WorkspaceId,

    /// Declared entity type name
    #[serde(rename = "type")]
    pub entity_type: String,

    /// Property values, checked against the type's definitions
    #[serde(default)]
    pub properties: Properties,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    /// Soft-delete marker
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Entity {
    /// Create a new entity
    pub fn new(
        workspace_id: WorkspaceId,
        entity_type: impl Into<String>,
        properties: Properties,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: EntityId::new(),
            workspace_id,
            entity_type: entity_type.into(),
            properties,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Replace the property map
    pub fn set_properties(&mut self, properties: Properties) {
        self.properties = properties;
        self.updated_at = Utc::now();
    }

    /// Mark as deleted at `at`
    pub fn soft_delete(&mut self, at: DateTime<Utc>) {
        self.deleted_at = Some(at);
        self.updated_at = at;
    }
}

/// Data for creating a new entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEntity {
    #[serde(rename = "type")]
    pub entity_type: String,
    #[serde(default)]
    pub properties: Properties,
}

impl NewEntity {
    pub fn new(entity_type: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            properties: Properties::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }
}

/// Submitted update for one entity in a bulk request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityUpdateInput {
    pub id: String,
    #[serde(default)]
    pub properties: Properties,
}

impl EntityUpdateInput {
    pub fn new(id: impl Into<String>, properties: Properties) -> Self {
        Self {
            id: id.into(),
            properties,
        }
    }
}

/// Validated update handed to the repository
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityUpdate {
    pub id: EntityId,
    pub properties: Properties,
}

//! Edge types and traversal direction

use crate::ids::{EdgeId, EntityId, WorkspaceId};
use crate::properties::Properties;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Direction for neighbor lookup and traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "out")]
    Outgoing,
    #[serde(rename = "in")]
    Incoming,
    #[default]
    #[serde(rename = "both")]
    Both,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Outgoing => "out",
            Self::Incoming => "in",
            Self::Both => "both",
        }
    }

    /// The direction that walks the same edges backwards
    pub fn reversed(self) -> Self {
        match self {
            Self::Outgoing => Self::Incoming,
            Self::Incoming => Self::Outgoing,
            Self::Both => Self::Both,
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "out" => Ok(Self::Outgoing),
            "in" => Ok(Self::Incoming),
            "both" => Ok(Self::Both),
            other => Err(format!("unknown direction: {}", other)),
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed, directed edge between two entities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,

    pub workspace_id: WorkspaceId,

    /// Declared edge type name (e.g., "WORKS_AT")
    #[serde(rename = "type")]
    pub edge_type: String,

    pub source_id: EntityId,

    pub target_id: EntityId,

    #[serde(default)]
    pub properties: Properties,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Edge {
    pub fn new(
        workspace_id: WorkspaceId,
        edge_type: impl Into<String>,
        source_id: EntityId,
        target_id: EntityId,
        properties: Properties,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: EdgeId::new(),
            workspace_id,
            edge_type: edge_type.into(),
            source_id,
            target_id,
            properties,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Whether `entity` is either endpoint
    pub fn touches(&self, entity: &EntityId) -> bool {
        self.source_id == *entity || self.target_id == *entity
    }

    /// The endpoint opposite `from`, if this edge can be walked from `from`
    /// in `direction`
    pub fn step_from(&self, from: &EntityId, direction: Direction) -> Option<EntityId> {
        match direction {
            Direction::Outgoing if self.source_id == *from => Some(self.target_id),
            Direction::Incoming if self.target_id == *from => Some(self.source_id),
            Direction::Both if self.source_id == *from => Some(self.target_id),
            Direction::Both if self.target_id == *from => Some(self.source_id),
            _ => None,
        }
    }

    pub fn set_properties(&mut self, properties: Properties) {
        self.properties = properties;
        self.updated_at = Utc::now();
    }

    pub fn soft_delete(&mut self, at: DateTime<Utc>) {
        self.deleted_at = Some(at);
        self.updated_at = at;
    }
}

/// Data for creating a new edge, as submitted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEdge {
    #[serde(rename = "type")]
    pub edge_type: String,
    pub source_id: String,
    pub target_id: String,
    #[serde(default)]
    pub properties: Properties,
}

impl NewEdge {
    pub fn new(
        edge_type: impl Into<String>,
        source_id: impl ToString,
        target_id: impl ToString,
    ) -> Self {
        Self {
            edge_type: edge_type.into(),
            source_id: source_id.to_string(),
            target_id: target_id.to_string(),
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

/// Validated edge handed to the repository in bulk creates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeDraft {
    pub edge_type: String,
    pub source_id: EntityId,
    pub target_id: EntityId,
    pub properties: Properties,
}

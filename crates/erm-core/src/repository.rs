//! Repository contracts consumed by the use cases
//!
//! Every call takes the workspace id first; implementations must never
//! read or write records of another workspace.

use crate::edge::{Direction, Edge, EdgeDraft};
use crate::entity::{Entity, EntityUpdate, NewEntity};
use crate::error::Result;
use crate::ids::{EdgeId, EntityId, WorkspaceId};
use crate::properties::Properties;
use crate::schema::{SchemaDraft, WorkspaceSchema};
use crate::validation::{DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Options for single-record reads
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetOptions {
    /// Return soft-deleted records too
    #[serde(default)]
    pub include_deleted: bool,
}

/// Normalized list filters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    pub limit: usize,
    pub offset: usize,
}

impl Default for ListFilters {
    fn default() -> Self {
        Self {
            type_name: None,
            limit: DEFAULT_LIST_LIMIT,
            offset: 0,
        }
    }
}

impl ListFilters {
    pub fn new(type_name: Option<String>, limit: usize, offset: usize) -> Self {
        Self {
            type_name,
            limit: limit.min(MAX_LIST_LIMIT),
            offset,
        }
    }
}

/// Normalized traversal options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraversalOptions {
    pub max_depth: u32,
    pub direction: Direction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl Default for TraversalOptions {
    fn default() -> Self {
        Self {
            max_depth: 1,
            direction: Direction::Both,
            limit: None,
        }
    }
}

/// Normalized neighbor lookup options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeighborOptions {
    pub direction: Direction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge_type: Option<String>,
}

/// Normalized path-finding options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathOptions {
    pub max_depth: u32,
    pub direction: Direction,
    pub max_paths: usize,
}

impl Default for PathOptions {
    fn default() -> Self {
        Self {
            max_depth: 1,
            direction: Direction::Outgoing,
            max_paths: 10,
        }
    }
}

/// Storage for workspace schemas
#[async_trait]
pub trait SchemaRepository: Send + Sync {
    /// Current schema of a workspace, if one was ever stored
    async fn get_schema(&self, workspace: &WorkspaceId) -> Result<Option<WorkspaceSchema>>;

    /// Create or replace a workspace schema
    ///
    /// When `draft.version` is set it must equal the stored version,
    /// otherwise `Error::VersionConflict` is returned.
    async fn upsert_schema(
        &self,
        workspace: &WorkspaceId,
        draft: SchemaDraft,
    ) -> Result<WorkspaceSchema>;
}

/// Durable storage for entities and edges
#[async_trait]
pub trait GraphRepository: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Entity Operations
    // ─────────────────────────────────────────────────────────────────────────

    async fn create_entity(
        &self,
        workspace: &WorkspaceId,
        entity_type: &str,
        properties: Properties,
    ) -> Result<Entity>;

    async fn get_entity(
        &self,
        workspace: &WorkspaceId,
        id: &EntityId,
        opts: GetOptions,
    ) -> Result<Option<Entity>>;

    /// Replace an entity's properties; `Error::NotFound` when absent
    async fn update_entity(
        &self,
        workspace: &WorkspaceId,
        id: &EntityId,
        properties: Properties,
    ) -> Result<Entity>;

    /// Soft-delete an entity and its incident edges, returning the entity
    /// and the number of edges deleted with it
    async fn soft_delete_entity(
        &self,
        workspace: &WorkspaceId,
        id: &EntityId,
    ) -> Result<(Entity, usize)>;

    async fn list_entities(&self, workspace: &WorkspaceId, filters: &ListFilters)
        -> Result<Vec<Entity>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Edge Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Create an edge; `Error::EndpointsNotFound` when either end is missing
    async fn create_edge(
        &self,
        workspace: &WorkspaceId,
        edge_type: &str,
        source_id: &EntityId,
        target_id: &EntityId,
        properties: Properties,
    ) -> Result<Edge>;

    async fn get_edge(&self, workspace: &WorkspaceId, id: &EdgeId) -> Result<Option<Edge>>;

    async fn update_edge(
        &self,
        workspace: &WorkspaceId,
        id: &EdgeId,
        properties: Properties,
    ) -> Result<Edge>;

    async fn soft_delete_edge(&self, workspace: &WorkspaceId, id: &EdgeId) -> Result<Edge>;

    async fn list_edges(&self, workspace: &WorkspaceId, filters: &ListFilters) -> Result<Vec<Edge>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Bulk Operations
    // ─────────────────────────────────────────────────────────────────────────

    async fn bulk_create_entities(
        &self,
        workspace: &WorkspaceId,
        items: Vec<NewEntity>,
    ) -> Result<Vec<Entity>>;

    async fn bulk_create_edges(
        &self,
        workspace: &WorkspaceId,
        items: Vec<EdgeDraft>,
    ) -> Result<Vec<Edge>>;

    async fn bulk_update_entities(
        &self,
        workspace: &WorkspaceId,
        updates: Vec<EntityUpdate>,
    ) -> Result<Vec<Entity>>;

    /// Soft-delete many entities, returning how many were deleted
    async fn bulk_soft_delete_entities(
        &self,
        workspace: &WorkspaceId,
        ids: &[EntityId],
    ) -> Result<usize>;

    /// Resolve many ids at once; missing or deleted ids are absent from the map
    async fn batch_get_entities(
        &self,
        workspace: &WorkspaceId,
        ids: &[EntityId],
    ) -> Result<HashMap<EntityId, Entity>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Graph Operations
    // ─────────────────────────────────────────────────────────────────────────

    async fn get_neighbors(
        &self,
        workspace: &WorkspaceId,
        id: &EntityId,
        opts: &NeighborOptions,
    ) -> Result<Vec<Entity>>;

    async fn traverse(
        &self,
        workspace: &WorkspaceId,
        start: &EntityId,
        opts: &TraversalOptions,
    ) -> Result<Vec<Entity>>;

    async fn find_paths(
        &self,
        workspace: &WorkspaceId,
        source: &EntityId,
        target: &EntityId,
        opts: &PathOptions,
    ) -> Result<Vec<Vec<Entity>>>;
}

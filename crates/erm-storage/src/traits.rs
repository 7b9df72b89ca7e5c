//! Storage backend trait definitions
//!
//! Backends are plain record stores keyed by workspace and id. Soft-delete
//! visibility, cascades and version checks live in [`crate::GraphStore`].

use crate::error::StorageResult;
use async_trait::async_trait;
use erm_core::{Edge, EdgeId, Entity, EntityId, WorkspaceId, WorkspaceSchema};

/// Trait for storage backend implementations
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Initialize the storage (create tables, etc.)
    async fn initialize(&self) -> StorageResult<()>;

    /// Health check
    async fn health_check(&self) -> StorageResult<bool>;

    // ─────────────────────────────────────────────────────────────────────────
    // Entity Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Insert or overwrite an entity
    async fn save_entity(&self, entity: &Entity) -> StorageResult<()>;

    /// Get an entity by id, deleted or not
    async fn get_entity(
        &self,
        workspace: &WorkspaceId,
        id: &EntityId,
    ) -> StorageResult<Option<Entity>>;

    /// Get all entities of a workspace, deleted ones included
    async fn get_all_entities(&self, workspace: &WorkspaceId) -> StorageResult<Vec<Entity>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Edge Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Insert or overwrite an edge
    async fn save_edge(&self, edge: &Edge) -> StorageResult<()>;

    async fn get_edge(&self, workspace: &WorkspaceId, id: &EdgeId) -> StorageResult<Option<Edge>>;

    /// Get all edges of a workspace, deleted ones included
    async fn get_all_edges(&self, workspace: &WorkspaceId) -> StorageResult<Vec<Edge>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Schema Operations
    // ─────────────────────────────────────────────────────────────────────────

    async fn save_schema(&self, schema: &WorkspaceSchema) -> StorageResult<()>;

    async fn get_schema(&self, workspace: &WorkspaceId) -> StorageResult<Option<WorkspaceSchema>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Bulk Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Write entities and edges together; either all land or none do
    async fn save_batch(&self, entities: &[Entity], edges: &[Edge]) -> StorageResult<()>;

    async fn save_entities_batch(&self, entities: &[Entity]) -> StorageResult<()> {
        self.save_batch(entities, &[]).await
    }

    async fn save_edges_batch(&self, edges: &[Edge]) -> StorageResult<()> {
        self.save_batch(&[], edges).await
    }

    /// Load every record of a workspace
    async fn load_workspace(
        &self,
        workspace: &WorkspaceId,
    ) -> StorageResult<(Vec<Entity>, Vec<Edge>)> {
        let entities = self.get_all_entities(workspace).await?;
        let edges = self.get_all_edges(workspace).await?;
        Ok((entities, edges))
    }
}

//! In-memory storage backend for testing

use crate::error::{StorageError, StorageResult};
use crate::traits::StorageBackend;
use async_trait::async_trait;
use erm_core::{Edge, EdgeId, Entity, EntityId, WorkspaceId, WorkspaceSchema};
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory storage backend
///
/// Useful for testing and temporary storage.
pub struct MemoryStorage {
    entities: RwLock<HashMap<(WorkspaceId, EntityId), Entity>>,
    edges: RwLock<HashMap<(WorkspaceId, EdgeId), Edge>>,
    schemas: RwLock<HashMap<WorkspaceId, WorkspaceSchema>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            entities: RwLock::new(HashMap::new()),
            edges: RwLock::new(HashMap::new()),
            schemas: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

fn lock_error(e: impl std::fmt::Display) -> StorageError {
    StorageError::Lock(e.to_string())
}

#[async_trait]
impl StorageBackend for MemoryStorage {
    async fn initialize(&self) -> StorageResult<()> {
        Ok(())
    }

    async fn health_check(&self) -> StorageResult<bool> {
        Ok(true)
    }

    // Entity operations

    async fn save_entity(&self, entity: &Entity) -> StorageResult<()> {
        let mut entities = self.entities.write().map_err(lock_error)?;
        entities.insert((entity.workspace_id, entity.id), entity.clone());
        Ok(())
    }

    async fn get_entity(
        &self,
        workspace: &WorkspaceId,
        id: &EntityId,
    ) -> StorageResult<Option<Entity>> {
        let entities = self.entities.read().map_err(lock_error)?;
        Ok(entities.get(&(*workspace, *id)).cloned())
    }

    async fn get_all_entities(&self, workspace: &WorkspaceId) -> StorageResult<Vec<Entity>> {
        let entities = self.entities.read().map_err(lock_error)?;
        Ok(entities
            .iter()
            .filter(|((ws, _), _)| ws == workspace)
            .map(|(_, e)| e.clone())
            .collect())
    }

    // Edge operations

    async fn save_edge(&self, edge: &Edge) -> StorageResult<()> {
        let mut edges = self.edges.write().map_err(lock_error)?;
        edges.insert((edge.workspace_id, edge.id), edge.clone());
        Ok(())
    }

    async fn get_edge(&self, workspace: &WorkspaceId, id: &EdgeId) -> StorageResult<Option<Edge>> {
        let edges = self.edges.read().map_err(lock_error)?;
        Ok(edges.get(&(*workspace, *id)).cloned())
    }

    async fn get_all_edges(&self, workspace: &WorkspaceId) -> StorageResult<Vec<Edge>> {
        let edges = self.edges.read().map_err(lock_error)?;
        Ok(edges
            .iter()
            .filter(|((ws, _), _)| ws == workspace)
            .map(|(_, e)| e.clone())
            .collect())
    }

    // Schema operations

    async fn save_schema(&self, schema: &WorkspaceSchema) -> StorageResult<()> {
        let mut schemas = self.schemas.write().map_err(lock_error)?;
        schemas.insert(schema.workspace_id, schema.clone());
        Ok(())
    }

    async fn get_schema(&self, workspace: &WorkspaceId) -> StorageResult<Option<WorkspaceSchema>> {
        let schemas = self.schemas.read().map_err(lock_error)?;
        Ok(schemas.get(workspace).cloned())
    }

    // Bulk operations

    async fn save_batch(&self, entities: &[Entity], edges: &[Edge]) -> StorageResult<()> {
        let mut entity_map = self.entities.write().map_err(lock_error)?;
        let mut edge_map = self.edges.write().map_err(lock_error)?;
        for entity in entities {
            entity_map.insert((entity.workspace_id, entity.id), entity.clone());
        }
        for edge in edges {
            edge_map.insert((edge.workspace_id, edge.id), edge.clone());
        }
        Ok(())
    }
}

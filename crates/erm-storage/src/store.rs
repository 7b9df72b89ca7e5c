//! Repository implementations over any [`StorageBackend`]
//!
//! `GraphStore` owns the record semantics: soft-deleted rows stay in the
//! backend but are invisible to reads, deleting an entity soft-deletes its
//! incident edges in the same write, and schema upserts compare versions
//! before writing. Read-modify-write paths hold `write_lock` so concurrent
//! callers cannot interleave between the check and the save.

use crate::error::StorageResult;
use crate::memory::MemoryStorage;
use crate::traits::StorageBackend;
use async_trait::async_trait;
use chrono::Utc;
use erm_core::{
    Edge, EdgeDraft, EdgeId, Entity, EntityId, EntityUpdate, Erm, Error, GetOptions,
    GraphRepository, ListFilters, NeighborOptions, NewEntity, PathOptions, Properties, Result,
    SchemaDraft, SchemaRepository, TraversalEngine, TraversalOptions, WorkspaceId,
    WorkspaceSchema,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Schema and graph repository backed by a [`StorageBackend`]
pub struct GraphStore<B> {
    backend: B,
    write_lock: Mutex<()>,
}

impl<B: StorageBackend> GraphStore<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            write_lock: Mutex::new(()),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Wrap the store in an [`Erm`] using it for both repositories
    pub fn into_erm(self) -> Erm
    where
        B: 'static,
    {
        let store = Arc::new(self);
        Erm::new(store.clone(), store)
    }

    async fn live_entity(&self, ws: &WorkspaceId, id: &EntityId) -> StorageResult<Option<Entity>> {
        Ok(self
            .backend
            .get_entity(ws, id)
            .await?
            .filter(|e| !e.is_deleted()))
    }

    async fn live_edge(&self, ws: &WorkspaceId, id: &EdgeId) -> StorageResult<Option<Edge>> {
        Ok(self.backend.get_edge(ws, id).await?.filter(|e| !e.is_deleted()))
    }

    /// Fails with `EndpointsNotFound` unless every id names a live entity
    ///
    /// Callers hold `write_lock` so a cascade cannot land before the edge write.
    async fn require_live_endpoints<'a>(
        &self,
        ws: &WorkspaceId,
        ids: impl IntoIterator<Item = &'a EntityId>,
    ) -> Result<()> {
        let unique: HashSet<&EntityId> = ids.into_iter().collect();
        for id in unique {
            if self.live_entity(ws, id).await?.is_none() {
                tracing::debug!("Edge endpoint {} missing in {}", id, ws);
                return Err(Error::EndpointsNotFound);
            }
        }
        Ok(())
    }

    /// Live entities keyed by id, plus live edges
    async fn snapshot(&self, ws: &WorkspaceId) -> StorageResult<(HashMap<EntityId, Entity>, Vec<Edge>)> {
        let (entities, edges) = self.backend.load_workspace(ws).await?;
        let entities = entities
            .into_iter()
            .filter(|e| !e.is_deleted())
            .map(|e| (e.id, e))
            .collect();
        let edges = edges.into_iter().filter(|e| !e.is_deleted()).collect();
        Ok((entities, edges))
    }

    /// Soft-delete `entities` and every live edge touching them in one batch
    async fn delete_with_cascade(
        &self,
        ws: &WorkspaceId,
        mut entities: Vec<Entity>,
    ) -> StorageResult<(Vec<Entity>, usize)> {
        let now = Utc::now();
        let ids: HashSet<EntityId> = entities.iter().map(|e| e.id).collect();

        let mut edges: Vec<Edge> = self
            .backend
            .get_all_edges(ws)
            .await?
            .into_iter()
            .filter(|e| !e.is_deleted() && (ids.contains(&e.source_id) || ids.contains(&e.target_id)))
            .collect();

        for entity in &mut entities {
            entity.soft_delete(now);
        }
        for edge in &mut edges {
            edge.soft_delete(now);
        }

        self.backend.save_batch(&entities, &edges).await?;
        Ok((entities, edges.len()))
    }
}

impl GraphStore<MemoryStorage> {
    /// A store with nothing behind it but process memory
    pub fn in_memory() -> Self {
        Self::new(MemoryStorage::new())
    }
}

fn page<T>(mut items: Vec<T>, filters: &ListFilters, key: impl Fn(&T) -> (chrono::DateTime<Utc>, String)) -> Vec<T> {
    items.sort_by_key(|item| key(item));
    items
        .into_iter()
        .skip(filters.offset)
        .take(filters.limit)
        .collect()
}

#[async_trait]
impl<B: StorageBackend> SchemaRepository for GraphStore<B> {
    async fn get_schema(&self, workspace: &WorkspaceId) -> Result<Option<WorkspaceSchema>> {
        Ok(self.backend.get_schema(workspace).await?)
    }

    async fn upsert_schema(&self, workspace: &WorkspaceId, draft: SchemaDraft) -> Result<WorkspaceSchema> {
        let _guard = self.write_lock.lock().await;

        let schema = match self.backend.get_schema(workspace).await? {
            Some(mut existing) => {
                if let Some(expected) = draft.version {
                    if expected != existing.version {
                        tracing::debug!(
                            "Schema version mismatch for {}: expected {}, stored {}",
                            workspace,
                            expected,
                            existing.version
                        );
                        return Err(Error::VersionConflict);
                    }
                }
                existing.apply(draft);
                existing
            }
            None => WorkspaceSchema::from_draft(*workspace, draft),
        };

        self.backend.save_schema(&schema).await?;
        Ok(schema)
    }
}

#[async_trait]
impl<B: StorageBackend> GraphRepository for GraphStore<B> {
    // ─────────────────────────────────────────────────────────────────────────
    // Entity Operations
    // ─────────────────────────────────────────────────────────────────────────

    async fn create_entity(
        &self,
        workspace: &WorkspaceId,
        entity_type: &str,
        properties: Properties,
    ) -> Result<Entity> {
        let entity = Entity::new(*workspace, entity_type, properties);
        self.backend.save_entity(&entity).await?;
        Ok(entity)
    }

    async fn get_entity(
        &self,
        workspace: &WorkspaceId,
        id: &EntityId,
        opts: GetOptions,
    ) -> Result<Option<Entity>> {
        Ok(self
            .backend
            .get_entity(workspace, id)
            .await?
            .filter(|e| opts.include_deleted || !e.is_deleted()))
    }

    async fn update_entity(
        &self,
        workspace: &WorkspaceId,
        id: &EntityId,
        properties: Properties,
    ) -> Result<Entity> {
        let _guard = self.write_lock.lock().await;
        let mut entity = self
            .live_entity(workspace, id)
            .await?
            .ok_or(Error::NotFound)?;
        entity.set_properties(properties);
        self.backend.save_entity(&entity).await?;
        Ok(entity)
    }

    async fn soft_delete_entity(&self, workspace: &WorkspaceId, id: &EntityId) -> Result<(Entity, usize)> {
        let _guard = self.write_lock.lock().await;
        let entity = self
            .live_entity(workspace, id)
            .await?
            .ok_or(Error::NotFound)?;

        let (mut deleted, cascaded) = self.delete_with_cascade(workspace, vec![entity]).await?;
        let entity = deleted.pop().ok_or_else(|| Error::Internal("cascade lost entity".into()))?;
        Ok((entity, cascaded))
    }

    async fn list_entities(&self, workspace: &WorkspaceId, filters: &ListFilters) -> Result<Vec<Entity>> {
        let entities: Vec<Entity> = self
            .backend
            .get_all_entities(workspace)
            .await?
            .into_iter()
            .filter(|e| !e.is_deleted())
            .filter(|e| filters.type_name.as_ref().map_or(true, |t| &e.entity_type == t))
            .collect();
        Ok(page(entities, filters, |e| (e.created_at, e.id.to_string())))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Edge Operations
    // ─────────────────────────────────────────────────────────────────────────

    async fn create_edge(
        &self,
        workspace: &WorkspaceId,
        edge_type: &str,
        source_id: &EntityId,
        target_id: &EntityId,
        properties: Properties,
    ) -> Result<Edge> {
        let _guard = self.write_lock.lock().await;
        self.require_live_endpoints(workspace, [source_id, target_id])
            .await?;

        let edge = Edge::new(*workspace, edge_type, *source_id, *target_id, properties);
        self.backend.save_edge(&edge).await?;
        Ok(edge)
    }

    async fn get_edge(&self, workspace: &WorkspaceId, id: &EdgeId) -> Result<Option<Edge>> {
        Ok(self.live_edge(workspace, id).await?)
    }

    async fn update_edge(&self, workspace: &WorkspaceId, id: &EdgeId, properties: Properties) -> Result<Edge> {
        let _guard = self.write_lock.lock().await;
        let mut edge = self.live_edge(workspace, id).await?.ok_or(Error::NotFound)?;
        edge.set_properties(properties);
        self.backend.save_edge(&edge).await?;
        Ok(edge)
    }

    async fn soft_delete_edge(&self, workspace: &WorkspaceId, id: &EdgeId) -> Result<Edge> {
        let _guard = self.write_lock.lock().await;
        let mut edge = self.live_edge(workspace, id).await?.ok_or(Error::NotFound)?;
        edge.soft_delete(Utc::now());
        self.backend.save_edge(&edge).await?;
        Ok(edge)
    }

    async fn list_edges(&self, workspace: &WorkspaceId, filters: &ListFilters) -> Result<Vec<Edge>> {
        let edges: Vec<Edge> = self
            .backend
            .get_all_edges(workspace)
            .await?
            .into_iter()
            .filter(|e| !e.is_deleted())
            .filter(|e| filters.type_name.as_ref().map_or(true, |t| &e.edge_type == t))
            .collect();
        Ok(page(edges, filters, |e| (e.created_at, e.id.to_string())))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Bulk Operations
    // ─────────────────────────────────────────────────────────────────────────

    async fn bulk_create_entities(&self, workspace: &WorkspaceId, items: Vec<NewEntity>) -> Result<Vec<Entity>> {
        let entities: Vec<Entity> = items
            .into_iter()
            .map(|item| Entity::new(*workspace, item.entity_type, item.properties))
            .collect();
        self.backend.save_entities_batch(&entities).await?;
        Ok(entities)
    }

    async fn bulk_create_edges(&self, workspace: &WorkspaceId, items: Vec<EdgeDraft>) -> Result<Vec<Edge>> {
        let _guard = self.write_lock.lock().await;
        self.require_live_endpoints(
            workspace,
            items.iter().flat_map(|item| [&item.source_id, &item.target_id]),
        )
        .await?;

        let edges: Vec<Edge> = items
            .into_iter()
            .map(|item| {
                Edge::new(
                    *workspace,
                    item.edge_type,
                    item.source_id,
                    item.target_id,
                    item.properties,
                )
            })
            .collect();
        self.backend.save_edges_batch(&edges).await?;
        Ok(edges)
    }

    async fn bulk_update_entities(
        &self,
        workspace: &WorkspaceId,
        updates: Vec<EntityUpdate>,
    ) -> Result<Vec<Entity>> {
        let _guard = self.write_lock.lock().await;

        // Resolve everything first so a missing id writes nothing
        let mut entities = Vec::with_capacity(updates.len());
        for update in updates {
            let mut entity = self
                .live_entity(workspace, &update.id)
                .await?
                .ok_or(Error::NotFound)?;
            entity.set_properties(update.properties);
            entities.push(entity);
        }

        self.backend.save_entities_batch(&entities).await?;
        Ok(entities)
    }

    async fn bulk_soft_delete_entities(&self, workspace: &WorkspaceId, ids: &[EntityId]) -> Result<usize> {
        let _guard = self.write_lock.lock().await;

        let wanted: HashSet<&EntityId> = ids.iter().collect();
        let entities: Vec<Entity> = self
            .backend
            .get_all_entities(workspace)
            .await?
            .into_iter()
            .filter(|e| !e.is_deleted() && wanted.contains(&e.id))
            .collect();
        if entities.is_empty() {
            return Ok(0);
        }

        let (deleted, cascaded) = self.delete_with_cascade(workspace, entities).await?;
        tracing::debug!("Soft-deleted {} entities, {} edges cascaded", deleted.len(), cascaded);
        Ok(deleted.len())
    }

    async fn batch_get_entities(
        &self,
        workspace: &WorkspaceId,
        ids: &[EntityId],
    ) -> Result<HashMap<EntityId, Entity>> {
        let wanted: HashSet<&EntityId> = ids.iter().collect();
        Ok(self
            .backend
            .get_all_entities(workspace)
            .await?
            .into_iter()
            .filter(|e| !e.is_deleted() && wanted.contains(&e.id))
            .map(|e| (e.id, e))
            .collect())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Graph Queries
    // ─────────────────────────────────────────────────────────────────────────

    async fn get_neighbors(
        &self,
        workspace: &WorkspaceId,
        id: &EntityId,
        opts: &NeighborOptions,
    ) -> Result<Vec<Entity>> {
        let (entities, edges) = self.snapshot(workspace).await?;
        if !entities.contains_key(id) {
            return Ok(Vec::new());
        }
        Ok(TraversalEngine::neighbors(id, opts, &entities, &edges))
    }

    async fn traverse(
        &self,
        workspace: &WorkspaceId,
        start: &EntityId,
        opts: &TraversalOptions,
    ) -> Result<Vec<Entity>> {
        let (entities, edges) = self.snapshot(workspace).await?;
        if !entities.contains_key(start) {
            return Ok(Vec::new());
        }
        let (reached, stats) = TraversalEngine::traverse(start, opts, &entities, &edges);
        tracing::debug!(
            "Traversal from {} reached depth {}",
            start,
            stats.max_depth_reached
        );
        Ok(reached)
    }

    async fn find_paths(
        &self,
        workspace: &WorkspaceId,
        source: &EntityId,
        target: &EntityId,
        opts: &PathOptions,
    ) -> Result<Vec<Vec<Entity>>> {
        let (entities, edges) = self.snapshot(workspace).await?;
        let (source, target, opts) = (*source, *target, *opts);
        tokio::task::spawn_blocking(move || {
            TraversalEngine::find_paths(&source, &target, &opts, &entities, &edges)
        })
        .await
        .map_err(|e| Error::Internal(format!("path search failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn props(value: serde_json::Value) -> Properties {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn test_soft_delete_hides_and_cascades() {
        let store = GraphStore::in_memory();
        let ws = WorkspaceId::new();

        let hub = store.create_entity(&ws, "Person", Properties::new()).await.unwrap();
        let mut spokes = Vec::new();
        for _ in 0..3 {
            let spoke = store.create_entity(&ws, "Person", Properties::new()).await.unwrap();
            store
                .create_edge(&ws, "KNOWS", &hub.id, &spoke.id, Properties::new())
                .await
                .unwrap();
            spokes.push(spoke);
        }
        let loose = store
            .create_edge(&ws, "KNOWS", &spokes[0].id, &spokes[1].id, Properties::new())
            .await
            .unwrap();

        let (deleted, cascaded) = store.soft_delete_entity(&ws, &hub.id).await.unwrap();
        assert!(deleted.is_deleted());
        assert_eq!(cascaded, 3);

        assert!(store.get_entity(&ws, &hub.id, GetOptions::default()).await.unwrap().is_none());
        let kept = store
            .get_entity(&ws, &hub.id, GetOptions { include_deleted: true })
            .await
            .unwrap();
        assert!(kept.is_some_and(|e| e.is_deleted()));

        let edges = store.list_edges(&ws, &ListFilters::default()).await.unwrap();
        assert_eq!(edges, vec![loose]);

        assert_eq!(
            store.soft_delete_entity(&ws, &hub.id).await.unwrap_err(),
            Error::NotFound
        );
        assert_eq!(
            store.update_entity(&ws, &hub.id, Properties::new()).await.unwrap_err(),
            Error::NotFound
        );
    }

    #[tokio::test]
    async fn test_create_edge_requires_live_endpoints() {
        let store = GraphStore::in_memory();
        let ws = WorkspaceId::new();
        let a = store.create_entity(&ws, "Person", Properties::new()).await.unwrap();

        let err = store
            .create_edge(&ws, "KNOWS", &a.id, &EntityId::new(), Properties::new())
            .await
            .unwrap_err();
        assert_eq!(err, Error::EndpointsNotFound);
    }

    #[tokio::test]
    async fn test_bulk_create_edges_rejects_deleted_endpoint() {
        let store = GraphStore::in_memory();
        let ws = WorkspaceId::new();
        let a = store.create_entity(&ws, "Person", Properties::new()).await.unwrap();
        let b = store.create_entity(&ws, "Person", Properties::new()).await.unwrap();
        let c = store.create_entity(&ws, "Person", Properties::new()).await.unwrap();
        store.soft_delete_entity(&ws, &b.id).await.unwrap();

        let draft = |source: &Entity, target: &Entity| EdgeDraft {
            edge_type: "KNOWS".into(),
            source_id: source.id,
            target_id: target.id,
            properties: Properties::new(),
        };

        let err = store
            .bulk_create_edges(&ws, vec![draft(&a, &c), draft(&a, &b)])
            .await
            .unwrap_err();
        assert_eq!(err, Error::EndpointsNotFound);
        assert!(store.list_edges(&ws, &ListFilters::default()).await.unwrap().is_empty());

        let created = store.bulk_create_edges(&ws, vec![draft(&a, &c)]).await.unwrap();
        assert_eq!(created.len(), 1);
    }

    #[tokio::test]
    async fn test_schema_versioning() {
        let store = GraphStore::in_memory();
        let ws = WorkspaceId::new();

        let v1 = store.upsert_schema(&ws, SchemaDraft::default()).await.unwrap();
        assert_eq!(v1.version, 1);

        let v2 = store
            .upsert_schema(
                &ws,
                SchemaDraft {
                    version: Some(1),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(v2.version, 2);
        assert_eq!(v2.id, v1.id);

        let err = store
            .upsert_schema(
                &ws,
                SchemaDraft {
                    version: Some(1),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err, Error::VersionConflict);

        let v3 = store.upsert_schema(&ws, SchemaDraft::default()).await.unwrap();
        assert_eq!(v3.version, 3);
    }

    #[tokio::test]
    async fn test_list_pages_in_creation_order() {
        let store = GraphStore::in_memory();
        let ws = WorkspaceId::new();
        let created = store
            .bulk_create_entities(
                &ws,
                (0..5)
                    .map(|i| NewEntity::new("Person").with_property("n", json!(i)))
                    .collect(),
            )
            .await
            .unwrap();
        store.create_entity(&ws, "Company", props(json!({"name": "Acme"}))).await.unwrap();

        let people = store
            .list_entities(&ws, &ListFilters::new(Some("Person".into()), 100, 0))
            .await
            .unwrap();
        assert_eq!(people.len(), 5);

        let page = store
            .list_entities(&ws, &ListFilters::new(None, 2, 4))
            .await
            .unwrap();
        assert_eq!(page.len(), 2);

        let found = store
            .batch_get_entities(&ws, &[created[0].id, created[1].id, EntityId::new()])
            .await
            .unwrap();
        assert_eq!(found.len(), 2);
    }

    #[tokio::test]
    async fn test_bulk_update_writes_nothing_when_an_id_is_missing() {
        let store = GraphStore::in_memory();
        let ws = WorkspaceId::new();
        let a = store.create_entity(&ws, "Person", props(json!({"v": 1}))).await.unwrap();

        let err = store
            .bulk_update_entities(
                &ws,
                vec![
                    EntityUpdate {
                        id: a.id,
                        properties: props(json!({"v": 2})),
                    },
                    EntityUpdate {
                        id: EntityId::new(),
                        properties: Properties::new(),
                    },
                ],
            )
            .await
            .unwrap_err();
        assert_eq!(err, Error::NotFound);

        let unchanged = store.get_entity(&ws, &a.id, GetOptions::default()).await.unwrap().unwrap();
        assert_eq!(unchanged.properties["v"], json!(1));
    }
}

//! Call-recording fake repositories for use-case tests

use crate::edge::{Edge, EdgeDraft};
use crate::entity::{Entity, EntityUpdate, NewEntity};
use crate::error::{Error, Result};
use crate::events::EventRecorder;
use crate::ids::{EdgeId, EntityId, WorkspaceId};
use crate::properties::{Properties, PropertyDef, PropertyType};
use crate::repository::{
    GetOptions, GraphRepository, ListFilters, NeighborOptions, PathOptions, SchemaRepository,
    TraversalOptions,
};
use crate::schema::{EdgeTypeDef, EntityTypeDef, SchemaDraft, WorkspaceSchema};
use crate::traversal::TraversalEngine;
use crate::usecases::Erm;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// In-memory repository that logs every call by name
#[derive(Default)]
pub struct FakeRepo {
    schemas: Mutex<HashMap<WorkspaceId, WorkspaceSchema>>,
    entities: Mutex<Vec<Entity>>,
    edges: Mutex<Vec<Edge>>,
    calls: Mutex<Vec<&'static str>>,
    upsert_failure: Mutex<Option<Error>>,
    create_edge_failure: Mutex<Option<Error>>,
}

impl FakeRepo {
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn called(&self, name: &str) -> bool {
        self.calls().iter().any(|c| *c == name)
    }

    pub fn reset_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn fail_upsert_with(&self, error: Error) {
        *self.upsert_failure.lock().unwrap() = Some(error);
    }

    pub fn fail_create_edge_with(&self, error: Error) {
        *self.create_edge_failure.lock().unwrap() = Some(error);
    }

    /// Person(name!, age), Company(name!), WORKS_AT(role), KNOWS
    pub fn seed_schema(&self, ws: &WorkspaceId) -> WorkspaceSchema {
        let draft = SchemaDraft {
            entity_types: vec![
                EntityTypeDef {
                    name: "Person".into(),
                    properties: vec![
                        PropertyDef::new("name", PropertyType::String).required(),
                        PropertyDef::new("age", PropertyType::Integer),
                    ],
                },
                EntityTypeDef {
                    name: "Company".into(),
                    properties: vec![PropertyDef::new("name", PropertyType::String).required()],
                },
            ],
            edge_types: vec![
                EdgeTypeDef {
                    name: "WORKS_AT".into(),
                    properties: vec![PropertyDef::new("role", PropertyType::String)],
                },
                EdgeTypeDef {
                    name: "KNOWS".into(),
                    properties: vec![],
                },
            ],
            version: None,
        };
        let schema = WorkspaceSchema::from_draft(*ws, draft);
        self.schemas.lock().unwrap().insert(*ws, schema.clone());
        schema
    }

    pub fn seed_entity(&self, ws: &WorkspaceId, entity_type: &str, props: Properties) -> Entity {
        let entity = Entity::new(*ws, entity_type, props);
        self.entities.lock().unwrap().push(entity.clone());
        entity
    }

    pub fn seed_edge(&self, ws: &WorkspaceId, edge_type: &str, from: &EntityId, to: &EntityId) -> Edge {
        let edge = Edge::new(*ws, edge_type, *from, *to, Properties::new());
        self.edges.lock().unwrap().push(edge.clone());
        edge
    }

    pub fn entity_count(&self, ws: &WorkspaceId) -> usize {
        self.entities
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.workspace_id == *ws && !e.is_deleted())
            .count()
    }

    fn record(&self, name: &'static str) {
        self.calls.lock().unwrap().push(name);
    }

    fn live_entity(&self, ws: &WorkspaceId, id: &EntityId) -> Option<Entity> {
        self.entities
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.workspace_id == *ws && e.id == *id && !e.is_deleted())
            .cloned()
    }

    fn snapshot(&self, ws: &WorkspaceId) -> (HashMap<EntityId, Entity>, Vec<Edge>) {
        let entities = self
            .entities
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.workspace_id == *ws && !e.is_deleted())
            .map(|e| (e.id, e.clone()))
            .collect();
        let edges = self
            .edges
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.workspace_id == *ws && !e.is_deleted())
            .cloned()
            .collect();
        (entities, edges)
    }
}

#[async_trait]
impl SchemaRepository for FakeRepo {
    async fn get_schema(&self, ws: &WorkspaceId) -> Result<Option<WorkspaceSchema>> {
        self.record("get_schema");
        Ok(self.schemas.lock().unwrap().get(ws).cloned())
    }

    async fn upsert_schema(&self, ws: &WorkspaceId, draft: SchemaDraft) -> Result<WorkspaceSchema> {
        self.record("upsert_schema");
        if let Some(err) = self.upsert_failure.lock().unwrap().take() {
            return Err(err);
        }
        let mut schemas = self.schemas.lock().unwrap();
        let schema = match schemas.get_mut(ws) {
            Some(existing) => {
                if draft.version.is_some_and(|v| v != existing.version) {
                    return Err(Error::VersionConflict);
                }
                existing.apply(draft);
                existing.clone()
            }
            None => {
                let schema = WorkspaceSchema::from_draft(*ws, draft);
                schemas.insert(*ws, schema.clone());
                schema
            }
        };
        Ok(schema)
    }
}

#[async_trait]
impl GraphRepository for FakeRepo {
    async fn create_entity(&self, ws: &WorkspaceId, entity_type: &str, properties: Properties) -> Result<Entity> {
        self.record("create_entity");
        let entity = Entity::new(*ws, entity_type, properties);
        self.entities.lock().unwrap().push(entity.clone());
        Ok(entity)
    }

    async fn get_entity(&self, ws: &WorkspaceId, id: &EntityId, opts: GetOptions) -> Result<Option<Entity>> {
        self.record("get_entity");
        Ok(self
            .entities
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.workspace_id == *ws && e.id == *id && (opts.include_deleted || !e.is_deleted()))
            .cloned())
    }

    async fn update_entity(&self, ws: &WorkspaceId, id: &EntityId, properties: Properties) -> Result<Entity> {
        self.record("update_entity");
        let mut entities = self.entities.lock().unwrap();
        let entity = entities
            .iter_mut()
            .find(|e| e.workspace_id == *ws && e.id == *id && !e.is_deleted())
            .ok_or(Error::NotFound)?;
        entity.set_properties(properties);
        Ok(entity.clone())
    }

    async fn soft_delete_entity(&self, ws: &WorkspaceId, id: &EntityId) -> Result<(Entity, usize)> {
        self.record("soft_delete_entity");
        let now = Utc::now();
        let entity = {
            let mut entities = self.entities.lock().unwrap();
            let entity = entities
                .iter_mut()
                .find(|e| e.workspace_id == *ws && e.id == *id && !e.is_deleted())
                .ok_or(Error::NotFound)?;
            entity.soft_delete(now);
            entity.clone()
        };
        let mut cascaded = 0;
        for edge in self.edges.lock().unwrap().iter_mut() {
            if edge.workspace_id == *ws && edge.touches(id) && !edge.is_deleted() {
                edge.soft_delete(now);
                cascaded += 1;
            }
        }
        Ok((entity, cascaded))
    }

    async fn list_entities(&self, ws: &WorkspaceId, filters: &ListFilters) -> Result<Vec<Entity>> {
        self.record("list_entities");
        let (entities, _) = self.snapshot(ws);
        let mut list: Vec<Entity> = entities
            .into_values()
            .filter(|e| filters.type_name.as_ref().map_or(true, |t| &e.entity_type == t))
            .collect();
        list.sort_by_key(|e| e.created_at);
        Ok(list.into_iter().skip(filters.offset).take(filters.limit).collect())
    }

    async fn create_edge(
        &self,
        ws: &WorkspaceId,
        edge_type: &str,
        source_id: &EntityId,
        target_id: &EntityId,
        properties: Properties,
    ) -> Result<Edge> {
        self.record("create_edge");
        if let Some(err) = self.create_edge_failure.lock().unwrap().take() {
            return Err(err);
        }
        if self.live_entity(ws, source_id).is_none() || self.live_entity(ws, target_id).is_none() {
            return Err(Error::EndpointsNotFound);
        }
        let edge = Edge::new(*ws, edge_type, *source_id, *target_id, properties);
        self.edges.lock().unwrap().push(edge.clone());
        Ok(edge)
    }

    async fn get_edge(&self, ws: &WorkspaceId, id: &EdgeId) -> Result<Option<Edge>> {
        self.record("get_edge");
        Ok(self
            .edges
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.workspace_id == *ws && e.id == *id && !e.is_deleted())
            .cloned())
    }

    async fn update_edge(&self, ws: &WorkspaceId, id: &EdgeId, properties: Properties) -> Result<Edge> {
        self.record("update_edge");
        let mut edges = self.edges.lock().unwrap();
        let edge = edges
            .iter_mut()
            .find(|e| e.workspace_id == *ws && e.id == *id && !e.is_deleted())
            .ok_or(Error::NotFound)?;
        edge.set_properties(properties);
        Ok(edge.clone())
    }

    async fn soft_delete_edge(&self, ws: &WorkspaceId, id: &EdgeId) -> Result<Edge> {
        self.record("soft_delete_edge");
        let mut edges = self.edges.lock().unwrap();
        let edge = edges
            .iter_mut()
            .find(|e| e.workspace_id == *ws && e.id == *id && !e.is_deleted())
            .ok_or(Error::NotFound)?;
        edge.soft_delete(Utc::now());
        Ok(edge.clone())
    }

    async fn list_edges(&self, ws: &WorkspaceId, filters: &ListFilters) -> Result<Vec<Edge>> {
        self.record("list_edges");
        let (_, edges) = self.snapshot(ws);
        Ok(edges
            .into_iter()
            .filter(|e| filters.type_name.as_ref().map_or(true, |t| &e.edge_type == t))
            .skip(filters.offset)
            .take(filters.limit)
            .collect())
    }

    async fn bulk_create_entities(&self, ws: &WorkspaceId, items: Vec<NewEntity>) -> Result<Vec<Entity>> {
        self.record("bulk_create_entities");
        let created: Vec<Entity> = items
            .into_iter()
            .map(|item| Entity::new(*ws, item.entity_type, item.properties))
            .collect();
        self.entities.lock().unwrap().extend(created.iter().cloned());
        Ok(created)
    }

    async fn bulk_create_edges(&self, ws: &WorkspaceId, items: Vec<EdgeDraft>) -> Result<Vec<Edge>> {
        self.record("bulk_create_edges");
        let created: Vec<Edge> = items
            .into_iter()
            .map(|item| Edge::new(*ws, item.edge_type, item.source_id, item.target_id, item.properties))
            .collect();
        self.edges.lock().unwrap().extend(created.iter().cloned());
        Ok(created)
    }

    async fn bulk_update_entities(&self, ws: &WorkspaceId, updates: Vec<EntityUpdate>) -> Result<Vec<Entity>> {
        self.record("bulk_update_entities");
        let mut entities = self.entities.lock().unwrap();
        let mut updated = Vec::with_capacity(updates.len());
        for update in updates {
            let entity = entities
                .iter_mut()
                .find(|e| e.workspace_id == *ws && e.id == update.id && !e.is_deleted())
                .ok_or(Error::NotFound)?;
            entity.set_properties(update.properties);
            updated.push(entity.clone());
        }
        Ok(updated)
    }

    async fn bulk_soft_delete_entities(&self, ws: &WorkspaceId, ids: &[EntityId]) -> Result<usize> {
        self.record("bulk_soft_delete_entities");
        let now = Utc::now();
        let mut count = 0;
        for entity in self.entities.lock().unwrap().iter_mut() {
            if entity.workspace_id == *ws && ids.contains(&entity.id) && !entity.is_deleted() {
                entity.soft_delete(now);
                count += 1;
            }
        }
        Ok(count)
    }

    async fn batch_get_entities(&self, ws: &WorkspaceId, ids: &[EntityId]) -> Result<HashMap<EntityId, Entity>> {
        self.record("batch_get_entities");
        let (entities, _) = self.snapshot(ws);
        Ok(entities.into_iter().filter(|(id, _)| ids.contains(id)).collect())
    }

    async fn get_neighbors(&self, ws: &WorkspaceId, id: &EntityId, opts: &NeighborOptions) -> Result<Vec<Entity>> {
        self.record("get_neighbors");
        let (entities, edges) = self.snapshot(ws);
        Ok(TraversalEngine::neighbors(id, opts, &entities, &edges))
    }

    async fn traverse(&self, ws: &WorkspaceId, start: &EntityId, opts: &TraversalOptions) -> Result<Vec<Entity>> {
        self.record("traverse");
        let (entities, edges) = self.snapshot(ws);
        Ok(TraversalEngine::traverse(start, opts, &entities, &edges).0)
    }

    async fn find_paths(
        &self,
        ws: &WorkspaceId,
        source: &EntityId,
        target: &EntityId,
        opts: &PathOptions,
    ) -> Result<Vec<Vec<Entity>>> {
        self.record("find_paths");
        let (entities, edges) = self.snapshot(ws);
        Ok(TraversalEngine::find_paths(source, target, opts, &entities, &edges))
    }
}

/// A fake repository wired into an [`Erm`] with an event recorder
pub struct Harness {
    pub repo: Arc<FakeRepo>,
    pub events: Arc<EventRecorder>,
    pub erm: Erm,
}

impl Harness {
    pub fn new() -> Self {
        let repo = Arc::new(FakeRepo::default());
        let events = Arc::new(EventRecorder::new());
        let erm = Erm::new(repo.clone(), repo.clone()).with_event_sink(events.clone());
        Self { repo, events, erm }
    }

    /// Harness with the standard schema seeded for `ws`
    pub fn with_schema(ws: &WorkspaceId) -> Self {
        let harness = Self::new();
        harness.repo.seed_schema(ws);
        harness
    }
}

/// Build a property map from a JSON object literal
pub fn props(value: serde_json::Value) -> Properties {
    serde_json::from_value(value).unwrap()
}

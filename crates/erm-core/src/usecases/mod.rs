//! Use cases: validate, delegate to a repository, emit an event
//!
//! [`Erm`] bundles the injected collaborators. Each service borrows that
//! bundle and runs one request to completion; no state survives a call.

mod bulk;
mod edges;
mod entities;
mod queries;
mod schema;

#[cfg(test)]
pub(crate) mod testing;

pub use bulk::BulkService;
pub use edges::EdgeService;
pub use entities::EntityService;
pub use queries::{ListParams, NeighborParams, PathParams, QueryService, TraverseParams};
pub use schema::SchemaService;

use crate::error::{Error, Result};
use crate::events::{DomainEvent, EventMeta, EventSink};
use crate::ids::WorkspaceId;
use crate::repository::{GraphRepository, SchemaRepository};
use crate::schema::WorkspaceSchema;
use std::sync::Arc;

/// Injected collaborators shared by all services
#[derive(Clone)]
pub struct Erm {
    schema_repo: Arc<dyn SchemaRepository>,
    graph_repo: Arc<dyn GraphRepository>,
    event_sink: Option<Arc<dyn EventSink>>,
    actor_id: Option<String>,
}

impl Erm {
    pub fn new(schema_repo: Arc<dyn SchemaRepository>, graph_repo: Arc<dyn GraphRepository>) -> Self {
        Self {
            schema_repo,
            graph_repo,
            event_sink: None,
            actor_id: None,
        }
    }

    /// Emit events to `sink` after successful mutations
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = Some(sink);
        self
    }

    /// Attribute emitted events to `actor_id`
    pub fn with_actor(mut self, actor_id: impl Into<String>) -> Self {
        self.actor_id = Some(actor_id.into());
        self
    }

    pub fn schemas(&self) -> SchemaService<'_> {
        SchemaService::new(self)
    }

    pub fn entities(&self) -> EntityService<'_> {
        EntityService::new(self)
    }

    pub fn edges(&self) -> EdgeService<'_> {
        EdgeService::new(self)
    }

    pub fn bulk(&self) -> BulkService<'_> {
        BulkService::new(self)
    }

    pub fn queries(&self) -> QueryService<'_> {
        QueryService::new(self)
    }

    pub(crate) fn schema_repo(&self) -> &dyn SchemaRepository {
        self.schema_repo.as_ref()
    }

    pub(crate) fn graph_repo(&self) -> &dyn GraphRepository {
        self.graph_repo.as_ref()
    }

    pub(crate) fn meta(&self, workspace: &WorkspaceId) -> EventMeta {
        EventMeta::new(*workspace, self.actor_id.clone())
    }

    pub(crate) fn emit(&self, event: DomainEvent) {
        if let Some(sink) = &self.event_sink {
            tracing::debug!(
                "Emitting {} for {}",
                event.event_type(),
                event.aggregate_id()
            );
            sink.emit(event);
        }
    }

    /// Fetch the workspace schema, renaming absence to `SchemaNotFound`
    pub(crate) async fn require_schema(&self, workspace: &WorkspaceId) -> Result<WorkspaceSchema> {
        self.schema_repo
            .get_schema(workspace)
            .await?
            .ok_or(Error::SchemaNotFound)
    }
}

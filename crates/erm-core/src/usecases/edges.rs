//! Single-edge use cases: create, get, update, soft delete
//!
//! Endpoints are checked by the use case before the write, so callers get
//! `SourceNotFound` or `TargetNotFound`. A repository may still answer
//! `EndpointsNotFound` if an endpoint disappears in between; that error is
//! passed through unchanged.

use super::Erm;
use crate::edge::{Edge, NewEdge};
use crate::error::{Error, Result};
use crate::events::DomainEvent;
use crate::ids::{EdgeId, EntityId, WorkspaceId};
use crate::properties::{self, Properties};
use crate::repository::GetOptions;
use crate::validation::{parse_id, validate_type_name};

pub struct EdgeService<'a> {
    erm: &'a Erm,
}

impl<'a> EdgeService<'a> {
    pub(crate) fn new(erm: &'a Erm) -> Self {
        Self { erm }
    }

    pub async fn create(&self, workspace: &WorkspaceId, input: NewEdge) -> Result<Edge> {
        tracing::debug!("Creating {} edge in workspace {}", input.edge_type, workspace);

        validate_type_name(&input.edge_type)?;
        let source_id: EntityId = parse_id("source_id", &input.source_id)?;
        let target_id: EntityId = parse_id("target_id", &input.target_id)?;

        let schema = self.erm.require_schema(workspace).await?;
        let type_def = schema
            .edge_type(&input.edge_type)
            .ok_or_else(|| Error::TypeNotInSchema(input.edge_type.clone()))?;

        // Property rules run before any endpoint lookup
        properties::validate(&input.properties, &type_def.properties)
            .map_err(Error::PropertyViolations)?;

        let repo = self.erm.graph_repo();
        let opts = GetOptions::default();
        if repo.get_entity(workspace, &source_id, opts).await?.is_none() {
            return Err(Error::SourceNotFound);
        }
        if repo.get_entity(workspace, &target_id, opts).await?.is_none() {
            return Err(Error::TargetNotFound);
        }

        let edge = repo
            .create_edge(
                workspace,
                &input.edge_type,
                &source_id,
                &target_id,
                input.properties,
            )
            .await?;

        self.erm.emit(DomainEvent::EdgeCreated {
            meta: self.erm.meta(workspace),
            aggregate_id: edge.id,
            edge_type: edge.edge_type.clone(),
            source_id: edge.source_id,
            target_id: edge.target_id,
        });

        tracing::info!(
            "Created edge {} ({}: {} -> {})",
            edge.id,
            edge.edge_type,
            edge.source_id,
            edge.target_id
        );
        Ok(edge)
    }

    pub async fn get(&self, workspace: &WorkspaceId, id: &str) -> Result<Edge> {
        let id: EdgeId = parse_id("id", id)?;
        self.erm
            .graph_repo()
            .get_edge(workspace, &id)
            .await?
            .ok_or(Error::NotFound)
    }

    pub async fn update(
        &self,
        workspace: &WorkspaceId,
        id: &str,
        properties: Properties,
    ) -> Result<Edge> {
        let id: EdgeId = parse_id("id", id)?;
        tracing::debug!("Updating edge {} in workspace {}", id, workspace);

        let schema = self.erm.require_schema(workspace).await?;

        let existing = self
            .erm
            .graph_repo()
            .get_edge(workspace, &id)
            .await?
            .ok_or(Error::NotFound)?;

        let type_def = schema
            .edge_type(&existing.edge_type)
            .ok_or_else(|| Error::TypeNotInSchema(existing.edge_type.clone()))?;

        properties::validate(&properties, &type_def.properties)
            .map_err(Error::PropertyViolations)?;

        let edge = self
            .erm
            .graph_repo()
            .update_edge(workspace, &id, properties.clone())
            .await?;

        self.erm.emit(DomainEvent::EdgeUpdated {
            meta: self.erm.meta(workspace),
            aggregate_id: edge.id,
            changes: properties,
        });

        tracing::info!("Updated edge {}", edge.id);
        Ok(edge)
    }

    pub async fn delete(&self, workspace: &WorkspaceId, id: &str) -> Result<Edge> {
        let id: EdgeId = parse_id("id", id)?;

        let edge = self.erm.graph_repo().soft_delete_edge(workspace, &id).await?;

        self.erm.emit(DomainEvent::EdgeDeleted {
            meta: self.erm.meta(workspace),
            aggregate_id: edge.id,
        });

        tracing::info!("Deleted edge {}", edge.id);
        Ok(edge)
    }
}

//! Single-entity use cases: create, get, update, soft delete

use super::Erm;
use crate::entity::{Entity, NewEntity};
use crate::error::{Error, Result};
use crate::events::DomainEvent;
use crate::ids::{EntityId, WorkspaceId};
use crate::properties::{self, Properties};
use crate::repository::GetOptions;
use crate::validation::{parse_id, validate_type_name};

pub struct EntityService<'a> {
    erm: &'a Erm,
}

impl<'a> EntityService<'a> {
    pub(crate) fn new(erm: &'a Erm) -> Self {
        Self { erm }
    }

    /// Create an entity of a schema-declared type
    pub async fn create(&self, workspace: &WorkspaceId, input: NewEntity) -> Result<Entity> {
        tracing::debug!("Creating {} entity in workspace {}", input.entity_type, workspace);

        validate_type_name(&input.entity_type)?;

        let schema = self.erm.require_schema(workspace).await?;
        let type_def = schema
            .entity_type(&input.entity_type)
            .ok_or_else(|| Error::TypeNotInSchema(input.entity_type.clone()))?;

        properties::validate(&input.properties, &type_def.properties)
            .map_err(Error::PropertyViolations)?;

        let entity = self
            .erm
            .graph_repo()
            .create_entity(workspace, &input.entity_type, input.properties)
            .await?;

        self.erm.emit(DomainEvent::EntityCreated {
            meta: self.erm.meta(workspace),
            aggregate_id: entity.id,
            entity_type: entity.entity_type.clone(),
            properties: entity.properties.clone(),
        });

        tracing::info!("Created entity {} ({})", entity.id, entity.entity_type);
        Ok(entity)
    }

    pub async fn get(&self, workspace: &WorkspaceId, id: &str, opts: GetOptions) -> Result<Entity> {
        let id: EntityId = parse_id("id", id)?;
        self.erm
            .graph_repo()
            .get_entity(workspace, &id, opts)
            .await?
            .ok_or(Error::NotFound)
    }

    /// Replace an entity's properties, checked against its (immutable) type
    pub async fn update(
        &self,
        workspace: &WorkspaceId,
        id: &str,
        properties: Properties,
    ) -> Result<Entity> {
        let id: EntityId = parse_id("id", id)?;
        tracing::debug!("Updating entity {} in workspace {}", id, workspace);

        let schema = self.erm.require_schema(workspace).await?;

        let existing = self
            .erm
            .graph_repo()
            .get_entity(workspace, &id, GetOptions::default())
            .await?
            .ok_or(Error::NotFound)?;

        let type_def = schema
            .entity_type(&existing.entity_type)
            .ok_or_else(|| Error::TypeNotInSchema(existing.entity_type.clone()))?;

        properties::validate(&properties, &type_def.properties)
            .map_err(Error::PropertyViolations)?;

        let entity = self
            .erm
            .graph_repo()
            .update_entity(workspace, &id, properties.clone())
            .await?;

        self.erm.emit(DomainEvent::EntityUpdated {
            meta: self.erm.meta(workspace),
            aggregate_id: entity.id,
            changes: properties,
        });

        tracing::info!("Updated entity {}", entity.id);
        Ok(entity)
    }

    /// Soft-delete an entity, returning it with the number of edges
    /// deleted alongside it
    pub async fn delete(&self, workspace: &WorkspaceId, id: &str) -> Result<(Entity, usize)> {
        let id: EntityId = parse_id("id", id)?;

        let (entity, cascaded) = self
            .erm
            .graph_repo()
            .soft_delete_entity(workspace, &id)
            .await?;

        self.erm.emit(DomainEvent::EntityDeleted {
            meta: self.erm.meta(workspace),
            aggregate_id: entity.id,
            cascaded_edge_count: cascaded,
        });

        tracing::info!("Deleted entity {} ({} edges cascaded)", entity.id, cascaded);
        Ok((entity, cascaded))
    }
}

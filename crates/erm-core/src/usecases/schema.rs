//! UpsertSchema and schema reads

use super::Erm;
use crate::error::{Error, Result};
use crate::events::DomainEvent;
use crate::ids::WorkspaceId;
use crate::schema::{SchemaInput, WorkspaceSchema};

pub struct SchemaService<'a> {
    erm: &'a Erm,
}

impl<'a> SchemaService<'a> {
    pub(crate) fn new(erm: &'a Erm) -> Self {
        Self { erm }
    }

    /// Current schema of a workspace
    pub async fn get(&self, workspace: &WorkspaceId) -> Result<WorkspaceSchema> {
        self.erm.require_schema(workspace).await
    }

    /// Validate and store a schema, creating it on first use
    ///
    /// Emits `SchemaCreated` when no schema existed before the call and
    /// `SchemaUpdated` otherwise.
    pub async fn upsert(&self, workspace: &WorkspaceId, input: SchemaInput) -> Result<WorkspaceSchema> {
        tracing::debug!("Upserting schema for workspace {}", workspace);

        let draft = input.into_draft().map_err(Error::SchemaInvalid)?;

        let existed = self.erm.schema_repo().get_schema(workspace).await?.is_some();

        let schema = match self.erm.schema_repo().upsert_schema(workspace, draft).await {
            Ok(schema) => schema,
            Err(Error::VersionConflict) => {
                tracing::warn!("Schema version conflict in workspace {}", workspace);
                return Err(Error::VersionConflict);
            }
            Err(e) => return Err(e),
        };

        let meta = self.erm.meta(workspace);
        let event = if existed {
            DomainEvent::SchemaUpdated {
                meta,
                aggregate_id: schema.id,
                version: schema.version,
            }
        } else {
            DomainEvent::SchemaCreated {
                meta,
                aggregate_id: schema.id,
                version: schema.version,
            }
        };
        self.erm.emit(event);

        tracing::info!(
            "Stored schema v{} for workspace {} ({} entity types, {} edge types)",
            schema.version,
            workspace,
            schema.entity_types.len(),
            schema.edge_types.len()
        );
        Ok(schema)
    }
}

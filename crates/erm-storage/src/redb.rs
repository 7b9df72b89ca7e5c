//! ReDB storage backend

use crate::error::{StorageError, StorageResult};
use crate::traits::StorageBackend;
use async_trait::async_trait;
use erm_core::{Edge, EdgeId, Entity, EntityId, WorkspaceId, WorkspaceSchema};
use redb::{Database, ReadableTable, TableDefinition};
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Mutex;

// Table definitions
const ENTITIES: TableDefinition<&str, &[u8]> = TableDefinition::new("entities");
const EDGES: TableDefinition<&str, &[u8]> = TableDefinition::new("edges");
const SCHEMAS: TableDefinition<&str, &[u8]> = TableDefinition::new("schemas");

/// ReDB storage backend
pub struct RedbStorage {
    db: Mutex<Database>,
}

impl RedbStorage {
    /// Open or create a ReDB database at the given path
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path).map_err(|e| StorageError::Database(e.to_string()))?;

        // Initialize tables
        {
            let write_txn = db
                .begin_write()
                .map_err(|e| StorageError::Database(e.to_string()))?;
            {
                write_txn.open_table(ENTITIES)?;
                write_txn.open_table(EDGES)?;
                write_txn.open_table(SCHEMAS)?;
            }
            write_txn
                .commit()
                .map_err(|e| StorageError::Database(e.to_string()))?;
        }

        Ok(Self { db: Mutex::new(db) })
    }

    fn make_key(workspace: &WorkspaceId, id: impl std::fmt::Display) -> String {
        format!("{}:{}", workspace, id)
    }

    fn get_one<T: DeserializeOwned>(
        &self,
        table_def: TableDefinition<&str, &[u8]>,
        key: &str,
    ) -> StorageResult<Option<T>> {
        let db = self
            .db
            .lock()
            .map_err(|e| StorageError::Lock(e.to_string()))?;
        let read_txn = db
            .begin_read()
            .map_err(|e| StorageError::Database(e.to_string()))?;
        let table = read_txn.open_table(table_def)?;

        if let Some(value) = table.get(key)? {
            Ok(Some(serde_json::from_slice(value.value())?))
        } else {
            Ok(None)
        }
    }

    fn get_prefixed<T: DeserializeOwned>(
        &self,
        table_def: TableDefinition<&str, &[u8]>,
        workspace: &WorkspaceId,
    ) -> StorageResult<Vec<T>> {
        let prefix = format!("{}:", workspace);

        let db = self
            .db
            .lock()
            .map_err(|e| StorageError::Lock(e.to_string()))?;
        let read_txn = db
            .begin_read()
            .map_err(|e| StorageError::Database(e.to_string()))?;
        let table = read_txn.open_table(table_def)?;

        let mut records = Vec::new();
        for entry in table.iter()? {
            let (key, value) = entry?;
            if key.value().starts_with(&prefix) {
                records.push(serde_json::from_slice(value.value())?);
            }
        }

        Ok(records)
    }

    fn put_one(
        &self,
        table_def: TableDefinition<&str, &[u8]>,
        key: &str,
        value: &[u8],
    ) -> StorageResult<()> {
        let db = self
            .db
            .lock()
            .map_err(|e| StorageError::Lock(e.to_string()))?;
        let write_txn = db
            .begin_write()
            .map_err(|e| StorageError::Database(e.to_string()))?;
        {
            let mut table = write_txn.open_table(table_def)?;
            table.insert(key, value)?;
        }
        write_txn.commit()?;

        Ok(())
    }
}

#[async_trait]
impl StorageBackend for RedbStorage {
    async fn initialize(&self) -> StorageResult<()> {
        Ok(())
    }

    async fn health_check(&self) -> StorageResult<bool> {
        let db = self
            .db
            .lock()
            .map_err(|e| StorageError::Lock(e.to_string()))?;
        Ok(db.begin_read().is_ok())
    }

    async fn save_entity(&self, entity: &Entity) -> StorageResult<()> {
        let key = Self::make_key(&entity.workspace_id, entity.id);
        let value = serde_json::to_vec(entity)?;
        self.put_one(ENTITIES, &key, &value)
    }

    async fn get_entity(
        &self,
        workspace: &WorkspaceId,
        id: &EntityId,
    ) -> StorageResult<Option<Entity>> {
        self.get_one(ENTITIES, &Self::make_key(workspace, id))
    }

    async fn get_all_entities(&self, workspace: &WorkspaceId) -> StorageResult<Vec<Entity>> {
        self.get_prefixed(ENTITIES, workspace)
    }

    async fn save_edge(&self, edge: &Edge) -> StorageResult<()> {
        let key = Self::make_key(&edge.workspace_id, edge.id);
        let value = serde_json::to_vec(edge)?;
        self.put_one(EDGES, &key, &value)
    }

    async fn get_edge(&self, workspace: &WorkspaceId, id: &EdgeId) -> StorageResult<Option<Edge>> {
        self.get_one(EDGES, &Self::make_key(workspace, id))
    }

    async fn get_all_edges(&self, workspace: &WorkspaceId) -> StorageResult<Vec<Edge>> {
        self.get_prefixed(EDGES, workspace)
    }

    async fn save_schema(&self, schema: &WorkspaceSchema) -> StorageResult<()> {
        let key = schema.workspace_id.to_string();
        let value = serde_json::to_vec(schema)?;
        self.put_one(SCHEMAS, &key, &value)
    }

    async fn get_schema(&self, workspace: &WorkspaceId) -> StorageResult<Option<WorkspaceSchema>> {
        self.get_one(SCHEMAS, &workspace.to_string())
    }

    async fn save_batch(&self, entities: &[Entity], edges: &[Edge]) -> StorageResult<()> {
        if entities.is_empty() && edges.is_empty() {
            return Ok(());
        }

        let db = self
            .db
            .lock()
            .map_err(|e| StorageError::Lock(e.to_string()))?;
        let write_txn = db
            .begin_write()
            .map_err(|e| StorageError::Database(e.to_string()))?;
        {
            let mut table = write_txn.open_table(ENTITIES)?;
            for entity in entities {
                let key = Self::make_key(&entity.workspace_id, entity.id);
                let value = serde_json::to_vec(entity)?;
                table.insert(key.as_str(), value.as_slice())?;
            }
        }
        {
            let mut table = write_txn.open_table(EDGES)?;
            for edge in edges {
                let key = Self::make_key(&edge.workspace_id, edge.id);
                let value = serde_json::to_vec(edge)?;
                table.insert(key.as_str(), value.as_slice())?;
            }
        }
        write_txn.commit()?;
        tracing::debug!(
            "Batch saved {} entities and {} edges in single transaction",
            entities.len(),
            edges.len()
        );

        Ok(())
    }
}

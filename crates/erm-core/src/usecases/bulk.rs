//! Bulk use cases with atomic and partial modes
//!
//! Batch bounds are checked first, then the schema is fetched once and
//! every item is validated in input order. Atomic mode writes nothing if
//! any item fails; partial mode writes the valid items in one repository
//! call and reports the rest. Item errors always carry the item's index in
//! the submitted list. Bulk operations emit no domain events.

use super::Erm;
use crate::batch::{BatchItemError, BatchMode, BulkOutcome, ItemErrorReason, Triage};
use crate::edge::{Edge, EdgeDraft, NewEdge};
use crate::entity::{Entity, EntityUpdate, EntityUpdateInput, NewEntity};
use crate::error::{Error, Result};
use crate::ids::{EntityId, WorkspaceId};
use crate::properties;
use crate::schema::WorkspaceSchema;
use crate::validation::{parse_id, valid_type_name, validate_batch_size};
use std::collections::HashMap;

pub struct BulkService<'a> {
    erm: &'a Erm,
}

impl<'a> BulkService<'a> {
    pub(crate) fn new(erm: &'a Erm) -> Self {
        Self { erm }
    }

    pub async fn create_entities(
        &self,
        workspace: &WorkspaceId,
        items: Vec<NewEntity>,
        mode: BatchMode,
    ) -> Result<BulkOutcome<Vec<Entity>>> {
        validate_batch_size(items.len())?;
        tracing::debug!("Bulk creating {} entities ({:?})", items.len(), mode);

        let schema = self.erm.require_schema(workspace).await?;

        let mut triage = Triage::default();
        for (index, item) in items.into_iter().enumerate() {
            match check_entity_item(&schema, &item.entity_type, &item.properties, index) {
                Ok(()) => triage.accept(index, item),
                Err(errors) => triage.reject_all(errors),
            }
        }

        let (valid, errors) = finish(triage, mode)?;
        let created = if valid.is_empty() {
            Vec::new()
        } else {
            self.erm
                .graph_repo()
                .bulk_create_entities(workspace, valid)
                .await?
        };

        tracing::info!("Bulk created {} entities ({} rejected)", created.len(), errors.len());
        Ok(outcome(mode, created, errors))
    }

    pub async fn create_edges(
        &self,
        workspace: &WorkspaceId,
        items: Vec<NewEdge>,
        mode: BatchMode,
    ) -> Result<BulkOutcome<Vec<Edge>>> {
        validate_batch_size(items.len())?;
        tracing::debug!("Bulk creating {} edges ({:?})", items.len(), mode);

        let schema = self.erm.require_schema(workspace).await?;

        // Shape, schema and property checks
        let mut candidates: Vec<(usize, EdgeDraft)> = Vec::new();
        let mut triage = Triage::default();
        for (index, item) in items.into_iter().enumerate() {
            match check_edge_item(&schema, item, index) {
                Ok(draft) => candidates.push((index, draft)),
                Err(errors) => triage.reject_all(errors),
            }
        }

        // Endpoint existence, resolved in a single lookup
        let mut endpoint_ids: Vec<EntityId> = candidates
            .iter()
            .flat_map(|(_, d)| [d.source_id, d.target_id])
            .collect();
        endpoint_ids.sort();
        endpoint_ids.dedup();
        let found = self.lookup(workspace, &endpoint_ids).await?;

        for (index, draft) in candidates {
            if !found.contains_key(&draft.source_id) {
                triage.reject(BatchItemError::new(index, ItemErrorReason::SourceNotFound).with_field("source_id"));
            } else if !found.contains_key(&draft.target_id) {
                triage.reject(BatchItemError::new(index, ItemErrorReason::TargetNotFound).with_field("target_id"));
            } else {
                triage.accept(index, draft);
            }
        }

        let (valid, errors) = finish(triage, mode)?;
        let created = if valid.is_empty() {
            Vec::new()
        } else {
            self.erm.graph_repo().bulk_create_edges(workspace, valid).await?
        };

        tracing::info!("Bulk created {} edges ({} rejected)", created.len(), errors.len());
        Ok(outcome(mode, created, errors))
    }

    pub async fn update_entities(
        &self,
        workspace: &WorkspaceId,
        items: Vec<EntityUpdateInput>,
        mode: BatchMode,
    ) -> Result<BulkOutcome<Vec<Entity>>> {
        validate_batch_size(items.len())?;
        tracing::debug!("Bulk updating {} entities ({:?})", items.len(), mode);

        let schema = self.erm.require_schema(workspace).await?;

        let mut triage = Triage::default();
        let mut parsed: Vec<(usize, EntityUpdate)> = Vec::new();
        for (index, item) in items.into_iter().enumerate() {
            match parse_id::<EntityId>("id", &item.id) {
                Ok(id) => parsed.push((
                    index,
                    EntityUpdate {
                        id,
                        properties: item.properties,
                    },
                )),
                Err(_) => triage.reject(
                    BatchItemError::new(index, ItemErrorReason::InvalidUuid).with_field("id"),
                ),
            }
        }

        let ids: Vec<EntityId> = parsed.iter().map(|(_, u)| u.id).collect();
        let existing = self.lookup(workspace, &ids).await?;

        for (index, update) in parsed {
            let Some(entity) = existing.get(&update.id) else {
                triage.reject(BatchItemError::new(index, ItemErrorReason::NotFound).with_field("id"));
                continue;
            };
            match check_entity_item(&schema, &entity.entity_type, &update.properties, index) {
                Ok(()) => triage.accept(index, update),
                Err(errors) => triage.reject_all(errors),
            }
        }

        let (valid, errors) = finish(triage, mode)?;
        let updated = if valid.is_empty() {
            Vec::new()
        } else {
            self.erm
                .graph_repo()
                .bulk_update_entities(workspace, valid)
                .await?
        };

        tracing::info!("Bulk updated {} entities ({} rejected)", updated.len(), errors.len());
        Ok(outcome(mode, updated, errors))
    }

    pub async fn delete_entities(
        &self,
        workspace: &WorkspaceId,
        ids: Vec<String>,
        mode: BatchMode,
    ) -> Result<BulkOutcome<usize>> {
        validate_batch_size(ids.len())?;
        tracing::debug!("Bulk deleting {} entities ({:?})", ids.len(), mode);

        let mut triage = Triage::default();
        let mut parsed: Vec<(usize, EntityId)> = Vec::new();
        for (index, raw) in ids.iter().enumerate() {
            match parse_id::<EntityId>("id", raw) {
                Ok(id) => parsed.push((index, id)),
                Err(_) => triage.reject(
                    BatchItemError::new(index, ItemErrorReason::InvalidUuid).with_field("id"),
                ),
            }
        }

        let lookup_ids: Vec<EntityId> = parsed.iter().map(|(_, id)| *id).collect();
        let existing = self.lookup(workspace, &lookup_ids).await?;

        for (index, id) in parsed {
            if existing.contains_key(&id) {
                triage.accept(index, id);
            } else {
                triage.reject(BatchItemError::new(index, ItemErrorReason::NotFound).with_field("id"));
            }
        }

        let (valid, errors) = finish(triage, mode)?;
        let deleted = if valid.is_empty() {
            0
        } else {
            self.erm
                .graph_repo()
                .bulk_soft_delete_entities(workspace, &valid)
                .await?
        };

        tracing::info!("Bulk deleted {} entities ({} rejected)", deleted, errors.len());
        Ok(outcome(mode, deleted, errors))
    }

    async fn lookup(
        &self,
        workspace: &WorkspaceId,
        ids: &[EntityId],
    ) -> Result<HashMap<EntityId, Entity>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        self.erm.graph_repo().batch_get_entities(workspace, ids).await
    }
}

fn check_entity_item(
    schema: &WorkspaceSchema,
    entity_type: &str,
    props: &properties::Properties,
    index: usize,
) -> std::result::Result<(), Vec<BatchItemError>> {
    if !valid_type_name(entity_type) {
        return Err(vec![
            BatchItemError::new(index, ItemErrorReason::InvalidTypeName).with_field("type")
        ]);
    }
    let Some(type_def) = schema.entity_type(entity_type) else {
        return Err(vec![
            BatchItemError::new(index, ItemErrorReason::TypeNotInSchema).with_field("type")
        ]);
    };
    properties::validate(props, &type_def.properties)
        .map_err(|violations| BatchItemError::from_violations(index, violations))
}

fn check_edge_item(
    schema: &WorkspaceSchema,
    item: NewEdge,
    index: usize,
) -> std::result::Result<EdgeDraft, Vec<BatchItemError>> {
    if !valid_type_name(&item.edge_type) {
        return Err(vec![
            BatchItemError::new(index, ItemErrorReason::InvalidTypeName).with_field("type")
        ]);
    }
    let Some(type_def) = schema.edge_type(&item.edge_type) else {
        return Err(vec![
            BatchItemError::new(index, ItemErrorReason::TypeNotInSchema).with_field("type")
        ]);
    };

    let mut errors = Vec::new();
    let source_id = parse_id::<EntityId>("source_id", &item.source_id).map_err(|_| {
        errors.push(BatchItemError::new(index, ItemErrorReason::InvalidUuid).with_field("source_id"))
    });
    let target_id = parse_id::<EntityId>("target_id", &item.target_id).map_err(|_| {
        errors.push(BatchItemError::new(index, ItemErrorReason::InvalidUuid).with_field("target_id"))
    });
    if let Err(violations) = properties::validate(&item.properties, &type_def.properties) {
        errors.extend(BatchItemError::from_violations(index, violations));
    }

    match (source_id, target_id) {
        (Ok(source_id), Ok(target_id)) if errors.is_empty() => Ok(EdgeDraft {
            edge_type: item.edge_type,
            source_id,
            target_id,
            properties: item.properties,
        }),
        _ => Err(errors),
    }
}

/// Apply the mode: atomic fails on any error, partial keeps going
fn finish<T>(mut triage: Triage<T>, mode: BatchMode) -> Result<(Vec<T>, Vec<BatchItemError>)> {
    triage.valid.sort_by_key(|(index, _)| *index);
    triage.errors.sort_by_key(|e| e.index);

    if mode == BatchMode::Atomic && !triage.errors.is_empty() {
        tracing::warn!(
            "Rejecting atomic batch: {} invalid item(s)",
            triage.errors.len()
        );
        return Err(Error::BatchValidation(triage.errors));
    }
    Ok(triage.into_items())
}

fn outcome<T>(mode: BatchMode, results: T, errors: Vec<BatchItemError>) -> BulkOutcome<T> {
    match mode {
        BatchMode::Atomic => BulkOutcome::Atomic { results },
        BatchMode::Partial => BulkOutcome::Partial { results, errors },
    }
}

#[cfg(test)]
mod tests {
    use crate::batch::{BatchMode, BulkOutcome, ItemErrorReason};
    use crate::edge::NewEdge;
    use crate::entity::{EntityUpdateInput, NewEntity};
    use crate::error::Error;
    use crate::ids::{EntityId, WorkspaceId};
    use crate::properties::Constraint;
    use crate::usecases::testing::{props, Harness};
    use serde_json::json;

    fn person(name: &str) -> NewEntity {
        NewEntity::new("Person").with_property("name", json!(name))
    }

    fn mixed_batch() -> Vec<NewEntity> {
        vec![
            person("Ada"),
            NewEntity::new("Person"),
            person("Grace"),
            NewEntity::new("123bad"),
            NewEntity::new("Robot"),
            person("Alan"),
        ]
    }

    #[tokio::test]
    async fn test_batch_bounds() {
        let ws = WorkspaceId::new();
        let h = Harness::with_schema(&ws);
        let bulk = h.erm.bulk();

        let err = bulk.create_entities(&ws, vec![], BatchMode::Atomic).await.unwrap_err();
        assert_eq!(err, Error::EmptyBatch);

        let too_many = (0..1001).map(|i| person(&format!("P{}", i))).collect();
        let err = bulk.create_entities(&ws, too_many, BatchMode::Atomic).await.unwrap_err();
        assert_eq!(err, Error::BatchTooLarge { count: 1001, max: 1000 });
        assert!(h.repo.calls().is_empty());

        let exactly = (0..1000).map(|i| person(&format!("P{}", i))).collect();
        let outcome = bulk.create_entities(&ws, exactly, BatchMode::Atomic).await.unwrap();
        assert_eq!(outcome.results().len(), 1000);
    }

    #[tokio::test]
    async fn test_atomic_rejects_whole_batch() {
        let ws = WorkspaceId::new();
        let h = Harness::with_schema(&ws);

        let err = h
            .erm
            .bulk()
            .create_entities(&ws, mixed_batch(), BatchMode::Atomic)
            .await
            .unwrap_err();

        let Error::BatchValidation(errors) = err else {
            panic!("expected batch validation errors");
        };
        let indices: Vec<usize> = errors.iter().map(|e| e.index).collect();
        assert_eq!(indices, vec![1, 3, 4]);
        assert_eq!(errors[0].field.as_deref(), Some("name"));
        assert!(matches!(
            errors[0].reason,
            ItemErrorReason::Property { constraint: Constraint::Required, .. }
        ));
        assert_eq!(errors[1].reason, ItemErrorReason::InvalidTypeName);
        assert_eq!(errors[2].reason, ItemErrorReason::TypeNotInSchema);

        assert!(!h.repo.called("bulk_create_entities"));
        assert_eq!(h.repo.entity_count(&ws), 0);
    }

    #[tokio::test]
    async fn test_partial_writes_valid_items() {
        let ws = WorkspaceId::new();
        let h = Harness::with_schema(&ws);

        let outcome = h
            .erm
            .bulk()
            .create_entities(&ws, mixed_batch(), BatchMode::Partial)
            .await
            .unwrap();

        let BulkOutcome::Partial { results, errors } = outcome else {
            panic!("expected partial outcome");
        };
        assert_eq!(results.len(), 3);
        assert_eq!(errors.len(), 3);
        assert_eq!(errors.iter().map(|e| e.index).collect::<Vec<_>>(), vec![1, 3, 4]);
        assert_eq!(h.repo.entity_count(&ws), 3);
        assert!(h.events.is_empty());
    }

    #[tokio::test]
    async fn test_partial_all_invalid_is_not_an_error() {
        let ws = WorkspaceId::new();
        let h = Harness::with_schema(&ws);

        let outcome = h
            .erm
            .bulk()
            .create_entities(&ws, vec![NewEntity::new("Robot"), NewEntity::new("9lives")], BatchMode::Partial)
            .await
            .unwrap();

        assert!(outcome.results().is_empty());
        assert_eq!(outcome.errors().len(), 2);
        assert!(!h.repo.called("bulk_create_entities"));
    }

    #[tokio::test]
    async fn test_bulk_schema_fetched_once() {
        let ws = WorkspaceId::new();
        let h = Harness::new();

        let err = h
            .erm
            .bulk()
            .create_entities(&ws, vec![person("Ada")], BatchMode::Atomic)
            .await
            .unwrap_err();
        assert_eq!(err, Error::SchemaNotFound);

        let h = Harness::with_schema(&ws);
        h.erm
            .bulk()
            .create_entities(&ws, vec![person("Ada"), person("Grace")], BatchMode::Atomic)
            .await
            .unwrap();
        assert_eq!(h.repo.calls(), vec!["get_schema", "bulk_create_entities"]);
    }

    #[tokio::test]
    async fn test_bulk_create_edges_checks_endpoints() {
        let ws = WorkspaceId::new();
        let h = Harness::with_schema(&ws);
        let ada = h.repo.seed_entity(&ws, "Person", props(json!({"name": "Ada"})));
        let acme = h.repo.seed_entity(&ws, "Company", props(json!({"name": "Acme"})));
        let ghost = EntityId::new();

        let items = vec![
            NewEdge::new("WORKS_AT", ada.id, acme.id),
            NewEdge::new("WORKS_AT", ghost, acme.id),
            NewEdge::new("WORKS_AT", ada.id, ghost),
            NewEdge::new("WORKS_AT", ada.id, acme.id).with_property("role", json!(1)),
            NewEdge::new("KNOWS", "bad", ada.id),
        ];

        let outcome = h
            .erm
            .bulk()
            .create_edges(&ws, items, BatchMode::Partial)
            .await
            .unwrap();

        assert_eq!(outcome.results().len(), 1);
        let reasons: Vec<_> = outcome.errors().iter().map(|e| (e.index, e.reason.clone())).collect();
        assert_eq!(reasons[0], (1, ItemErrorReason::SourceNotFound));
        assert_eq!(reasons[1], (2, ItemErrorReason::TargetNotFound));
        assert_eq!(reasons[2].0, 3);
        assert_eq!(reasons[3], (4, ItemErrorReason::InvalidUuid));
        assert_eq!(
            h.repo.calls().iter().filter(|c| **c == "batch_get_entities").count(),
            1
        );
    }

    #[tokio::test]
    async fn test_bulk_update_resolves_ids() {
        let ws = WorkspaceId::new();
        let h = Harness::with_schema(&ws);
        let ada = h.repo.seed_entity(&ws, "Person", props(json!({"name": "Ada"})));
        let acme = h.repo.seed_entity(&ws, "Company", props(json!({"name": "Acme"})));

        let items = vec![
            EntityUpdateInput::new(ada.id.to_string(), props(json!({"name": "Ada L."}))),
            EntityUpdateInput::new(EntityId::new().to_string(), props(json!({"name": "?"}))),
            EntityUpdateInput::new(acme.id.to_string(), props(json!({"name": 5}))),
            EntityUpdateInput::new("zzz", props(json!({}))),
        ];

        let err = h
            .erm
            .bulk()
            .update_entities(&ws, items.clone(), BatchMode::Atomic)
            .await
            .unwrap_err();
        let Error::BatchValidation(errors) = err else {
            panic!("expected batch validation errors");
        };
        assert_eq!(errors.iter().map(|e| e.index).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(errors[0].reason, ItemErrorReason::NotFound);
        assert!(!h.repo.called("bulk_update_entities"));

        let outcome = h
            .erm
            .bulk()
            .update_entities(&ws, items, BatchMode::Partial)
            .await
            .unwrap();
        assert_eq!(outcome.results().len(), 1);
        assert_eq!(outcome.results()[0].properties["name"], json!("Ada L."));
        assert_eq!(outcome.errors().len(), 3);
    }

    #[tokio::test]
    async fn test_bulk_delete_counts() {
        let ws = WorkspaceId::new();
        let h = Harness::with_schema(&ws);
        let a = h.repo.seed_entity(&ws, "Person", props(json!({"name": "A"})));
        let b = h.repo.seed_entity(&ws, "Person", props(json!({"name": "B"})));

        let outcome = h
            .erm
            .bulk()
            .delete_entities(
                &ws,
                vec![a.id.to_string(), "nope".into(), EntityId::new().to_string(), b.id.to_string()],
                BatchMode::Partial,
            )
            .await
            .unwrap();

        let BulkOutcome::Partial { results, errors } = outcome else {
            panic!("expected partial outcome");
        };
        assert_eq!(results, 2);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].index, 1);
        assert_eq!(errors[0].reason, ItemErrorReason::InvalidUuid);
        assert_eq!(errors[1].index, 2);
        assert_eq!(errors[1].reason, ItemErrorReason::NotFound);
        assert_eq!(h.repo.entity_count(&ws), 0);
    }

    #[tokio::test]
    async fn test_bulk_delete_atomic_returns_count() {
        let ws = WorkspaceId::new();
        let h = Harness::with_schema(&ws);
        let a = h.repo.seed_entity(&ws, "Person", props(json!({"name": "A"})));

        let outcome = h
            .erm
            .bulk()
            .delete_entities(&ws, vec![a.id.to_string()], BatchMode::default())
            .await
            .unwrap();
        assert_eq!(outcome, BulkOutcome::Atomic { results: 1 });
    }
}

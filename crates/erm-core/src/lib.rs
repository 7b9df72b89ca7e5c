//! ERM Core - Workspace-scoped entity/relationship model
//!
//! This crate provides the domain types, validation rules, repository
//! contracts and use cases of the ERM. Storage lives in `erm-storage`;
//! everything here talks to it through [`SchemaRepository`] and
//! [`GraphRepository`].

pub mod batch;
pub mod edge;
pub mod entity;
pub mod error;
pub mod events;
pub mod ids;
pub mod properties;
pub mod repository;
pub mod schema;
pub mod traversal;
pub mod usecases;
pub mod validation;

pub use batch::{BatchItemError, BatchMode, BulkOutcome, ItemErrorReason};
pub use edge::{Direction, Edge, EdgeDraft, NewEdge};
pub use entity::{Entity, EntityUpdate, EntityUpdateInput, NewEntity};
pub use error::{Error, Result};
pub use events::{BroadcastEventBus, DomainEvent, EventMeta, EventRecorder, EventSink, NullEventSink};
pub use ids::{EdgeId, EntityId, SchemaId, WorkspaceId};
pub use properties::{Constraint, Properties, PropertyDef, PropertyType, PropertyViolation};
pub use repository::{
    GetOptions, GraphRepository, ListFilters, NeighborOptions, PathOptions, SchemaRepository,
    TraversalOptions,
};
pub use schema::{
    EdgeTypeDef, EntityTypeDef, PropertyInput, SchemaDraft, SchemaInput, TypeInput, WorkspaceSchema,
};
pub use traversal::{TraversalEngine, TraversalStats};
pub use usecases::{
    BulkService, EdgeService, EntityService, Erm, ListParams, NeighborParams, PathParams,
    QueryService, SchemaService, TraverseParams,
};

//! Domain events and event sinks
//!
//! Use cases emit one event after each successful single-item mutation.
//! Sinks are injected; nothing here is global.

use crate::ids::{EdgeId, EntityId, SchemaId, WorkspaceId};
use crate::properties::Properties;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Mutex;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Metadata shared by every event
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventMeta {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub workspace_id: WorkspaceId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<String>,
}

impl EventMeta {
    pub fn new(workspace_id: WorkspaceId, actor_id: Option<String>) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            workspace_id,
            actor_id,
        }
    }
}

/// Events emitted by the use cases
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event_type")]
pub enum DomainEvent {
    #[serde(rename = "entity.created")]
    EntityCreated {
        #[serde(flatten)]
        meta: EventMeta,
        aggregate_id: EntityId,
        entity_type: String,
        properties: Properties,
    },
    #[serde(rename = "entity.updated")]
    EntityUpdated {
        #[serde(flatten)]
        meta: EventMeta,
        aggregate_id: EntityId,
        /// The submitted property map, not a diff
        changes: Properties,
    },
    #[serde(rename = "entity.deleted")]
    EntityDeleted {
        #[serde(flatten)]
        meta: EventMeta,
        aggregate_id: EntityId,
        cascaded_edge_count: usize,
    },
    #[serde(rename = "edge.created")]
    EdgeCreated {
        #[serde(flatten)]
        meta: EventMeta,
        aggregate_id: EdgeId,
        edge_type: String,
        source_id: EntityId,
        target_id: EntityId,
    },
    #[serde(rename = "edge.updated")]
    EdgeUpdated {
        #[serde(flatten)]
        meta: EventMeta,
        aggregate_id: EdgeId,
        changes: Properties,
    },
    #[serde(rename = "edge.deleted")]
    EdgeDeleted {
        #[serde(flatten)]
        meta: EventMeta,
        aggregate_id: EdgeId,
    },
    #[serde(rename = "schema.created")]
    SchemaCreated {
        #[serde(flatten)]
        meta: EventMeta,
        aggregate_id: SchemaId,
        version: u64,
    },
    #[serde(rename = "schema.updated")]
    SchemaUpdated {
        #[serde(flatten)]
        meta: EventMeta,
        aggregate_id: SchemaId,
        version: u64,
    },
}

impl DomainEvent {
    pub fn meta(&self) -> &EventMeta {
        match self {
            Self::EntityCreated { meta, .. }
            | Self::EntityUpdated { meta, .. }
            | Self::EntityDeleted { meta, .. }
            | Self::EdgeCreated { meta, .. }
            | Self::EdgeUpdated { meta, .. }
            | Self::EdgeDeleted { meta, .. }
            | Self::SchemaCreated { meta, .. }
            | Self::SchemaUpdated { meta, .. } => meta,
        }
    }

    pub fn workspace_id(&self) -> WorkspaceId {
        self.meta().workspace_id
    }

    /// Id of the record the event is about
    pub fn aggregate_id(&self) -> Uuid {
        match self {
            Self::EntityCreated { aggregate_id, .. }
            | Self::EntityUpdated { aggregate_id, .. }
            | Self::EntityDeleted { aggregate_id, .. } => aggregate_id.0,
            Self::EdgeCreated { aggregate_id, .. }
            | Self::EdgeUpdated { aggregate_id, .. }
            | Self::EdgeDeleted { aggregate_id, .. } => aggregate_id.0,
            Self::SchemaCreated { aggregate_id, .. } | Self::SchemaUpdated { aggregate_id, .. } => {
                aggregate_id.0
            }
        }
    }

    /// Dot-namespaced name, e.g. `"entity.created"`
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::EntityCreated { .. } => "entity.created",
            Self::EntityUpdated { .. } => "entity.updated",
            Self::EntityDeleted { .. } => "entity.deleted",
            Self::EdgeCreated { .. } => "edge.created",
            Self::EdgeUpdated { .. } => "edge.updated",
            Self::EdgeDeleted { .. } => "edge.deleted",
            Self::SchemaCreated { .. } => "schema.created",
            Self::SchemaUpdated { .. } => "schema.updated",
        }
    }
}

/// Destination for domain events
pub trait EventSink: Send + Sync {
    fn emit(&self, event: DomainEvent);
}

/// Discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn emit(&self, _event: DomainEvent) {}
}

/// Records events in memory, in emission order
///
/// Construct one per test and inspect it afterwards.
#[derive(Debug, Default)]
pub struct EventRecorder {
    events: Mutex<Vec<DomainEvent>>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DomainEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.events.lock().map(|events| events.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }
}

impl EventSink for EventRecorder {
    fn emit(&self, event: DomainEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(e) => tracing::error!("Event recorder lock poisoned: {}", e),
        }
    }
}

/// Fans events out to in-process subscribers over a broadcast channel
pub struct BroadcastEventBus {
    tx: broadcast::Sender<DomainEvent>,
}

impl BroadcastEventBus {
    /// A zero `capacity` is raised to one
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for BroadcastEventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

impl EventSink for BroadcastEventBus {
    fn emit(&self, event: DomainEvent) {
        let event_type = event.event_type();
        // No subscribers is not an error
        if self.tx.send(event).is_err() {
            tracing::trace!("Dropped {} event: no subscribers", event_type);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deleted_event(ws: WorkspaceId) -> DomainEvent {
        DomainEvent::EdgeDeleted {
            meta: EventMeta::new(ws, None),
            aggregate_id: EdgeId::new(),
        }
    }

    #[test]
    fn test_recorder_keeps_order() {
        let ws = WorkspaceId::new();
        let recorder = EventRecorder::new();
        assert!(recorder.is_empty());

        let first = deleted_event(ws);
        let second = deleted_event(ws);
        recorder.emit(first.clone());
        recorder.emit(second.clone());

        assert_eq!(recorder.events(), vec![first, second]);
        recorder.clear();
        assert!(recorder.is_empty());
    }

    #[test]
    fn test_event_serialization() {
        let ws = WorkspaceId::new();
        let event = DomainEvent::SchemaCreated {
            meta: EventMeta::new(ws, Some("user-1".into())),
            aggregate_id: SchemaId::new(),
            version: 1,
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event_type"], "schema.created");
        assert_eq!(value["workspace_id"], ws.to_string());
        assert_eq!(value["actor_id"], "user-1");
        assert_eq!(value["version"], 1);
        assert_eq!(event.event_type(), "schema.created");
    }

    #[tokio::test]
    async fn test_broadcast_bus_delivers() {
        let bus = BroadcastEventBus::new(8);
        let mut rx = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);

        let event = deleted_event(WorkspaceId::new());
        bus.emit(event.clone());
        assert_eq!(rx.recv().await.unwrap(), event);
    }

    #[test]
    fn test_broadcast_without_subscribers() {
        let bus = BroadcastEventBus::default();
        bus.emit(deleted_event(WorkspaceId::new()));
    }

    #[tokio::test]
    async fn test_broadcast_bus_zero_capacity() {
        let bus = BroadcastEventBus::new(0);
        let mut rx = bus.subscribe();

        let event = deleted_event(WorkspaceId::new());
        bus.emit(event.clone());
        assert_eq!(rx.recv().await.unwrap(), event);
    }
}

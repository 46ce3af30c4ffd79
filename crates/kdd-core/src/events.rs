//! Domain events and the in-memory publish/subscribe bus that dispatches them.

use std::any::{Any, TypeId};
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::model::{KDDKind, KDDLayer, RetrievalStrategy};

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentDetected {
    pub source_path: String,
    pub source_hash: String,
    pub kind: KDDKind,
    pub layer: KDDLayer,
    pub detected_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentParsed {
    pub document_id: String,
    pub source_path: String,
    pub kind: KDDKind,
    pub front_matter: HashMap<String, Value>,
    pub section_count: usize,
    pub wiki_link_count: usize,
    pub parsed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentIndexed {
    pub document_id: String,
    pub source_path: String,
    pub kind: KDDKind,
    pub node_id: String,
    pub edge_count: usize,
    pub embedding_count: usize,
    pub index_level: String,
    pub duration_ms: u64,
    pub indexed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentStale {
    pub document_id: String,
    pub source_path: String,
    pub previous_hash: String,
    pub current_hash: String,
    pub detected_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentDeleted {
    pub document_id: String,
    pub source_path: String,
    pub node_id: String,
    pub edge_count: usize,
    pub embedding_count: usize,
    pub deleted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergeRequested {
    pub merge_id: Uuid,
    pub source_manifests: Vec<String>,
    pub developer_ids: Vec<String>,
    pub target_version: String,
    pub requested_at: DateTime<Utc>,
    pub requested_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergeCompleted {
    pub merge_id: Uuid,
    pub merged_manifest_id: String,
    pub source_count: usize,
    pub total_nodes: usize,
    pub total_edges: usize,
    pub total_embeddings: usize,
    pub conflicts_resolved: usize,
    pub duration_ms: u64,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryReceived {
    pub query_id: Uuid,
    pub strategy: RetrievalStrategy,
    pub query_text: Option<String>,
    pub root_node: Option<String>,
    pub caller: Option<String>,
    pub received_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryCompleted {
    pub query_id: Uuid,
    pub strategy: RetrievalStrategy,
    pub total_results: usize,
    pub top_score: Option<f32>,
    pub total_tokens: Option<usize>,
    pub duration_ms: u64,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryFailed {
    pub query_id: Uuid,
    pub strategy: RetrievalStrategy,
    pub error_code: String,
    pub error_message: String,
    pub phase: String,
    pub duration_ms: u64,
    pub failed_at: DateTime<Utc>,
}

/// A handler subscribed to one event type.
type Handler<E> = Box<dyn Fn(&E) + Send + Sync>;

/// One type-erased handler list per subscribed event type. Stored as `dyn Any`
/// so a single map can hold `Vec<Handler<E>>` for arbitrarily many distinct
/// event types `E`; `publish`/`subscribe` downcast back to the concrete
/// `Vec<Handler<E>>` using the map key as the type witness.
type HandlerList<E> = Vec<Handler<E>>;

/// A typed in-memory publish/subscribe bus. `publish` dispatches synchronously
/// to every handler registered for that event's concrete type, in registration
/// order; missing handlers are a no-op.
#[derive(Default)]
pub struct InMemoryEventBus {
    handlers: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl InMemoryEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<E: 'static>(&mut self, handler: impl Fn(&E) + Send + Sync + 'static) {
        let list = self
            .handlers
            .entry(TypeId::of::<E>())
            .or_insert_with(|| Box::new(HandlerList::<E>::new()))
            .downcast_mut::<HandlerList<E>>()
            .expect("handler list type mismatch for TypeId");
        list.push(Box::new(handler));
    }

    pub fn publish<E: 'static>(&self, event: &E) {
        let Some(list) = self.handlers.get(&TypeId::of::<E>()) else {
            return;
        };
        let Some(handlers) = list.downcast_ref::<HandlerList<E>>() else {
            return;
        };
        for handler in handlers {
            handler(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn publish_dispatches_in_registration_order() {
        let mut bus = InMemoryEventBus::new();
        let calls = Arc::new(Mutex::new(Vec::new()));

        let c1 = Arc::clone(&calls);
        bus.subscribe::<DocumentDetected>(move |_| c1.lock().unwrap().push(1));
        let c2 = Arc::clone(&calls);
        bus.subscribe::<DocumentDetected>(move |_| c2.lock().unwrap().push(2));

        bus.publish(&DocumentDetected {
            source_path: "x.md".into(),
            source_hash: "h".into(),
            kind: KDDKind::Entity,
            layer: KDDLayer::Domain,
            detected_at: Utc::now(),
        });

        assert_eq!(*calls.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn publish_with_no_handlers_is_a_no_op() {
        let bus = InMemoryEventBus::new();
        bus.publish(&DocumentDetected {
            source_path: "x.md".into(),
            source_hash: "h".into(),
            kind: KDDKind::Entity,
            layer: KDDLayer::Domain,
            detected_at: Utc::now(),
        });
    }
}

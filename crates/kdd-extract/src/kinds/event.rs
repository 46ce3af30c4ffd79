//! `kind: event` — indexed fields: description, payload, producer,
//! consumers. Edges: WIKI_LINK only. Never produces embeddings
//! (`embeddable_sections(Event)` is the empty set).

use std::collections::HashMap;

use kdd_core::{Document, GraphEdge, GraphNode, KDDKind};
use serde_json::json;

use crate::extractor::{Extractor, build_wiki_link_edges, common_node, deduplicate_edges, find_section, make_node_id, parse_table_rows};

pub struct EventExtractor;

impl Extractor for EventExtractor {
    fn kind(&self) -> KDDKind {
        KDDKind::Event
    }

    fn extract_node(&self, document: &Document) -> GraphNode {
        let mut fields = HashMap::new();

        if let Some(s) = find_section(&document.sections, &["Descripción", "Description"]) {
            fields.insert("description".to_string(), json!(s.content));
        }
        if let Some(s) = find_section(&document.sections, &["Payload"]) {
            fields.insert("payload".to_string(), json!(parse_table_rows(&s.content)));
        }
        if let Some(s) = find_section(&document.sections, &["Productor", "Producer"]) {
            fields.insert("producer".to_string(), json!(s.content));
        }
        if let Some(s) = find_section(&document.sections, &["Consumidores", "Consumers"]) {
            fields.insert("consumers".to_string(), json!(s.content));
        }

        common_node(KDDKind::Event, document, fields)
    }

    fn extract_edges(&self, document: &Document) -> Vec<GraphEdge> {
        let node_id = make_node_id(KDDKind::Event, &document.id);
        deduplicate_edges(build_wiki_link_edges(document, &node_id, document.layer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kdd_core::{KDDLayer, compute_content_hash, embeddable_sections, parse_markdown_sections};

    #[test]
    fn event_kind_has_no_embeddable_sections() {
        assert!(embeddable_sections(KDDKind::Event).is_empty());
    }

    #[test]
    fn extracts_producer_and_consumers() {
        let body = "## Productor\n\nOrderService\n\n## Consumidores\n\nBillingService, ShippingService\n";
        let document = Document {
            id: "EVT-ORDER-PLACED".into(),
            kind: KDDKind::Event,
            source_path: "specs/01-domain/events/OrderPlaced.md".into(),
            source_hash: compute_content_hash(body),
            layer: KDDLayer::Domain,
            front_matter: HashMap::new(),
            sections: parse_markdown_sections(body),
            wiki_links: Vec::new(),
            status: Default::default(),
            indexed_at: None,
            domain: None,
        };
        let node = EventExtractor.extract_node(&document);
        assert_eq!(node.id, "Event:EVT-ORDER-PLACED");
        assert_eq!(node.indexed_fields["producer"], json!("OrderService"));
    }
}

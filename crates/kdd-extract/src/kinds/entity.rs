//! `kind: entity` — indexed fields: description, attributes, relations,
//! invariants, state_machine. Edges: DOMAIN_RELATION, EMITS, WIKI_LINK.

use std::collections::HashMap;

use kdd_core::{Document, EdgeType, ExtractionMethod, GraphEdge, GraphNode, KDDKind, StructuralEdgeType, extract_wiki_links};
use serde_json::json;

use crate::extractor::{
    Extractor, build_wiki_link_edges, common_node, deduplicate_edges, find_section,
    make_node_id, parse_list_items, parse_table_rows, resolve_wiki_link_to_node_id,
};

pub struct EntityExtractor;

impl Extractor for EntityExtractor {
    fn kind(&self) -> KDDKind {
        KDDKind::Entity
    }

    fn extract_node(&self, document: &Document) -> GraphNode {
        let mut fields = HashMap::new();

        if let Some(s) = find_section(&document.sections, &["Descripción", "Description"]) {
            fields.insert("description".to_string(), json!(s.content));
        }
        if let Some(s) = find_section(&document.sections, &["Atributos", "Attributes"]) {
            fields.insert("attributes".to_string(), json!(parse_table_rows(&s.content)));
        }
        if let Some(s) = find_section(&document.sections, &["Relaciones", "Relations", "Relationships"]) {
            fields.insert("relations".to_string(), json!(parse_table_rows(&s.content)));
        }
        if let Some(s) = find_section(&document.sections, &["Invariantes", "Invariants", "Constraints"]) {
            fields.insert("invariants".to_string(), json!(parse_list_items(&s.content)));
        }
        if let Some(s) = find_section(&document.sections, &["Ciclo de Vida", "Lifecycle", "State Machine"]) {
            fields.insert("state_machine".to_string(), json!(s.content));
        }

        common_node(KDDKind::Entity, document, fields)
    }

    fn extract_edges(&self, document: &Document) -> Vec<GraphEdge> {
        let node_id = make_node_id(KDDKind::Entity, &document.id);
        let mut edges = build_wiki_link_edges(document, &node_id, document.layer);

        if let Some(section) = find_section(&document.sections, &["Relaciones", "Relations", "Relationships"]) {
            for row in parse_table_rows(&section.content) {
                let target = row.values().find_map(|v| extract_wiki_links(v).into_iter().next());
                let Some(link) = target else { continue };
                let to_node = resolve_wiki_link_to_node_id(&link);
                let relation = row.values().next().cloned().unwrap_or_default();
                let cardinality = row
                    .get("Cardinalidad")
                    .or_else(|| row.get("Cardinality"))
                    .cloned()
                    .unwrap_or_default();

                edges.push(GraphEdge {
                    from_node: node_id.clone(),
                    to_node,
                    edge_type: EdgeType::Structural(StructuralEdgeType::DomainRelation),
                    source_file: document.source_path.clone(),
                    extraction_method: ExtractionMethod::SectionContent,
                    metadata: HashMap::from([
                        ("relation".to_string(), json!(relation)),
                        ("cardinality".to_string(), json!(cardinality)),
                    ]),
                    layer_violation: false,
                    bidirectional: false,
                });
            }
        }

        for section in &document.sections {
            let heading_lower = section.heading.to_lowercase();
            if heading_lower == "eventos del ciclo de vida" || heading_lower == "lifecycle events" {
                for link in extract_wiki_links(&section.content) {
                    if link.target.starts_with("EVT-") {
                        edges.push(GraphEdge {
                            from_node: node_id.clone(),
                            to_node: resolve_wiki_link_to_node_id(&link),
                            edge_type: EdgeType::Structural(StructuralEdgeType::Emits),
                            source_file: document.source_path.clone(),
                            extraction_method: ExtractionMethod::WikiLink,
                            metadata: HashMap::new(),
                            layer_violation: false,
                            bidirectional: false,
                        });
                    }
                }
            }
        }

        deduplicate_edges(edges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kdd_core::{KDDLayer, parse_markdown_sections, compute_content_hash};

    fn doc(body: &str) -> Document {
        Document {
            id: "Order".into(),
            kind: KDDKind::Entity,
            source_path: "specs/01-domain/entities/Order.md".into(),
            source_hash: compute_content_hash(body),
            layer: KDDLayer::Domain,
            front_matter: HashMap::new(),
            sections: parse_markdown_sections(body),
            wiki_links: Vec::new(),
            status: Default::default(),
            indexed_at: None,
            domain: None,
        }
    }

    #[test]
    fn extracts_description_and_attributes() {
        let body = "## Descripción\n\nAn order entity.\n\n## Atributos\n\n| Name | Type | Notes |\n|---|---|---|\n| id | uuid | primary key |\n";
        let node = EntityExtractor.extract_node(&doc(body));
        assert_eq!(node.id, "Entity:Order");
        assert_eq!(node.indexed_fields["description"], json!("An order entity."));
        let attrs = node.indexed_fields["attributes"].as_array().unwrap();
        assert_eq!(attrs.len(), 1);
    }

    #[test]
    fn emits_edge_only_for_event_targets_in_lifecycle_section() {
        let body = "## Eventos del Ciclo de Vida\n\n[[EVT-ORDER-PLACED]] and [[SomeEntity]]\n";
        let edges = EntityExtractor.extract_edges(&doc(body));
        let emits: Vec<_> = edges
            .iter()
            .filter(|e| e.edge_type == EdgeType::Structural(StructuralEdgeType::Emits))
            .collect();
        assert_eq!(emits.len(), 1);
        assert_eq!(emits[0].to_node, "Event:EVT-ORDER-PLACED");
    }
}

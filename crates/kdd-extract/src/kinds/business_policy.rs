//! `kind: business-policy` — indexed fields: declaration, when_applies,
//! parameters, violation. Edges: ENTITY_RULE from the declaration (bare
//! entity names only), WIKI_LINK.

use std::collections::HashMap;

use kdd_core::{Document, EdgeType, ExtractionMethod, GraphEdge, GraphNode, KDDKind, StructuralEdgeType, extract_wiki_links};
use serde_json::json;

use crate::extractor::{
    Extractor, build_wiki_link_edges, common_node, deduplicate_edges, find_section,
    is_unprefixed_target, make_node_id, parse_table_rows, resolve_wiki_link_to_node_id,
};

pub struct BusinessPolicyExtractor;

impl Extractor for BusinessPolicyExtractor {
    fn kind(&self) -> KDDKind {
        KDDKind::BusinessPolicy
    }

    fn extract_node(&self, document: &Document) -> GraphNode {
        let mut fields = HashMap::new();

        if let Some(s) = find_section(&document.sections, &["Declaración", "Declaration"]) {
            fields.insert("declaration".to_string(), json!(s.content));
        }
        if let Some(s) = find_section(&document.sections, &["Cuándo Aplica", "When Applies"]) {
            fields.insert("when_applies".to_string(), json!(s.content));
        }
        if let Some(s) = find_section(&document.sections, &["Parámetros", "Parameters"]) {
            fields.insert("parameters".to_string(), json!(parse_table_rows(&s.content)));
        }
        if let Some(s) = find_section(&document.sections, &["Violación", "Violation"]) {
            fields.insert("violation".to_string(), json!(s.content));
        }

        common_node(KDDKind::BusinessPolicy, document, fields)
    }

    fn extract_edges(&self, document: &Document) -> Vec<GraphEdge> {
        let node_id = make_node_id(KDDKind::BusinessPolicy, &document.id);
        let mut edges = build_wiki_link_edges(document, &node_id, document.layer);

        if let Some(section) = find_section(&document.sections, &["Declaración", "Declaration"]) {
            for link in extract_wiki_links(&section.content) {
                if is_unprefixed_target(&link.target) {
                    edges.push(GraphEdge {
                        from_node: node_id.clone(),
                        to_node: resolve_wiki_link_to_node_id(&link),
                        edge_type: EdgeType::Structural(StructuralEdgeType::EntityRule),
                        source_file: document.source_path.clone(),
                        extraction_method: ExtractionMethod::SectionContent,
                        metadata: HashMap::new(),
                        layer_violation: false,
                        bidirectional: false,
                    });
                }
            }
        }

        deduplicate_edges(edges)
    }
}

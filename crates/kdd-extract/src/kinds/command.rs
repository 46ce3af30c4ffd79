//! `kind: command` — indexed fields: purpose, input_params, preconditions,
//! postconditions, errors. Edges: EMITS from postconditions (`EVT-*`
//! targets only), WIKI_LINK.

use std::collections::HashMap;

use kdd_core::{Document, EdgeType, ExtractionMethod, GraphEdge, GraphNode, KDDKind, StructuralEdgeType, extract_wiki_links};
use serde_json::json;

use crate::extractor::{
    Extractor, build_wiki_link_edges, common_node, deduplicate_edges, find_section,
    make_node_id, parse_table_rows, resolve_wiki_link_to_node_id,
};

pub struct CommandExtractor;

impl Extractor for CommandExtractor {
    fn kind(&self) -> KDDKind {
        KDDKind::Command
    }

    fn extract_node(&self, document: &Document) -> GraphNode {
        let mut fields = HashMap::new();

        if let Some(s) = find_section(&document.sections, &["Propósito", "Purpose"]) {
            fields.insert("purpose".to_string(), json!(s.content));
        }
        if let Some(s) = find_section(&document.sections, &["Parámetros de Entrada", "Input Parameters"]) {
            fields.insert("input_params".to_string(), json!(parse_table_rows(&s.content)));
        }
        if let Some(s) = find_section(&document.sections, &["Precondiciones", "Preconditions"]) {
            fields.insert("preconditions".to_string(), json!(s.content));
        }
        if let Some(s) = find_section(&document.sections, &["Postcondiciones", "Postconditions"]) {
            fields.insert("postconditions".to_string(), json!(s.content));
        }
        if let Some(s) = find_section(&document.sections, &["Errores", "Errors"]) {
            fields.insert("errors".to_string(), json!(parse_table_rows(&s.content)));
        }

        common_node(KDDKind::Command, document, fields)
    }

    fn extract_edges(&self, document: &Document) -> Vec<GraphEdge> {
        let node_id = make_node_id(KDDKind::Command, &document.id);
        let mut edges = build_wiki_link_edges(document, &node_id, document.layer);

        if let Some(section) = find_section(&document.sections, &["Postcondiciones", "Postconditions"]) {
            for link in extract_wiki_links(&section.content) {
                if link.target.starts_with("EVT-") {
                    edges.push(GraphEdge {
                        from_node: node_id.clone(),
                        to_node: resolve_wiki_link_to_node_id(&link),
                        edge_type: EdgeType::Structural(StructuralEdgeType::Emits),
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

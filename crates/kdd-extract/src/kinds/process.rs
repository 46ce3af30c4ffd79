//! `kind: process` — indexed fields: participants, steps (with nested
//! children), mermaid_flow. Edges: WIKI_LINK only.

use std::collections::HashMap;

use kdd_core::{Document, GraphEdge, GraphNode, KDDKind};
use serde_json::json;

use crate::extractor::{Extractor, build_wiki_link_edges, common_node, deduplicate_edges, find_section, find_section_with_children, make_node_id};

pub struct ProcessExtractor;

impl Extractor for ProcessExtractor {
    fn kind(&self) -> KDDKind {
        KDDKind::Process
    }

    fn extract_node(&self, document: &Document) -> GraphNode {
        let mut fields = HashMap::new();

        if let Some(s) = find_section(&document.sections, &["Participantes", "Participants"]) {
            fields.insert("participants".to_string(), json!(s.content));
        }
        if let Some(steps) = find_section_with_children(&document.sections, &["Pasos", "Steps"]) {
            fields.insert("steps".to_string(), json!(steps));
        }
        if let Some(s) = find_section(&document.sections, &["Flujo Mermaid", "Mermaid Flow"]) {
            fields.insert("mermaid_flow".to_string(), json!(s.content));
        }

        common_node(KDDKind::Process, document, fields)
    }

    fn extract_edges(&self, document: &Document) -> Vec<GraphEdge> {
        let node_id = make_node_id(KDDKind::Process, &document.id);
        deduplicate_edges(build_wiki_link_edges(document, &node_id, document.layer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kdd_core::{KDDLayer, compute_content_hash, parse_markdown_sections};

    #[test]
    fn steps_include_nested_substeps() {
        let body = "## Pasos\n\n1. Receive order\n\n### Validación\n\nCheck inventory.\n";
        let document = Document {
            id: "PROC-FULFILL-ORDER".into(),
            kind: KDDKind::Process,
            source_path: "specs/02-behavior/processes/PROC-FULFILL-ORDER.md".into(),
            source_hash: compute_content_hash(body),
            layer: KDDLayer::Behavior,
            front_matter: HashMap::new(),
            sections: parse_markdown_sections(body),
            wiki_links: Vec::new(),
            status: Default::default(),
            indexed_at: None,
            domain: None,
        };
        let node = ProcessExtractor.extract_node(&document);
        let steps = node.indexed_fields["steps"].as_str().unwrap();
        assert!(steps.contains("Receive order"));
        assert!(steps.contains("Check inventory."));
    }
}

//! `kind: requirement` — indexed fields: description, acceptance_criteria,
//! traceability. Edges: WIKI_LINK only.

use std::collections::HashMap;

use kdd_core::{Document, GraphEdge, GraphNode, KDDKind};
use serde_json::json;

use crate::extractor::{Extractor, build_wiki_link_edges, common_node, deduplicate_edges, find_section, make_node_id};

pub struct RequirementExtractor;

impl Extractor for RequirementExtractor {
    fn kind(&self) -> KDDKind {
        KDDKind::Requirement
    }

    fn extract_node(&self, document: &Document) -> GraphNode {
        let mut fields = HashMap::new();

        if let Some(s) = find_section(&document.sections, &["Descripción", "Description"]) {
            fields.insert("description".to_string(), json!(s.content));
        }
        if let Some(s) = find_section(&document.sections, &["Criterios de Aceptación", "Acceptance Criteria"]) {
            fields.insert("acceptance_criteria".to_string(), json!(s.content));
        }
        if let Some(s) = find_section(&document.sections, &["Trazabilidad", "Traceability"]) {
            fields.insert("traceability".to_string(), json!(s.content));
        }

        common_node(KDDKind::Requirement, document, fields)
    }

    fn extract_edges(&self, document: &Document) -> Vec<GraphEdge> {
        let node_id = make_node_id(KDDKind::Requirement, &document.id);
        deduplicate_edges(build_wiki_link_edges(document, &node_id, document.layer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kdd_core::{KDDLayer, compute_content_hash, parse_markdown_sections};

    #[test]
    fn node_id_uses_req_prefix() {
        let body = "## Description\n\nOrders must be cancellable within 1 hour.\n";
        let document = Document {
            id: "REQ-CANCEL-WINDOW".into(),
            kind: KDDKind::Requirement,
            source_path: "specs/04-verification/requirements/REQ-CANCEL-WINDOW.md".into(),
            source_hash: compute_content_hash(body),
            layer: KDDLayer::Verification,
            front_matter: HashMap::new(),
            sections: parse_markdown_sections(body),
            wiki_links: Vec::new(),
            status: Default::default(),
            indexed_at: None,
            domain: None,
        };
        let node = RequirementExtractor.extract_node(&document);
        assert_eq!(node.id, "REQ:REQ-CANCEL-WINDOW");
    }
}

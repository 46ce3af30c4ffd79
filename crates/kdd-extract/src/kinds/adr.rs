//! `kind: adr` — indexed fields: context, decision, consequences. Edges:
//! WIKI_LINK only.

use std::collections::HashMap;

use kdd_core::{Document, GraphEdge, GraphNode, KDDKind};
use serde_json::json;

use crate::extractor::{Extractor, build_wiki_link_edges, common_node, deduplicate_edges, find_section, make_node_id};

pub struct AdrExtractor;

impl Extractor for AdrExtractor {
    fn kind(&self) -> KDDKind {
        KDDKind::Adr
    }

    fn extract_node(&self, document: &Document) -> GraphNode {
        let mut fields = HashMap::new();

        if let Some(s) = find_section(&document.sections, &["Contexto", "Context"]) {
            fields.insert("context".to_string(), json!(s.content));
        }
        if let Some(s) = find_section(&document.sections, &["Decisión", "Decision"]) {
            fields.insert("decision".to_string(), json!(s.content));
        }
        if let Some(s) = find_section(&document.sections, &["Consecuencias", "Consequences"]) {
            fields.insert("consequences".to_string(), json!(s.content));
        }

        common_node(KDDKind::Adr, document, fields)
    }

    fn extract_edges(&self, document: &Document) -> Vec<GraphEdge> {
        let node_id = make_node_id(KDDKind::Adr, &document.id);
        deduplicate_edges(build_wiki_link_edges(document, &node_id, document.layer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kdd_core::{KDDLayer, compute_content_hash, parse_markdown_sections};

    #[test]
    fn node_id_uses_adr_prefix() {
        let body = "## Context\n\nWe need a merge strategy for concurrent local indexes.\n\n## Decision\n\nLast-write-wins by indexed_at.\n";
        let document = Document {
            id: "ADR-0001-MERGE-STRATEGY".into(),
            kind: KDDKind::Adr,
            source_path: "specs/00-requirements/adrs/ADR-0001-MERGE-STRATEGY.md".into(),
            source_hash: compute_content_hash(body),
            layer: KDDLayer::Requirements,
            front_matter: HashMap::new(),
            sections: parse_markdown_sections(body),
            wiki_links: Vec::new(),
            status: Default::default(),
            indexed_at: None,
            domain: None,
        };
        let node = AdrExtractor.extract_node(&document);
        assert_eq!(node.id, "ADR:ADR-0001-MERGE-STRATEGY");
        assert_eq!(node.indexed_fields["decision"], json!("Last-write-wins by indexed_at."));
    }
}

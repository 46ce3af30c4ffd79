//! `kind: ui-component` — indexed fields: description, entities, use_cases.
//! Edges: WIKI_LINK only.

use std::collections::HashMap;

use kdd_core::{Document, GraphEdge, GraphNode, KDDKind};
use serde_json::json;

use crate::extractor::{Extractor, build_wiki_link_edges, common_node, deduplicate_edges, find_section, make_node_id};

pub struct UiComponentExtractor;

impl Extractor for UiComponentExtractor {
    fn kind(&self) -> KDDKind {
        KDDKind::UiComponent
    }

    fn extract_node(&self, document: &Document) -> GraphNode {
        let mut fields = HashMap::new();

        if let Some(s) = find_section(&document.sections, &["Descripción", "Description"]) {
            fields.insert("description".to_string(), json!(s.content));
        }
        if let Some(s) = find_section(&document.sections, &["Entidades", "Entities"]) {
            fields.insert("entities".to_string(), json!(s.content));
        }
        if let Some(s) = find_section(&document.sections, &["Casos de Uso", "Use Cases"]) {
            fields.insert("use_cases".to_string(), json!(s.content));
        }

        common_node(KDDKind::UiComponent, document, fields)
    }

    fn extract_edges(&self, document: &Document) -> Vec<GraphEdge> {
        let node_id = make_node_id(KDDKind::UiComponent, &document.id);
        deduplicate_edges(build_wiki_link_edges(document, &node_id, document.layer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kdd_core::{KDDLayer, compute_content_hash, parse_markdown_sections};

    #[test]
    fn node_id_uses_uicomp_prefix() {
        let body = "## Description\n\nReusable order summary card.\n";
        let document = Document {
            id: "UI-ORDER-CARD".into(),
            kind: KDDKind::UiComponent,
            source_path: "specs/03-experience/components/UI-ORDER-CARD.md".into(),
            source_hash: compute_content_hash(body),
            layer: KDDLayer::Experience,
            front_matter: HashMap::new(),
            sections: parse_markdown_sections(body),
            wiki_links: Vec::new(),
            status: Default::default(),
            indexed_at: None,
            domain: None,
        };
        let node = UiComponentExtractor.extract_node(&document);
        assert_eq!(node.id, "UIComp:UI-ORDER-CARD");
    }
}

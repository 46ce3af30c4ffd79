//! `kind: ui-view` — indexed fields: description, layout, components,
//! states, behavior. Edges: WIKI_LINK only.

use std::collections::HashMap;

use kdd_core::{Document, GraphEdge, GraphNode, KDDKind};
use serde_json::json;

use crate::extractor::{Extractor, build_wiki_link_edges, common_node, deduplicate_edges, find_section, make_node_id};

pub struct UiViewExtractor;

impl Extractor for UiViewExtractor {
    fn kind(&self) -> KDDKind {
        KDDKind::UiView
    }

    fn extract_node(&self, document: &Document) -> GraphNode {
        let mut fields = HashMap::new();

        if let Some(s) = find_section(&document.sections, &["Descripción", "Description"]) {
            fields.insert("description".to_string(), json!(s.content));
        }
        if let Some(s) = find_section(&document.sections, &["Layout"]) {
            fields.insert("layout".to_string(), json!(s.content));
        }
        if let Some(s) = find_section(&document.sections, &["Componentes", "Components"]) {
            fields.insert("components".to_string(), json!(s.content));
        }
        if let Some(s) = find_section(&document.sections, &["Estados", "States"]) {
            fields.insert("states".to_string(), json!(s.content));
        }
        if let Some(s) = find_section(&document.sections, &["Comportamiento", "Behavior"]) {
            fields.insert("behavior".to_string(), json!(s.content));
        }

        common_node(KDDKind::UiView, document, fields)
    }

    fn extract_edges(&self, document: &Document) -> Vec<GraphEdge> {
        let node_id = make_node_id(KDDKind::UiView, &document.id);
        deduplicate_edges(build_wiki_link_edges(document, &node_id, document.layer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kdd_core::{KDDLayer, compute_content_hash, parse_markdown_sections};

    #[test]
    fn node_id_uses_uiview_prefix() {
        let body = "## Descripción\n\nCheckout screen.\n";
        let document = Document {
            id: "UI-CHECKOUT".into(),
            kind: KDDKind::UiView,
            source_path: "specs/03-experience/views/UI-CHECKOUT.md".into(),
            source_hash: compute_content_hash(body),
            layer: KDDLayer::Experience,
            front_matter: HashMap::new(),
            sections: parse_markdown_sections(body),
            wiki_links: Vec::new(),
            status: Default::default(),
            indexed_at: None,
            domain: None,
        };
        let node = UiViewExtractor.extract_node(&document);
        assert_eq!(node.id, "UIView:UI-CHECKOUT");
    }
}

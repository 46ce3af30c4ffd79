//! `kind: objective` — indexed fields: actor, objective, success_criteria.
//! Edges: WIKI_LINK only.

use std::collections::HashMap;

use kdd_core::{Document, GraphEdge, GraphNode, KDDKind};
use serde_json::json;

use crate::extractor::{Extractor, build_wiki_link_edges, common_node, deduplicate_edges, find_section, make_node_id};

pub struct ObjectiveExtractor;

impl Extractor for ObjectiveExtractor {
    fn kind(&self) -> KDDKind {
        KDDKind::Objective
    }

    fn extract_node(&self, document: &Document) -> GraphNode {
        let mut fields = HashMap::new();

        if let Some(s) = find_section(&document.sections, &["Actor"]) {
            fields.insert("actor".to_string(), json!(s.content));
        }
        if let Some(s) = find_section(&document.sections, &["Objetivo", "Objective"]) {
            fields.insert("objective".to_string(), json!(s.content));
        }
        if let Some(s) = find_section(&document.sections, &["Criterios de Éxito", "Success Criteria"]) {
            fields.insert("success_criteria".to_string(), json!(s.content));
        }

        common_node(KDDKind::Objective, document, fields)
    }

    fn extract_edges(&self, document: &Document) -> Vec<GraphEdge> {
        let node_id = make_node_id(KDDKind::Objective, &document.id);
        deduplicate_edges(build_wiki_link_edges(document, &node_id, document.layer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kdd_core::{KDDLayer, compute_content_hash, parse_markdown_sections};

    #[test]
    fn node_id_uses_obj_prefix() {
        let body = "## Actor\n\nShopper\n\n## Objective\n\nReduce cart abandonment.\n";
        let document = Document {
            id: "OBJ-REDUCE-CART-ABANDON".into(),
            kind: KDDKind::Objective,
            source_path: "specs/00-requirements/objectives/OBJ-REDUCE-CART-ABANDON.md".into(),
            source_hash: compute_content_hash(body),
            layer: KDDLayer::Requirements,
            front_matter: HashMap::new(),
            sections: parse_markdown_sections(body),
            wiki_links: Vec::new(),
            status: Default::default(),
            indexed_at: None,
            domain: None,
        };
        let node = ObjectiveExtractor.extract_node(&document);
        assert_eq!(node.id, "OBJ:OBJ-REDUCE-CART-ABANDON");
        assert_eq!(node.indexed_fields["actor"], json!("Shopper"));
    }
}

//! `kind: prd` — indexed fields: problem, scope (nested), users (nested),
//! metrics, dependencies. Edges: WIKI_LINK only.

use std::collections::HashMap;

use kdd_core::{Document, GraphEdge, GraphNode, KDDKind};
use serde_json::json;

use crate::extractor::{Extractor, build_wiki_link_edges, common_node, deduplicate_edges, find_section, find_section_with_children, make_node_id};

pub struct PrdExtractor;

impl Extractor for PrdExtractor {
    fn kind(&self) -> KDDKind {
        KDDKind::Prd
    }

    fn extract_node(&self, document: &Document) -> GraphNode {
        let mut fields = HashMap::new();

        if let Some(s) = find_section(&document.sections, &["Problema", "Problem"]) {
            fields.insert("problem".to_string(), json!(s.content));
        }
        if let Some(scope) = find_section_with_children(&document.sections, &["Alcance", "Scope"]) {
            fields.insert("scope".to_string(), json!(scope));
        }
        if let Some(users) = find_section_with_children(
            &document.sections,
            &["Usuarios y Jobs-to-be-done", "Users and Jobs-to-be-done"],
        ) {
            fields.insert("users".to_string(), json!(users));
        }
        if let Some(s) = find_section(&document.sections, &["Métricas", "Metrics"]) {
            fields.insert("metrics".to_string(), json!(s.content));
        }
        if let Some(s) = find_section(&document.sections, &["Dependencias", "Dependencies"]) {
            fields.insert("dependencies".to_string(), json!(s.content));
        }

        common_node(KDDKind::Prd, document, fields)
    }

    fn extract_edges(&self, document: &Document) -> Vec<GraphEdge> {
        let node_id = make_node_id(KDDKind::Prd, &document.id);
        deduplicate_edges(build_wiki_link_edges(document, &node_id, document.layer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kdd_core::{KDDLayer, compute_content_hash, parse_markdown_sections};

    #[test]
    fn users_section_includes_nested_jobs() {
        let body = "## Usuarios y Jobs-to-be-done\n\nShoppers.\n\n### Job 1\n\nFind products fast.\n";
        let document = Document {
            id: "PRD-CHECKOUT-REVAMP".into(),
            kind: KDDKind::Prd,
            source_path: "specs/00-requirements/prds/PRD-CHECKOUT-REVAMP.md".into(),
            source_hash: compute_content_hash(body),
            layer: KDDLayer::Requirements,
            front_matter: HashMap::new(),
            sections: parse_markdown_sections(body),
            wiki_links: Vec::new(),
            status: Default::default(),
            indexed_at: None,
            domain: None,
        };
        let node = PrdExtractor.extract_node(&document);
        let users = node.indexed_fields["users"].as_str().unwrap();
        assert!(users.contains("Find products fast."));
    }
}

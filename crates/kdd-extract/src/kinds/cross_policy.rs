//! `kind: cross-policy` — indexed fields: purpose, declaration,
//! formalization_ears, standard_behavior. Edges: ENTITY_RULE from the
//! declaration (bare entity names only), WIKI_LINK.

use std::collections::HashMap;

use kdd_core::{Document, EdgeType, ExtractionMethod, GraphEdge, GraphNode, KDDKind, StructuralEdgeType, extract_wiki_links};
use serde_json::json;

use crate::extractor::{
    Extractor, build_wiki_link_edges, common_node, deduplicate_edges, find_section,
    is_unprefixed_target, make_node_id, resolve_wiki_link_to_node_id,
};

pub struct CrossPolicyExtractor;

impl Extractor for CrossPolicyExtractor {
    fn kind(&self) -> KDDKind {
        KDDKind::CrossPolicy
    }

    fn extract_node(&self, document: &Document) -> GraphNode {
        let mut fields = HashMap::new();

        if let Some(s) = find_section(&document.sections, &["Propósito", "Purpose"]) {
            fields.insert("purpose".to_string(), json!(s.content));
        }
        if let Some(s) = find_section(&document.sections, &["Declaración", "Declaration"]) {
            fields.insert("declaration".to_string(), json!(s.content));
        }
        if let Some(s) = find_section(&document.sections, &["Formalización EARS", "EARS Formalization"]) {
            fields.insert("formalization_ears".to_string(), json!(s.content));
        }
        if let Some(s) = find_section(&document.sections, &["Comportamiento Estándar", "Standard Behavior"]) {
            fields.insert("standard_behavior".to_string(), json!(s.content));
        }

        common_node(KDDKind::CrossPolicy, document, fields)
    }

    fn extract_edges(&self, document: &Document) -> Vec<GraphEdge> {
        let node_id = make_node_id(KDDKind::CrossPolicy, &document.id);
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

#[cfg(test)]
mod tests {
    use super::*;
    use kdd_core::{KDDLayer, compute_content_hash, parse_markdown_sections};

    #[test]
    fn extracts_purpose_and_declaration() {
        let body = "## Purpose\n\nEnforce idempotent retries.\n\n## Declaration\n\nAll [[Payment]] retries MUST carry an idempotency key.\n";
        let document = Document {
            id: "XP-IDEMPOTENT-RETRY".into(),
            kind: KDDKind::CrossPolicy,
            source_path: "specs/01-domain/cross-policies/XP-IDEMPOTENT-RETRY.md".into(),
            source_hash: compute_content_hash(body),
            layer: KDDLayer::Domain,
            front_matter: HashMap::new(),
            sections: parse_markdown_sections(body),
            wiki_links: Vec::new(),
            status: Default::default(),
            indexed_at: None,
            domain: None,
        };
        let node = CrossPolicyExtractor.extract_node(&document);
        assert_eq!(node.indexed_fields["purpose"], json!("Enforce idempotent retries."));
        let edges = CrossPolicyExtractor.extract_edges(&document);
        assert!(edges.iter().any(|e| e.to_node == "Entity:Payment"));
    }
}

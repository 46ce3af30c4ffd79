//! `kind: business-rule` — indexed fields: declaration, when_applies,
//! why_exists, violation, examples. Edges: ENTITY_RULE from the
//! declaration (bare entity names only), WIKI_LINK.

use std::collections::HashMap;

use kdd_core::{Document, EdgeType, ExtractionMethod, GraphEdge, GraphNode, KDDKind, StructuralEdgeType, extract_wiki_links};
use serde_json::json;

use crate::extractor::{
    Extractor, build_wiki_link_edges, common_node, deduplicate_edges, find_section,
    is_unprefixed_target, make_node_id, resolve_wiki_link_to_node_id,
};

pub struct BusinessRuleExtractor;

impl Extractor for BusinessRuleExtractor {
    fn kind(&self) -> KDDKind {
        KDDKind::BusinessRule
    }

    fn extract_node(&self, document: &Document) -> GraphNode {
        let mut fields = HashMap::new();

        if let Some(s) = find_section(&document.sections, &["Declaración", "Declaration"]) {
            fields.insert("declaration".to_string(), json!(s.content));
        }
        if let Some(s) = find_section(&document.sections, &["Cuándo Aplica", "When Applies"]) {
            fields.insert("when_applies".to_string(), json!(s.content));
        }
        if let Some(s) = find_section(&document.sections, &["Por Qué Existe", "Why Exists"]) {
            fields.insert("why_exists".to_string(), json!(s.content));
        }
        if let Some(s) = find_section(&document.sections, &["Violación", "Violation"]) {
            fields.insert("violation".to_string(), json!(s.content));
        }
        if let Some(s) = find_section(&document.sections, &["Ejemplos", "Examples"]) {
            fields.insert("examples".to_string(), json!(s.content));
        }

        common_node(KDDKind::BusinessRule, document, fields)
    }

    fn extract_edges(&self, document: &Document) -> Vec<GraphEdge> {
        let node_id = make_node_id(KDDKind::BusinessRule, &document.id);
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
    fn entity_rule_edge_only_for_bare_entity_names() {
        let body = "## Declaración\n\nApplies to [[Order]] unless blocked by [[BR-OTHER]].\n";
        let document = Document {
            id: "BR-ORDER-TOTAL".into(),
            kind: KDDKind::BusinessRule,
            source_path: "specs/01-domain/business-rules/BR-ORDER-TOTAL.md".into(),
            source_hash: compute_content_hash(body),
            layer: KDDLayer::Domain,
            front_matter: HashMap::new(),
            sections: parse_markdown_sections(body),
            wiki_links: Vec::new(),
            status: Default::default(),
            indexed_at: None,
            domain: None,
        };
        let edges = BusinessRuleExtractor.extract_edges(&document);
        let entity_rule: Vec<_> = edges
            .iter()
            .filter(|e| e.edge_type == EdgeType::Structural(StructuralEdgeType::EntityRule))
            .collect();
        assert_eq!(entity_rule.len(), 1);
        assert_eq!(entity_rule[0].to_node, "Entity:Order");
    }
}

//! `kind: use-case` — indexed fields: description, actors, preconditions,
//! main_flow, alternatives (nested), exceptions (nested), postconditions.
//! Edges: UC_APPLIES_RULE (`BR-`/`BP-`/`XP-` only), UC_EXECUTES_CMD
//! (`CMD-*` only), UC_STORY (`OBJ-*` only, searched across the full body),
//! WIKI_LINK.

use std::collections::HashMap;

use kdd_core::{Document, EdgeType, ExtractionMethod, GraphEdge, GraphNode, KDDKind, StructuralEdgeType, extract_wiki_links};
use serde_json::json;

use crate::extractor::{
    Extractor, build_wiki_link_edges, common_node, deduplicate_edges, find_section,
    find_section_with_children, make_node_id, resolve_wiki_link_to_node_id,
};

pub struct UseCaseExtractor;

impl Extractor for UseCaseExtractor {
    fn kind(&self) -> KDDKind {
        KDDKind::UseCase
    }

    fn extract_node(&self, document: &Document) -> GraphNode {
        let mut fields = HashMap::new();

        if let Some(s) = find_section(&document.sections, &["Descripción", "Description"]) {
            fields.insert("description".to_string(), json!(s.content));
        }
        if let Some(s) = find_section(&document.sections, &["Actores", "Actors"]) {
            fields.insert("actors".to_string(), json!(s.content));
        }
        if let Some(s) = find_section(&document.sections, &["Precondiciones", "Preconditions"]) {
            fields.insert("preconditions".to_string(), json!(s.content));
        }
        if let Some(s) = find_section(&document.sections, &["Flujo Principal", "Main Flow"]) {
            fields.insert("main_flow".to_string(), json!(s.content));
        }
        if let Some(alt) = find_section_with_children(&document.sections, &["Flujos Alternativos", "Alternative Flows"]) {
            fields.insert("alternatives".to_string(), json!(alt));
        }
        if let Some(exc) = find_section_with_children(&document.sections, &["Excepciones", "Exceptions"]) {
            fields.insert("exceptions".to_string(), json!(exc));
        }
        if let Some(s) = find_section(&document.sections, &["Postcondiciones", "Postconditions"]) {
            fields.insert("postconditions".to_string(), json!(s.content));
        }

        common_node(KDDKind::UseCase, document, fields)
    }

    fn extract_edges(&self, document: &Document) -> Vec<GraphEdge> {
        let node_id = make_node_id(KDDKind::UseCase, &document.id);
        let mut edges = build_wiki_link_edges(document, &node_id, document.layer);

        if let Some(section) = find_section(&document.sections, &["Reglas Aplicadas", "Applied Rules", "Rules Applied"]) {
            for link in extract_wiki_links(&section.content) {
                if link.target.starts_with("BR-") || link.target.starts_with("BP-") || link.target.starts_with("XP-") {
                    edges.push(GraphEdge {
                        from_node: node_id.clone(),
                        to_node: resolve_wiki_link_to_node_id(&link),
                        edge_type: EdgeType::Structural(StructuralEdgeType::UcAppliesRule),
                        source_file: document.source_path.clone(),
                        extraction_method: ExtractionMethod::SectionContent,
                        metadata: HashMap::new(),
                        layer_violation: false,
                        bidirectional: false,
                    });
                }
            }
        }

        if let Some(section) = find_section(&document.sections, &["Comandos Ejecutados", "Commands Executed"]) {
            for link in extract_wiki_links(&section.content) {
                if link.target.starts_with("CMD-") {
                    edges.push(GraphEdge {
                        from_node: node_id.clone(),
                        to_node: resolve_wiki_link_to_node_id(&link),
                        edge_type: EdgeType::Structural(StructuralEdgeType::UcExecutesCmd),
                        source_file: document.source_path.clone(),
                        extraction_method: ExtractionMethod::SectionContent,
                        metadata: HashMap::new(),
                        layer_violation: false,
                        bidirectional: false,
                    });
                }
            }
        }

        let full_body = document
            .sections
            .iter()
            .map(|s| s.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        for link in extract_wiki_links(&full_body) {
            if link.target.starts_with("OBJ-") {
                edges.push(GraphEdge {
                    from_node: node_id.clone(),
                    to_node: resolve_wiki_link_to_node_id(&link),
                    edge_type: EdgeType::Structural(StructuralEdgeType::UcStory),
                    source_file: document.source_path.clone(),
                    extraction_method: ExtractionMethod::WikiLink,
                    metadata: HashMap::new(),
                    layer_violation: false,
                    bidirectional: false,
                });
            }
        }

        deduplicate_edges(edges)
    }
}

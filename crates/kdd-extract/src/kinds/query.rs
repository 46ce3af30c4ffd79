//! `kind: query` — indexed fields: purpose, input_params, output_structure,
//! errors. Edges: WIKI_LINK only.

use std::collections::HashMap;

use kdd_core::{Document, GraphEdge, GraphNode, KDDKind};
use serde_json::json;

use crate::extractor::{Extractor, build_wiki_link_edges, common_node, deduplicate_edges, find_section, make_node_id, parse_table_rows};

pub struct QueryExtractor;

impl Extractor for QueryExtractor {
    fn kind(&self) -> KDDKind {
        KDDKind::Query
    }

    fn extract_node(&self, document: &Document) -> GraphNode {
        let mut fields = HashMap::new();

        if let Some(s) = find_section(&document.sections, &["Propósito", "Purpose"]) {
            fields.insert("purpose".to_string(), json!(s.content));
        }
        if let Some(s) = find_section(&document.sections, &["Parámetros de Entrada", "Input Parameters"]) {
            fields.insert("input_params".to_string(), json!(parse_table_rows(&s.content)));
        }
        if let Some(s) = find_section(&document.sections, &["Estructura de Salida", "Output Structure"]) {
            fields.insert("output_structure".to_string(), json!(s.content));
        }
        if let Some(s) = find_section(&document.sections, &["Errores", "Errors"]) {
            fields.insert("errors".to_string(), json!(parse_table_rows(&s.content)));
        }

        common_node(KDDKind::Query, document, fields)
    }

    fn extract_edges(&self, document: &Document) -> Vec<GraphEdge> {
        let node_id = make_node_id(KDDKind::Query, &document.id);
        deduplicate_edges(build_wiki_link_edges(document, &node_id, document.layer))
    }
}

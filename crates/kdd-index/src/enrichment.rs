//! CMD-003 — enriches an existing [`GraphNode`] using the developer's AI
//! agent (L3 only). Entirely optional: requires an `AgentClient` adapter and
//! an L2+ index to have already been built.

use std::collections::HashMap;
use std::path::Path;

use kdd_core::{ArtifactStore, AgentClient, EdgeType, ExtractionMethod, GraphEdge, StructuralEdgeType};

const MAX_CONTEXT_CHARS: usize = 5000;
const MAX_RELATED_EDGES: usize = 20;

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct EnrichResult {
    pub success: bool,
    pub summary: Option<String>,
    pub implicit_edges: usize,
    pub error: Option<String>,
}

fn failure(error: impl Into<String>) -> EnrichResult {
    EnrichResult { error: Some(error.into()), ..Default::default() }
}

/// Enrich `node_id` using `agent_client`, grounded in its source document and
/// existing graph neighborhood (CMD-003 / UC-003).
pub async fn enrich_with_agent(
    node_id: &str,
    artifact_store: &dyn ArtifactStore,
    agent_client: &dyn AgentClient,
    specs_root: &Path,
) -> EnrichResult {
    let node = match artifact_store.read_node(node_id) {
        Ok(n) => n,
        Err(_) => return failure(format!("NODE_NOT_FOUND: {node_id}")),
    };

    let source_path = specs_root.join(&node.source_file);
    let content = match std::fs::read_to_string(&source_path) {
        Ok(c) => c,
        Err(_) => return failure(format!("DOCUMENT_NOT_FOUND: {}", node.source_file)),
    };

    let edges = match artifact_store.read_edges() {
        Ok(e) => e,
        Err(e) => return failure(e.to_string()),
    };
    let related_edges: Vec<&GraphEdge> =
        edges.iter().filter(|e| e.from_node == node_id || e.to_node == node_id).collect();

    let context = build_context(&node, &content, &related_edges);

    let enrichment = match agent_client.enrich(&node, &context).await {
        Ok(e) => e,
        Err(e) => return failure(format!("AGENT_ERROR: {e}")),
    };

    let enrichment_json = match serde_json::to_value(&enrichment) {
        Ok(v) => v,
        Err(e) => return failure(e.to_string()),
    };
    if let Err(e) = artifact_store.write_enrichment(&doc_id(node_id), &enrichment_json) {
        return failure(e.to_string());
    }

    let implicit_edges: Vec<GraphEdge> = enrichment
        .implicit_relations
        .iter()
        .map(|rel| GraphEdge {
            from_node: node_id.to_string(),
            to_node: rel.target_node.clone(),
            edge_type: edge_type_for(&rel.relation),
            source_file: node.source_file.clone(),
            extraction_method: ExtractionMethod::Implicit,
            metadata: HashMap::from([("agent".to_string(), serde_json::json!("enrichment"))]),
            layer_violation: false,
            bidirectional: false,
        })
        .collect();

    if !implicit_edges.is_empty() {
        if let Err(e) = artifact_store.append_edges(&implicit_edges) {
            return failure(e.to_string());
        }
    }

    EnrichResult {
        success: true,
        summary: Some(enrichment.summary),
        implicit_edges: implicit_edges.len(),
        error: None,
    }
}

fn doc_id(node_id: &str) -> String {
    node_id.split_once(':').map(|(_, rest)| rest.to_string()).unwrap_or_else(|| node_id.to_string())
}

fn edge_type_for(relation: &str) -> EdgeType {
    match relation {
        "WIKI_LINK" => EdgeType::Structural(StructuralEdgeType::WikiLink),
        "DOMAIN_RELATION" => EdgeType::Structural(StructuralEdgeType::DomainRelation),
        "CROSS_DOMAIN_REF" => EdgeType::Structural(StructuralEdgeType::CrossDomainRef),
        other => EdgeType::Business(other.to_string()),
    }
}

fn build_context(node: &kdd_core::GraphNode, document_content: &str, related_edges: &[&GraphEdge]) -> String {
    let mut parts = vec![
        format!("# Node: {}", node.id),
        format!("Kind: {}", node.kind.as_str()),
        format!("Layer: {}", node.layer.as_str()),
        String::new(),
        "## Document Content".to_string(),
        truncate_chars(document_content, MAX_CONTEXT_CHARS),
        String::new(),
        "## Existing Relations".to_string(),
    ];

    for edge in related_edges.iter().take(MAX_RELATED_EDGES) {
        let (direction, other) = if edge.from_node == node.id {
            ("->", edge.to_node.as_str())
        } else {
            ("<-", edge.from_node.as_str())
        };
        parts.push(format!("  {direction} {other} [{}]", edge.edge_type.as_str()));
    }

    parts.join("\n")
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

//! QRY-002 Semantic Search: embed the query, search the vector store, and
//! resolve each matched chunk back to its owning graph node.

use kdd_core::{EmbeddingModel, ErrorCode, GraphStore, KddError, KddResult, RetrievalQuery, RetrievalResult, RetrievalStrategy, ScoredNode, VectorStore};

use crate::graph_store::{build_snippet, PetgraphGraphStore};

const KIND_PREFIXES: &[&str] = &["Entity", "Event", "BR", "BP", "XP", "CMD", "QRY", "PROC", "UC", "UIView", "UIComp", "REQ", "OBJ", "PRD", "ADR"];

/// Split an embedding id (`"{document_id}:chunk-{n}"`) back to its document
/// id, falling back to splitting on the first `:` if there's no chunk suffix.
pub(crate) fn document_id_of(embedding_id: &str) -> &str {
    if let Some(idx) = embedding_id.find(":chunk-") {
        return &embedding_id[..idx];
    }
    match embedding_id.split_once(':') {
        Some((prefix, _)) => &embedding_id[..prefix.len()],
        None => embedding_id,
    }
}

/// Resolve a raw document id to a node already present in the graph, trying
/// the bare id first, then each known kind prefix.
pub(crate) fn resolve_node<'a>(graph: &'a PetgraphGraphStore, document_id: &str) -> Option<&'a kdd_core::GraphNode> {
    if let Some(node) = graph.get_node(document_id) {
        return Some(node);
    }
    for prefix in KIND_PREFIXES {
        let candidate = format!("{prefix}:{document_id}");
        if let Some(node) = graph.get_node(&candidate) {
            return Some(node);
        }
    }
    None
}

pub async fn semantic_search(
    graph: &PetgraphGraphStore,
    vectors: &dyn VectorStore,
    embedder: &dyn EmbeddingModel,
    query: &RetrievalQuery,
) -> KddResult<RetrievalResult> {
    let text = query.query_text.as_deref().unwrap_or_default();
    if text.trim().len() < 3 {
        return Err(KddError::new(ErrorCode::QueryTooShort, "query text must be at least 3 characters"));
    }

    let mut vector = embedder.encode(&[text.to_string()]).await?;
    let query_vector = vector.pop().expect("single input produces a single vector");

    let over_fetched = vectors.search(&query_vector, query.limit.saturating_mul(3).max(1), query.min_score);

    let mut seen_nodes = std::collections::HashSet::new();
    let mut results = Vec::new();

    for scored in over_fetched {
        let document_id = document_id_of(&scored.node_id);
        let Some(node) = resolve_node(graph, document_id) else { continue };

        if !query.include_kinds.is_empty() && !query.include_kinds.contains(&node.kind) {
            continue;
        }
        if !query.include_layers.is_empty() && !query.include_layers.contains(&node.layer) {
            continue;
        }
        if !seen_nodes.insert(node.id.clone()) {
            continue;
        }

        results.push(ScoredNode { node_id: node.id.clone(), score: scored.score, snippet: Some(build_snippet(node)), match_source: "semantic".to_string() });
    }

    results.truncate(query.limit);
    let total_nodes = results.len();

    Ok(RetrievalResult { query_id: query.id, strategy: RetrievalStrategy::Semantic, results, graph_expansion: Vec::new(), total_nodes, total_tokens: None, layer_violations: Vec::new() })
}

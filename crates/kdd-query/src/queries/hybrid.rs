//! QRY-003 Hybrid Fusion: the primary agent-facing query, combining
//! semantic, lexical, and graph-expansion signals into one ranked list.

use std::collections::{HashMap, HashSet};

use kdd_core::{count_tokens, EmbeddingModel, ErrorCode, GraphStore, KddError, KddResult, RetrievalQuery, RetrievalResult, RetrievalStrategy, ScoredNode, VectorStore};

use crate::graph_store::{build_snippet, PetgraphGraphStore};
use crate::queries::semantic::{document_id_of, resolve_node};

#[derive(Default, Clone, Copy)]
struct Contribution {
    semantic: f32,
    graph: f32,
    lexical: f32,
}

/// `has_embeddings` lets the caller (who owns the concrete vector store)
/// report emptiness without widening the `VectorStore` trait just for this
/// one query's `NO_EMBEDDINGS` fallback.
pub async fn hybrid_search(
    graph: &PetgraphGraphStore,
    vectors: &dyn VectorStore,
    has_embeddings: bool,
    embedder: Option<&dyn EmbeddingModel>,
    query: &RetrievalQuery,
) -> KddResult<(RetrievalResult, Vec<String>)> {
    let text = query.query_text.as_deref().unwrap_or_default();
    if text.trim().len() < 3 {
        return Err(KddError::new(ErrorCode::QueryTooShort, "query text must be at least 3 characters"));
    }

    let mut contributions: HashMap<String, Contribution> = HashMap::new();
    let mut warnings: Vec<String> = Vec::new();

    // Phase 1: semantic.
    if let Some(embedder) = embedder {
        if has_embeddings {
            let mut vector = embedder.encode(&[text.to_string()]).await?;
            let query_vector = vector.pop().unwrap_or_default();
            let over_fetched = vectors.search(&query_vector, query.limit.saturating_mul(3).max(1), query.min_score * 0.8);

            for scored in over_fetched {
                let document_id = document_id_of(&scored.node_id);
                let Some(node) = resolve_node(graph, document_id) else { continue };
                if !passes_filters(node, query) {
                    continue;
                }
                let entry = contributions.entry(node.id.clone()).or_default();
                entry.semantic = entry.semantic.max(scored.score);
            }
        } else {
            warnings.push("NO_EMBEDDINGS".to_string());
        }
    } else {
        warnings.push("NO_EMBEDDINGS".to_string());
    }

    // Phase 2: lexical.
    let lexical_matches = graph.text_search(text);
    for scored in lexical_matches {
        let Some(node) = graph.get_node(&scored.node_id) else { continue };
        if !passes_filters(node, query) {
            continue;
        }
        contributions.entry(node.id.clone()).or_default().lexical = 0.5;
    }

    // Phase 3: graph expansion from the seed set gathered so far.
    let mut graph_expansion = Vec::new();
    let mut seen_edge_identity: HashSet<(String, String, String)> = HashSet::new();
    if query.expand_graph {
        let seeds: Vec<String> = contributions.keys().cloned().collect();
        for seed in &seeds {
            let expanded = graph.traverse_filtered(seed, query.depth, &query.edge_types, query.respect_layers);
            for (node, edge) in expanded {
                if seen_edge_identity.insert(edge.identity()) {
                    graph_expansion.push(edge);
                }
                if contributions.contains_key(&node.id) {
                    continue;
                }
                if !passes_filters(&node, query) {
                    continue;
                }
                contributions.entry(node.id.clone()).or_default().graph = 0.5;
            }
        }
    }

    // Phase 4: fusion scoring.
    let mut scored_nodes: Vec<(String, f32, String)> = Vec::new();
    for (node_id, c) in contributions {
        let source_count = [c.semantic > 0.0, c.graph > 0.0, c.lexical > 0.0].into_iter().filter(|b| *b).count();
        let weighted = 0.6 * c.semantic + 0.3 * c.graph + 0.1 * c.lexical + 0.1 * (source_count as f32 - 1.0).max(0.0);
        let normalized = (weighted / 1.2).min(1.0);
        if normalized < query.min_score {
            continue;
        }
        let match_source = if c.semantic > 0.0 && c.graph > 0.0 {
            "fusion"
        } else if c.semantic > 0.0 {
            "semantic"
        } else if c.graph > 0.0 {
            "graph"
        } else {
            "lexical"
        };
        scored_nodes.push((node_id, normalized, match_source.to_string()));
    }

    scored_nodes.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let mut results = Vec::new();
    let mut token_total = 0usize;
    for (node_id, score, match_source) in scored_nodes {
        if results.len() >= query.limit {
            break;
        }
        let Some(node) = graph.get_node(&node_id) else { continue };
        let snippet = build_snippet(node);
        let estimate = count_tokens(&snippet);
        if !results.is_empty() && token_total + estimate > query.max_tokens {
            break;
        }
        token_total += estimate;
        results.push(ScoredNode { node_id: node_id.clone(), score, snippet: Some(snippet), match_source });
    }

    let total_nodes = results.len();
    let result = RetrievalResult {
        query_id: query.id,
        strategy: RetrievalStrategy::Hybrid,
        results,
        graph_expansion,
        total_nodes,
        total_tokens: Some(token_total),
        layer_violations: Vec::new(),
    };
    Ok((result, warnings))
}

fn passes_filters(node: &kdd_core::GraphNode, query: &RetrievalQuery) -> bool {
    (query.include_kinds.is_empty() || query.include_kinds.contains(&node.kind)) && (query.include_layers.is_empty() || query.include_layers.contains(&node.layer))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fusion_prefers_nodes_found_by_multiple_sources() {
        let contrib_both = Contribution { semantic: 0.8, graph: 0.5, lexical: 0.0 };
        let contrib_semantic_only = Contribution { semantic: 0.8, graph: 0.0, lexical: 0.0 };

        let score = |c: Contribution| {
            let source_count = [c.semantic > 0.0, c.graph > 0.0, c.lexical > 0.0].into_iter().filter(|b| *b).count();
            (0.6 * c.semantic + 0.3 * c.graph + 0.1 * c.lexical + 0.1 * (source_count as f32 - 1.0).max(0.0)) / 1.2
        };

        assert!(score(contrib_both) > score(contrib_semantic_only));
    }
}

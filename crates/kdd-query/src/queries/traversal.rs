//! QRY-001 Graph Traversal: bidirectional BFS from a root node, scored by
//! approximate shortest hop count.

use std::collections::{HashMap, HashSet, VecDeque};

use kdd_core::{ErrorCode, GraphStore, KddError, KddResult, RetrievalQuery, RetrievalResult, ScoredNode};

use crate::graph_store::PetgraphGraphStore;

pub fn graph_traversal(graph: &PetgraphGraphStore, query: &RetrievalQuery) -> KddResult<RetrievalResult> {
    let root = query.root_node.as_deref().ok_or_else(|| KddError::new(ErrorCode::NodeNotFound, "no root_node supplied"))?;

    if !graph.has_node(root) {
        return Err(KddError::new(ErrorCode::NodeNotFound, format!("node not found: {root}")));
    }

    let collected = graph.traverse_filtered(root, query.depth, &query.edge_types, query.respect_layers);

    let mut edges = Vec::with_capacity(collected.len());
    let mut seen_edge_identity: HashSet<(String, String, String)> = HashSet::new();
    let mut adjacency: HashMap<String, Vec<String>> = HashMap::new();
    let mut node_by_id: HashMap<String, kdd_core::GraphNode> = HashMap::new();
    node_by_id.insert(root.to_string(), graph.get_node(root).expect("checked above").clone());

    for (node, edge) in collected {
        adjacency.entry(edge.from_node.clone()).or_default().push(edge.to_node.clone());
        adjacency.entry(edge.to_node.clone()).or_default().push(edge.from_node.clone());
        node_by_id.entry(node.id.clone()).or_insert(node);
        if seen_edge_identity.insert(edge.identity()) {
            edges.push(edge);
        }
    }

    // Secondary BFS over the collected edge set for an approximate shortest
    // hop count, since the primary traversal doesn't track distance.
    let mut hop: HashMap<String, u32> = HashMap::new();
    hop.insert(root.to_string(), 0);
    let mut queue: VecDeque<String> = VecDeque::from([root.to_string()]);
    while let Some(current) = queue.pop_front() {
        let dist = hop[&current];
        if let Some(neighbors) = adjacency.get(&current) {
            for neighbor in neighbors {
                if !hop.contains_key(neighbor) {
                    hop.insert(neighbor.clone(), dist + 1);
                    queue.push_back(neighbor.clone());
                }
            }
        }
    }

    let include_kinds = &query.include_kinds;
    let mut results: Vec<ScoredNode> = node_by_id
        .values()
        .filter(|n| include_kinds.is_empty() || n.id == root || include_kinds.contains(&n.kind))
        .map(|n| {
            let d = hop.get(&n.id).copied().unwrap_or(u32::MAX);
            let score = 1.0 / (1.0 + d as f32);
            ScoredNode { node_id: n.id.clone(), score, snippet: Some(crate::graph_store::build_snippet(n)), match_source: "graph".to_string() }
        })
        .collect();

    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

    let total_nodes = results.len();
    Ok(RetrievalResult {
        query_id: query.id,
        strategy: kdd_core::RetrievalStrategy::Graph,
        results,
        graph_expansion: edges,
        total_nodes,
        total_tokens: None,
        layer_violations: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use kdd_core::{EdgeType, ExtractionMethod, KDDKind, KDDLayer, QueryStatus, RetrievalStrategy, StructuralEdgeType};
    use std::collections::HashMap as StdHashMap;

    fn node(id: &str, kind: KDDKind) -> kdd_core::GraphNode {
        kdd_core::GraphNode {
            id: id.to_string(),
            kind,
            source_file: format!("{id}.md"),
            source_hash: "h".to_string(),
            layer: KDDLayer::Domain,
            status: "draft".to_string(),
            aliases: Vec::new(),
            domain: None,
            indexed_fields: StdHashMap::new(),
            indexed_at: None,
        }
    }

    fn edge(from: &str, to: &str) -> kdd_core::GraphEdge {
        kdd_core::GraphEdge {
            from_node: from.to_string(),
            to_node: to.to_string(),
            edge_type: EdgeType::Structural(StructuralEdgeType::WikiLink),
            source_file: format!("{from}.md"),
            extraction_method: ExtractionMethod::WikiLink,
            metadata: StdHashMap::new(),
            layer_violation: false,
            bidirectional: false,
        }
    }

    fn query(root: &str, depth: u32) -> RetrievalQuery {
        RetrievalQuery {
            id: uuid::Uuid::new_v4(),
            strategy: RetrievalStrategy::Graph,
            query_text: None,
            root_node: Some(root.to_string()),
            depth,
            edge_types: Vec::new(),
            include_kinds: Vec::new(),
            include_layers: Vec::new(),
            respect_layers: true,
            expand_graph: true,
            min_score: 0.0,
            limit: 10,
            max_tokens: 8000,
            status: QueryStatus::default(),
            received_at: chrono::Utc::now(),
            completed_at: None,
            duration_ms: None,
            caller: None,
        }
    }

    #[test]
    fn scores_decrease_with_hop_distance() {
        let mut store = PetgraphGraphStore::new();
        store.load(
            vec![node("A", KDDKind::Entity), node("B", KDDKind::Entity), node("C", KDDKind::Entity)],
            vec![edge("A", "B"), edge("B", "C")],
        );

        let result = graph_traversal(&store, &query("A", 2)).unwrap();
        let score_of = |id: &str| result.results.iter().find(|r| r.node_id == id).unwrap().score;
        assert!(score_of("A") > score_of("B"));
        assert!(score_of("B") > score_of("C"));
    }

    #[test]
    fn missing_root_is_node_not_found() {
        let store = PetgraphGraphStore::new();
        let err = graph_traversal(&store, &query("Nope", 2)).unwrap_err();
        assert_eq!(err.code, ErrorCode::NodeNotFound);
    }
}

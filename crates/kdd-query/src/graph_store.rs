//! In-memory [`GraphStore`] backed by `petgraph::StableDiGraph`, keyed by
//! node ID string rather than raw petgraph indices so callers never see the
//! graph's internal representation.

use std::collections::{HashMap, HashSet, VecDeque};

use kdd_core::{GraphEdge, GraphNode, GraphStore, LayerViolation, ScoredNode};
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

/// Builds and queries the knowledge graph assembled from every indexed
/// [`GraphNode`]/[`GraphEdge`]. Used by QRY-001/003/004/005/006.
pub struct PetgraphGraphStore {
    inner: StableDiGraph<GraphNode, GraphEdge>,
    index_of: HashMap<String, NodeIndex>,
}

impl Default for PetgraphGraphStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PetgraphGraphStore {
    pub fn new() -> Self {
        Self { inner: StableDiGraph::new(), index_of: HashMap::new() }
    }

    /// Replace any prior state with `nodes` and `edges`.
    pub fn load(&mut self, nodes: Vec<GraphNode>, edges: Vec<GraphEdge>) {
        self.inner.clear();
        self.index_of.clear();

        for node in nodes {
            let id = node.id.clone();
            let idx = self.inner.add_node(node);
            self.index_of.insert(id, idx);
        }

        for edge in edges {
            let (Some(&from), Some(&to)) = (self.index_of.get(&edge.from_node), self.index_of.get(&edge.to_node)) else {
                continue;
            };
            self.inner.add_edge(from, to, edge);
        }
    }

    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    fn idx(&self, node_id: &str) -> Option<NodeIndex> {
        self.index_of.get(node_id).copied()
    }

    fn edge_matches(edge: &GraphEdge, edge_types: &[String], respect_layers: bool) -> bool {
        if respect_layers && edge.layer_violation {
            return false;
        }
        if !edge_types.is_empty() && !edge_types.iter().any(|t| t == edge.edge_type.as_str()) {
            return false;
        }
        true
    }
}

impl GraphStore for PetgraphGraphStore {
    fn get_node(&self, node_id: &str) -> Option<&GraphNode> {
        self.idx(node_id).and_then(|idx| self.inner.node_weight(idx))
    }

    fn has_node(&self, node_id: &str) -> bool {
        self.index_of.contains_key(node_id)
    }

    /// BFS both directions from `root` up to `depth` hops, collecting every
    /// edge traversed (deduplicated) and every node reached.
    fn traverse(&self, root: &str, depth: u32, respect_layers: bool) -> Vec<(GraphNode, GraphEdge)> {
        self.traverse_filtered(root, depth, &[], respect_layers)
    }

    fn reverse_traverse(&self, root: &str, depth: u32) -> Vec<(GraphNode, GraphEdge)> {
        let Some(root_idx) = self.idx(root) else { return Vec::new() };

        let mut visited: HashSet<NodeIndex> = HashSet::from([root_idx]);
        let mut results = Vec::new();
        let mut queue: VecDeque<(NodeIndex, u32)> = VecDeque::from([(root_idx, 0)]);

        while let Some((current, dist)) = queue.pop_front() {
            if dist >= depth {
                continue;
            }
            for edge_ref in self.inner.edges_directed(current, Direction::Incoming) {
                let pred = edge_ref.source();
                if visited.contains(&pred) {
                    continue;
                }
                visited.insert(pred);
                if let Some(node) = self.inner.node_weight(pred) {
                    results.push((node.clone(), edge_ref.weight().clone()));
                }
                queue.push_back((pred, dist + 1));
            }
        }

        results
    }

    fn text_search(&self, query: &str) -> Vec<ScoredNode> {
        let query_lower = query.to_lowercase();
        let mut results = Vec::new();
        for node in self.inner.node_weights() {
            if Self::node_matches_text(node, &query_lower) {
                results.push(ScoredNode {
                    node_id: node.id.clone(),
                    score: 1.0,
                    snippet: Some(build_snippet(node)),
                    match_source: "lexical".to_string(),
                });
            }
        }
        results
    }

    fn outgoing_edges(&self, node_id: &str) -> Vec<&GraphEdge> {
        let Some(idx) = self.idx(node_id) else { return Vec::new() };
        self.inner.edges_directed(idx, Direction::Outgoing).map(|e| e.weight()).collect()
    }

    fn incoming_edges(&self, node_id: &str) -> Vec<&GraphEdge> {
        let Some(idx) = self.idx(node_id) else { return Vec::new() };
        self.inner.edges_directed(idx, Direction::Incoming).map(|e| e.weight()).collect()
    }

    fn all_edges(&self) -> Vec<&GraphEdge> {
        self.inner.edge_weights().collect()
    }

    fn all_nodes(&self) -> Vec<&GraphNode> {
        self.inner.node_weights().collect()
    }

    fn find_violations(&self) -> Vec<LayerViolation> {
        self.inner
            .edge_references()
            .filter(|e| e.weight().layer_violation)
            .filter_map(|e| {
                let from = self.inner.node_weight(e.source())?;
                let to = self.inner.node_weight(e.target())?;
                Some(LayerViolation {
                    from_node: from.id.clone(),
                    to_node: to.id.clone(),
                    from_layer: from.layer,
                    to_layer: to.layer,
                    edge_type: e.weight().edge_type.clone(),
                })
            })
            .collect()
    }
}

impl PetgraphGraphStore {
    /// Full traversal honoring an optional edge-type allowlist; used by QRY-001
    /// which needs type filtering beyond the trait's bare `traverse`.
    pub fn traverse_filtered(
        &self,
        root: &str,
        depth: u32,
        edge_types: &[String],
        respect_layers: bool,
    ) -> Vec<(GraphNode, GraphEdge)> {
        let Some(root_idx) = self.idx(root) else { return Vec::new() };

        let mut visited: HashSet<NodeIndex> = HashSet::from([root_idx]);
        let mut seen_edges: HashSet<(String, String, String)> = HashSet::new();
        let mut results = Vec::new();
        let mut queue: VecDeque<(NodeIndex, u32)> = VecDeque::from([(root_idx, 0)]);

        while let Some((current, dist)) = queue.pop_front() {
            if dist >= depth {
                continue;
            }

            for edge_ref in self.inner.edges_directed(current, Direction::Outgoing) {
                let edge = edge_ref.weight();
                if !Self::edge_matches(edge, edge_types, respect_layers) {
                    continue;
                }
                if seen_edges.insert(edge.identity()) {
                    if let Some(node) = self.inner.node_weight(edge_ref.target()) {
                        results.push((node.clone(), edge.clone()));
                    }
                }
                let neighbor = edge_ref.target();
                if !visited.contains(&neighbor) {
                    visited.insert(neighbor);
                    queue.push_back((neighbor, dist + 1));
                }
            }

            for edge_ref in self.inner.edges_directed(current, Direction::Incoming) {
                let edge = edge_ref.weight();
                if !Self::edge_matches(edge, edge_types, respect_layers) {
                    continue;
                }
                if seen_edges.insert(edge.identity()) {
                    if let Some(node) = self.inner.node_weight(edge_ref.source()) {
                        results.push((node.clone(), edge.clone()));
                    }
                }
                let neighbor = edge_ref.source();
                if !visited.contains(&neighbor) {
                    visited.insert(neighbor);
                    queue.push_back((neighbor, dist + 1));
                }
            }
        }

        results
    }

    fn node_matches_text(node: &GraphNode, query_lower: &str) -> bool {
        let mut haystack: Vec<String> = node.indexed_fields.values().map(|v| value_to_string(v)).collect();
        haystack.push(node.id.clone());
        haystack.extend(node.aliases.iter().cloned());
        haystack.iter().any(|v| v.to_lowercase().contains(query_lower))
    }
}

fn value_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub(crate) fn build_snippet(node: &GraphNode) -> String {
    let title = node.indexed_fields.get("title").and_then(|v| v.as_str());
    match title {
        Some(t) if !t.is_empty() => format!("[{}] {}", node.kind.as_str(), t),
        _ => format!("[{}] {}", node.kind.as_str(), node.id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kdd_core::{EdgeType, ExtractionMethod, KDDKind, KDDLayer, StructuralEdgeType};
    use std::collections::HashMap;

    fn node(id: &str, kind: KDDKind, layer: KDDLayer) -> GraphNode {
        GraphNode {
            id: id.to_string(),
            kind,
            source_file: format!("{id}.md"),
            source_hash: "h".to_string(),
            layer,
            status: "draft".to_string(),
            aliases: Vec::new(),
            domain: None,
            indexed_fields: HashMap::new(),
            indexed_at: None,
        }
    }

    fn edge(from: &str, to: &str, edge_type: StructuralEdgeType, layer_violation: bool) -> GraphEdge {
        GraphEdge {
            from_node: from.to_string(),
            to_node: to.to_string(),
            edge_type: EdgeType::Structural(edge_type),
            source_file: format!("{from}.md"),
            extraction_method: ExtractionMethod::WikiLink,
            metadata: HashMap::new(),
            layer_violation,
            bidirectional: false,
        }
    }

    #[test]
    fn traverse_reaches_two_hop_neighbor() {
        let mut store = PetgraphGraphStore::new();
        store.load(
            vec![
                node("Entity:Order", KDDKind::Entity, KDDLayer::Domain),
                node("Event:OrderPlaced", KDDKind::Event, KDDLayer::Domain),
                node("UC:PlaceOrder", KDDKind::UseCase, KDDLayer::Behavior),
            ],
            vec![
                edge("Entity:Order", "Event:OrderPlaced", StructuralEdgeType::Emits, false),
                edge("UC:PlaceOrder", "Entity:Order", StructuralEdgeType::WikiLink, false),
            ],
        );

        let reached = store.traverse("UC:PlaceOrder", 2, true);
        let ids: HashSet<String> = reached.iter().map(|(n, _)| n.id.clone()).collect();
        assert!(ids.contains("Entity:Order"));
        assert!(ids.contains("Event:OrderPlaced"));
    }

    #[test]
    fn respect_layers_excludes_violating_edges() {
        let mut store = PetgraphGraphStore::new();
        store.load(
            vec![
                node("Entity:Order", KDDKind::Entity, KDDLayer::Domain),
                node("REQ:REQ-001", KDDKind::Requirement, KDDLayer::Verification),
            ],
            vec![edge("Entity:Order", "REQ:REQ-001", StructuralEdgeType::WikiLink, true)],
        );

        let violations = store.find_violations();
        assert_eq!(violations.len(), 1);

        let reached = store.traverse("Entity:Order", 2, true);
        assert!(reached.is_empty());
    }

    #[test]
    fn reverse_traverse_finds_dependents() {
        let mut store = PetgraphGraphStore::new();
        store.load(
            vec![
                node("Entity:Order", KDDKind::Entity, KDDLayer::Domain),
                node("BR:OrderTotal", KDDKind::BusinessRule, KDDLayer::Domain),
            ],
            vec![edge("BR:OrderTotal", "Entity:Order", StructuralEdgeType::EntityRule, false)],
        );

        let dependents = store.reverse_traverse("Entity:Order", 2);
        assert_eq!(dependents.len(), 1);
        assert_eq!(dependents[0].0.id, "BR:OrderTotal");
    }
}

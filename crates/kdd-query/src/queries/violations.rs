//! QRY-006 Layer Violations: enumerate every edge that crosses layers in
//! the wrong direction, optionally filtered by kind or layer.

use kdd_core::{GraphStore, KDDKind, KDDLayer, KddResult, LayerViolation};

#[derive(Debug, Clone, serde::Serialize)]
pub struct ViolationsReport {
    pub violations: Vec<LayerViolation>,
    pub total_edges: usize,
    pub violation_rate: f64,
}

pub fn layer_violations(graph: &dyn GraphStore, kind_filter: &[KDDKind], layer_filter: &[KDDLayer]) -> KddResult<ViolationsReport> {
    let all_violations = graph.find_violations();
    let total_edges = graph.all_edges().len();

    let violations: Vec<LayerViolation> = all_violations
        .into_iter()
        .filter(|v| {
            let kind_ok = kind_filter.is_empty() || endpoint_kind_matches(graph, &v.from_node, kind_filter) || endpoint_kind_matches(graph, &v.to_node, kind_filter);
            let layer_ok = layer_filter.is_empty() || layer_filter.contains(&v.from_layer) || layer_filter.contains(&v.to_layer);
            kind_ok && layer_ok
        })
        .collect();

    let violation_rate = if total_edges == 0 { 0.0 } else { ((violations.len() as f64 / total_edges as f64) * 100.0 * 100.0).round() / 100.0 };

    Ok(ViolationsReport { violations, total_edges, violation_rate })
}

/// A node lookup failure defaults to `01-domain`/`entity` per spec, but since
/// `LayerViolation` already carries each endpoint's layer directly from the
/// edge, this only needs the node's kind — which does require the lookup.
fn endpoint_kind_matches(graph: &dyn GraphStore, node_id: &str, kind_filter: &[KDDKind]) -> bool {
    match graph.get_node(node_id) {
        Some(node) => kind_filter.contains(&node.kind),
        None => kind_filter.contains(&KDDKind::Entity),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph_store::PetgraphGraphStore;
    use kdd_core::{EdgeType, ExtractionMethod, GraphEdge, GraphNode, StructuralEdgeType};
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

    fn edge(from: &str, to: &str, layer_violation: bool) -> GraphEdge {
        GraphEdge {
            from_node: from.to_string(),
            to_node: to.to_string(),
            edge_type: EdgeType::Structural(StructuralEdgeType::WikiLink),
            source_file: format!("{from}.md"),
            extraction_method: ExtractionMethod::WikiLink,
            metadata: HashMap::new(),
            layer_violation,
            bidirectional: false,
        }
    }

    #[test]
    fn reports_rate_and_filters_by_kind() {
        let mut store = PetgraphGraphStore::new();
        store.load(
            vec![node("Entity:Order", KDDKind::Entity, KDDLayer::Domain), node("REQ:REQ-001", KDDKind::Requirement, KDDLayer::Verification), node("Event:X", KDDKind::Event, KDDLayer::Domain)],
            vec![edge("Entity:Order", "REQ:REQ-001", true), edge("Entity:Order", "Event:X", false)],
        );

        let report = layer_violations(&store, &[], &[]).unwrap();
        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.total_edges, 2);
        assert_eq!(report.violation_rate, 50.0);

        let filtered = layer_violations(&store, &[KDDKind::Requirement], &[]).unwrap();
        assert_eq!(filtered.violations.len(), 1);

        let none_match = layer_violations(&store, &[KDDKind::Command], &[]).unwrap();
        assert!(none_match.violations.is_empty());
    }
}

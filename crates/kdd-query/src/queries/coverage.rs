//! QRY-005 Governance Coverage: does this node have the neighbors its kind
//! is expected to have (emitted events, applied rules, traced requirements…).

use kdd_core::{ErrorCode, GraphStore, KDDKind, KddError, KddResult, StructuralEdgeType};

use crate::loader::node_not_found;

#[derive(Debug, Clone, serde::Serialize)]
pub struct CoverageCategory {
    pub category: String,
    pub edge_type: String,
    pub status: String,
    pub neighbors: Vec<String>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct GovernanceCoverage {
    pub node_id: String,
    pub categories: Vec<CoverageCategory>,
    pub coverage_percent: f64,
}

fn coverage_rules(kind: KDDKind) -> Option<Vec<(&'static str, StructuralEdgeType)>> {
    match kind {
        KDDKind::Entity => Some(vec![("events", StructuralEdgeType::Emits), ("business_rules", StructuralEdgeType::EntityRule), ("use_cases", StructuralEdgeType::WikiLink)]),
        KDDKind::Command => Some(vec![("events", StructuralEdgeType::Emits), ("use_cases", StructuralEdgeType::UcExecutesCmd)]),
        KDDKind::UseCase => Some(vec![("commands", StructuralEdgeType::UcExecutesCmd), ("rules", StructuralEdgeType::UcAppliesRule), ("requirements", StructuralEdgeType::ReqTracesTo)]),
        KDDKind::BusinessRule => Some(vec![("entity", StructuralEdgeType::EntityRule), ("use_cases", StructuralEdgeType::UcAppliesRule)]),
        KDDKind::Requirement => Some(vec![("traces", StructuralEdgeType::ReqTracesTo)]),
        _ => None,
    }
}

pub fn governance_coverage(graph: &dyn GraphStore, node_id: &str) -> KddResult<GovernanceCoverage> {
    let node = graph.get_node(node_id).ok_or_else(|| node_not_found(node_id))?;
    let Some(rules) = coverage_rules(node.kind) else {
        return Err(KddError::new(ErrorCode::UnknownKind, format!("no coverage rules for kind {}", node.kind.as_str())));
    };

    let mut categories = Vec::new();
    let mut present = 0u32;
    let mut missing = 0u32;

    for (category, edge_type) in rules {
        let type_str = edge_type.as_str();
        let mut neighbors: Vec<String> = Vec::new();

        for edge in graph.incoming_edges(node_id).into_iter().chain(graph.outgoing_edges(node_id)) {
            if edge.edge_type.as_str() != type_str {
                continue;
            }
            let other = if edge.from_node == node_id { edge.to_node.clone() } else { edge.from_node.clone() };
            if !neighbors.contains(&other) {
                neighbors.push(other);
            }
        }

        let status = if neighbors.is_empty() {
            missing += 1;
            "missing"
        } else {
            present += 1;
            "covered"
        };

        categories.push(CoverageCategory { category: category.to_string(), edge_type: type_str.to_string(), status: status.to_string(), neighbors });
    }

    let total = present + missing;
    let coverage_percent = if total == 0 { 0.0 } else { ((present as f64 / total as f64) * 100.0 * 10.0).round() / 10.0 };

    Ok(GovernanceCoverage { node_id: node_id.to_string(), categories, coverage_percent })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph_store::PetgraphGraphStore;
    use kdd_core::{EdgeType, ExtractionMethod, GraphEdge, GraphNode, KDDLayer};
    use std::collections::HashMap;

    fn node(id: &str, kind: KDDKind) -> GraphNode {
        GraphNode {
            id: id.to_string(),
            kind,
            source_file: format!("{id}.md"),
            source_hash: "h".to_string(),
            layer: KDDLayer::Domain,
            status: "draft".to_string(),
            aliases: Vec::new(),
            domain: None,
            indexed_fields: HashMap::new(),
            indexed_at: None,
        }
    }

    fn edge(from: &str, to: &str, edge_type: StructuralEdgeType) -> GraphEdge {
        GraphEdge {
            from_node: from.to_string(),
            to_node: to.to_string(),
            edge_type: EdgeType::Structural(edge_type),
            source_file: format!("{from}.md"),
            extraction_method: ExtractionMethod::WikiLink,
            metadata: HashMap::new(),
            layer_violation: false,
            bidirectional: false,
        }
    }

    #[test]
    fn entity_with_one_of_three_categories_covered_scores_one_third() {
        let mut store = PetgraphGraphStore::new();
        store.load(
            vec![node("Entity:Order", KDDKind::Entity), node("Event:OrderPlaced", KDDKind::Event)],
            vec![edge("Entity:Order", "Event:OrderPlaced", StructuralEdgeType::Emits)],
        );

        let coverage = governance_coverage(&store, "Entity:Order").unwrap();
        assert_eq!(coverage.categories.len(), 3);
        let events = coverage.categories.iter().find(|c| c.category == "events").unwrap();
        assert_eq!(events.status, "covered");
        let rules = coverage.categories.iter().find(|c| c.category == "business_rules").unwrap();
        assert_eq!(rules.status, "missing");
        assert_eq!(coverage.coverage_percent, 33.3);
    }

    #[test]
    fn kind_without_a_coverage_table_is_unknown_kind() {
        let mut store = PetgraphGraphStore::new();
        store.load(vec![node("ADR:001", KDDKind::Adr)], vec![]);
        let err = governance_coverage(&store, "ADR:001").unwrap_err();
        assert_eq!(err.code, ErrorCode::UnknownKind);
    }
}

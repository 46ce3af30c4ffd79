//! QRY-004 Impact Analysis: who breaks if this node changes.

use kdd_core::{GraphStore, KddResult, StructuralEdgeType};

use crate::loader::node_not_found;

/// One directly-affected dependent: the node, the edge type that connects
/// it, and a human-readable reason.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DirectImpact {
    pub node_id: String,
    pub edge_type: String,
    pub description: String,
}

/// One transitively-affected dependent with the path back to the queried node.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TransitiveImpact {
    pub node_id: String,
    pub path: Vec<String>,
    pub edge_types: Vec<String>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ScenarioImpact {
    pub node_id: String,
    pub reason: String,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ImpactAnalysis {
    pub node_id: String,
    pub change_type: String,
    pub direct: Vec<DirectImpact>,
    pub transitive: Vec<TransitiveImpact>,
    pub scenarios_to_rerun: Vec<ScenarioImpact>,
}

fn describe(edge_type: &str) -> &'static str {
    match edge_type {
        "ENTITY_RULE" => "Business rule validates this entity",
        "UC_APPLIES_RULE" => "Use case applies this rule",
        "UC_EXECUTES_CMD" => "Use case executes this command",
        "EMITS" => "Emits this event",
        "CONSUMES" => "Consumes this event",
        "WIKI_LINK" => "References this artifact",
        "DOMAIN_RELATION" => "Has a domain relationship",
        "REQ_TRACES_TO" => "Requirement traces to this artifact",
        "VALIDATES" => "Validates this artifact via BDD scenarios",
        _ => "",
    }
}

pub fn impact_analysis(graph: &dyn GraphStore, node_id: &str, depth: u32, change_type: Option<&str>) -> KddResult<ImpactAnalysis> {
    if !graph.has_node(node_id) {
        return Err(node_not_found(node_id));
    }
    let change_type = change_type.unwrap_or("modify_attribute").to_string();

    let direct_edges = graph.incoming_edges(node_id);
    let mut direct_ids: std::collections::HashSet<String> = std::collections::HashSet::new();
    let direct: Vec<DirectImpact> = direct_edges
        .iter()
        .map(|edge| {
            direct_ids.insert(edge.from_node.clone());
            let type_str = edge.edge_type.as_str();
            let desc = describe(type_str);
            let description = if desc.is_empty() {
                format!("Connected via {type_str} — change type: {change_type}")
            } else {
                format!("{desc} — change type: {change_type}")
            };
            DirectImpact { node_id: edge.from_node.clone(), edge_type: type_str.to_string(), description }
        })
        .collect();

    let transitive = transitive_impact(graph, node_id, depth, &direct_ids);

    let mut affected: std::collections::HashSet<String> = direct_ids.clone();
    affected.insert(node_id.to_string());
    affected.extend(transitive.iter().map(|t| t.node_id.clone()));

    let mut scenarios_to_rerun = Vec::new();
    for edge in graph.all_edges() {
        if edge.edge_type.as_str() != StructuralEdgeType::Validates.as_str() {
            continue;
        }
        if affected.contains(&edge.to_node) {
            scenarios_to_rerun.push(ScenarioImpact { node_id: edge.from_node.clone(), reason: format!("Validates {} which is affected", edge.to_node) });
        }
    }

    Ok(ImpactAnalysis { node_id: node_id.to_string(), change_type, direct, transitive, scenarios_to_rerun })
}

fn transitive_impact(graph: &dyn GraphStore, root: &str, depth: u32, _direct_ids: &std::collections::HashSet<String>) -> Vec<TransitiveImpact> {
    use std::collections::{HashMap, VecDeque};

    // Traversal passes through the direct layer without re-reporting it —
    // only `dist > 1` nodes count as transitive — but direct nodes must
    // still be visited and expanded so deeper dependents are reachable.
    let mut visited: std::collections::HashSet<String> = std::collections::HashSet::from([root.to_string()]);

    let mut path_of: HashMap<String, (Vec<String>, Vec<String>)> = HashMap::new();
    let mut results = Vec::new();
    let mut queue: VecDeque<(String, u32)> = VecDeque::from([(root.to_string(), 0)]);

    while let Some((current, dist)) = queue.pop_front() {
        if dist >= depth {
            continue;
        }
        for edge in graph.incoming_edges(&current) {
            let pred = edge.from_node.clone();
            if visited.contains(&pred) {
                continue;
            }
            visited.insert(pred.clone());

            let (parent_path, parent_edges) = path_of.get(&current).cloned().unwrap_or((vec![root.to_string()], Vec::new()));
            let mut path = parent_path.clone();
            path.push(pred.clone());
            let mut edge_types = parent_edges.clone();
            edge_types.push(edge.edge_type.as_str().to_string());

            if dist + 1 > 1 {
                results.push(TransitiveImpact { node_id: pred.clone(), path: path.clone(), edge_types: edge_types.clone() });
            }
            path_of.insert(pred.clone(), (path, edge_types));
            queue.push_back((pred, dist + 1));
        }
    }

    results
}

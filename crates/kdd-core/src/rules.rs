//! The five pure business rules: kind routing, embeddable sections, index-level
//! detection, layer-violation detection, and merge-conflict resolution.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use crate::model::{IndexLevel, KDDKind, KDDLayer};

/// Outcome of routing a document's front-matter + path to a [`KDDKind`].
#[derive(Debug, Clone, PartialEq)]
pub struct RouteResult {
    pub kind: Option<KDDKind>,
    pub warning: Option<String>,
}

/// Given front-matter and a repo-relative source path, determine the document's
/// kind. Unrecognized or missing `kind` values skip silently (`kind: None`); a
/// recognized kind outside its expected folder is still accepted, with a warning.
pub fn route_document(front_matter: &HashMap<String, serde_json::Value>, source_path: &str) -> RouteResult {
    let Some(raw_kind) = front_matter.get("kind").and_then(|v| v.as_str()) else {
        return RouteResult { kind: None, warning: None };
    };
    let Some(kind) = KDDKind::from_str_loose(raw_kind) else {
        return RouteResult { kind: None, warning: None };
    };

    let expected_prefix = kind.expected_path_prefix();
    let warning = if !source_path.contains(expected_prefix) {
        Some(format!(
            "{} is expected under {} but found at {}",
            kind, expected_prefix, source_path
        ))
    } else {
        None
    };

    RouteResult { kind: Some(kind), warning }
}

/// The closed per-kind mapping of lowercased section-heading keywords that
/// should produce embeddings. `event` maps to the empty set.
pub fn embeddable_sections(kind: KDDKind) -> HashSet<&'static str> {
    let headings: &[&str] = match kind {
        KDDKind::Entity => &["descripción", "description"],
        KDDKind::Event => &[],
        KDDKind::BusinessRule => &["declaración", "declaration", "cuándo aplica", "when applies"],
        KDDKind::BusinessPolicy => &["declaración", "declaration"],
        KDDKind::CrossPolicy => &["propósito", "purpose", "declaración", "declaration"],
        KDDKind::Command => &["purpose", "propósito"],
        KDDKind::Query => &["purpose", "propósito"],
        KDDKind::Process => &["participantes", "participants", "pasos", "steps"],
        KDDKind::UseCase => &["descripción", "description", "flujo principal", "main flow"],
        KDDKind::UiView => &["descripción", "description", "comportamiento", "behavior"],
        KDDKind::UiComponent => &["descripción", "description"],
        KDDKind::Requirement => &["descripción", "description"],
        KDDKind::Objective => &["objetivo", "objective"],
        KDDKind::Prd => &["problema", "oportunidad", "problem", "opportunity"],
        KDDKind::Adr => &["contexto", "context", "decisión", "decision"],
    };
    headings.iter().copied().collect()
}

/// L3 requires both an embedding model and an agent API; L2 requires only the
/// former; otherwise L1. An agent API alone degrades to L1.
pub fn detect_index_level(embedding_model_available: bool, agent_api_available: bool) -> IndexLevel {
    if embedding_model_available && agent_api_available {
        IndexLevel::L3
    } else if embedding_model_available {
        IndexLevel::L2
    } else {
        IndexLevel::L1
    }
}

/// True iff the origin is not `00-requirements` and its numeric layer index is
/// strictly less than the destination's.
pub fn is_layer_violation(origin: KDDLayer, destination: KDDLayer) -> bool {
    if origin == KDDLayer::Requirements {
        return false;
    }
    origin.numeric() < destination.numeric()
}

/// Outcome of resolving a node-ID conflict across multiple source indices.
#[derive(Debug, Clone, PartialEq)]
pub struct ConflictResult {
    /// Index into the candidate slice that won.
    pub winner_index: usize,
    pub reason: &'static str,
}

/// A candidate node contributed by one source index, as seen by the merge engine.
pub struct MergeCandidate<'a> {
    pub source_hash: &'a str,
    pub indexed_at: DateTime<Utc>,
}

/// Resolve a conflict among candidates for the same node ID. A single candidate
/// always wins trivially; identical `source_hash` values mean any candidate may
/// be picked; otherwise the candidate with the maximum `indexed_at` wins.
pub fn resolve_node_conflict(candidates: &[MergeCandidate<'_>]) -> ConflictResult {
    assert!(!candidates.is_empty(), "resolve_node_conflict requires at least one candidate");

    if candidates.len() == 1 {
        return ConflictResult { winner_index: 0, reason: "single" };
    }

    let first_hash = candidates[0].source_hash;
    if candidates.iter().all(|c| c.source_hash == first_hash) {
        return ConflictResult { winner_index: 0, reason: "identical" };
    }

    let winner_index = candidates
        .iter()
        .enumerate()
        .max_by_key(|(_, c)| c.indexed_at)
        .map(|(i, _)| i)
        .unwrap();

    ConflictResult { winner_index, reason: "last-write-wins" }
}

/// Outcome of resolving whether a node should be deleted during merge.
#[derive(Debug, Clone, PartialEq)]
pub struct DeletionResult {
    pub delete: bool,
    pub warning: Option<String>,
}

/// Delete-wins: if a node is absent from at least one source, it is removed
/// from the merged index. `present_in` is one flag per source; `modified_after_deletion`
/// flags whether another source touched the node after the deletion timestamp.
pub fn resolve_deletion(present_in: &[bool], modified_after_deletion: bool) -> DeletionResult {
    let delete = !present_in.iter().all(|&present| present);
    let warning = if delete && modified_after_deletion {
        Some("node was modified in another source after being deleted".to_string())
    } else {
        None
    };
    DeletionResult { delete, warning }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn front_matter(kind: &str) -> HashMap<String, serde_json::Value> {
        HashMap::from([("kind".to_string(), json!(kind))])
    }

    #[test]
    fn route_document_accepts_in_expected_path_with_no_warning() {
        let fm = front_matter("entity");
        let result = route_document(&fm, "specs/01-domain/entities/Order.md");
        assert_eq!(result.kind, Some(KDDKind::Entity));
        assert_eq!(result.warning, None);
    }

    #[test]
    fn route_document_warns_outside_expected_path() {
        let fm = front_matter("entity");
        let result = route_document(&fm, "specs/misc/Order.md");
        assert_eq!(result.kind, Some(KDDKind::Entity));
        assert!(result.warning.is_some());
    }

    #[test]
    fn route_document_skips_unknown_kind_silently() {
        let fm = front_matter("not-a-kind");
        let result = route_document(&fm, "specs/Order.md");
        assert_eq!(result.kind, None);
        assert_eq!(result.warning, None);
    }

    #[test]
    fn route_document_skips_missing_front_matter() {
        let fm = HashMap::new();
        let result = route_document(&fm, "specs/Order.md");
        assert_eq!(result.kind, None);
    }

    #[test]
    fn event_kind_has_no_embeddable_sections() {
        assert!(embeddable_sections(KDDKind::Event).is_empty());
    }

    #[test]
    fn entity_embeddable_sections_match_appendix() {
        let sections = embeddable_sections(KDDKind::Entity);
        assert!(sections.contains("descripción"));
        assert!(sections.contains("description"));
        assert_eq!(sections.len(), 2);
    }

    #[test]
    fn index_level_requires_both_for_l3() {
        assert_eq!(detect_index_level(true, true), IndexLevel::L3);
        assert_eq!(detect_index_level(true, false), IndexLevel::L2);
        assert_eq!(detect_index_level(false, true), IndexLevel::L1);
        assert_eq!(detect_index_level(false, false), IndexLevel::L1);
    }

    #[test]
    fn layer_violation_requires_non_requirements_origin() {
        assert!(!is_layer_violation(KDDLayer::Requirements, KDDLayer::Verification));
        assert!(is_layer_violation(KDDLayer::Domain, KDDLayer::Verification));
        assert!(!is_layer_violation(KDDLayer::Verification, KDDLayer::Domain));
        assert!(!is_layer_violation(KDDLayer::Domain, KDDLayer::Domain));
    }

    #[test]
    fn merge_conflict_single_candidate_wins_trivially() {
        let candidates = [MergeCandidate { source_hash: "a", indexed_at: Utc::now() }];
        let result = resolve_node_conflict(&candidates);
        assert_eq!(result, ConflictResult { winner_index: 0, reason: "single" });
    }

    #[test]
    fn merge_conflict_identical_hashes_accept_any() {
        let now = Utc::now();
        let candidates = [
            MergeCandidate { source_hash: "a", indexed_at: now },
            MergeCandidate { source_hash: "a", indexed_at: now },
        ];
        let result = resolve_node_conflict(&candidates);
        assert_eq!(result.reason, "identical");
    }

    #[test]
    fn merge_conflict_last_write_wins() {
        use chrono::TimeZone;
        let earlier = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let candidates = [
            MergeCandidate { source_hash: "a", indexed_at: earlier },
            MergeCandidate { source_hash: "b", indexed_at: later },
        ];
        let result = resolve_node_conflict(&candidates);
        assert_eq!(result, ConflictResult { winner_index: 1, reason: "last-write-wins" });
    }

    #[test]
    fn deletion_is_delete_wins() {
        assert!(resolve_deletion(&[true, false], false).delete);
        assert!(!resolve_deletion(&[true, true], false).delete);
    }

    #[test]
    fn deletion_warns_on_post_deletion_modification() {
        let result = resolve_deletion(&[true, false], true);
        assert!(result.delete);
        assert!(result.warning.is_some());
    }
}

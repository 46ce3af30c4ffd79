//! CMD-004 — merges two or more `.kdd-index/` directories into one, validating
//! manifest compatibility and resolving node conflicts via
//! [`kdd_core::resolve_node_conflict`] (last-write-wins / identical-hash).

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use kdd_core::{
    ArtifactStore, ErrorCode, GraphEdge, GraphNode, IndexLevel, IndexManifest, IndexStats, KddError,
    KddResult, MergeCandidate, resolve_node_conflict,
};

use crate::artifact::FilesystemArtifactStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictStrategy {
    LastWriteWins,
    FailOnConflict,
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct MergeResult {
    pub success: bool,
    pub total_nodes: usize,
    pub total_edges: usize,
    pub total_embeddings: usize,
    pub conflicts_resolved: usize,
    pub error: Option<String>,
}

fn failure(error: impl Into<String>) -> MergeResult {
    MergeResult { error: Some(error.into()), ..Default::default() }
}

/// Merge `source_paths` (at least 2, per INSUFFICIENT_SOURCES) into `output_path`.
pub fn merge_index(
    source_paths: &[std::path::PathBuf],
    output_path: &std::path::Path,
    strategy: ConflictStrategy,
) -> MergeResult {
    if source_paths.len() < 2 {
        return failure("INSUFFICIENT_SOURCES: need at least 2 indices");
    }

    let mut sources: Vec<(FilesystemArtifactStore, IndexManifest)> = Vec::new();
    for path in source_paths {
        let store = FilesystemArtifactStore::new(path.clone());
        let manifest = match store.read_manifest() {
            Ok(m) => m,
            Err(_) => return failure(format!("MANIFEST_NOT_FOUND: {}", path.display())),
        };
        sources.push((store, manifest));
    }

    if let Err(e) = validate_compatibility(sources.iter().map(|(_, m)| m).collect()) {
        return failure(e);
    }

    let mut all_nodes_by_id: HashMap<String, Vec<(usize, GraphNode)>> = HashMap::new();
    for (idx, (store, _)) in sources.iter().enumerate() {
        let nodes = match store.read_all_nodes() {
            Ok(n) => n,
            Err(e) => return failure(e.to_string()),
        };
        for node in nodes {
            all_nodes_by_id.entry(node.id.clone()).or_default().push((idx, node));
        }
    }

    let mut merged_nodes: Vec<GraphNode> = Vec::new();
    let mut winner_source: HashMap<String, usize> = HashMap::new();
    let mut conflicts = 0usize;

    for (node_id, candidates) in &all_nodes_by_id {
        if candidates.len() == 1 {
            merged_nodes.push(candidates[0].1.clone());
            winner_source.insert(node_id.clone(), candidates[0].0);
            continue;
        }

        let hashes: HashSet<&str> = candidates.iter().map(|(_, n)| n.source_hash.as_str()).collect();
        if hashes.len() == 1 {
            merged_nodes.push(candidates[0].1.clone());
            winner_source.insert(node_id.clone(), candidates[0].0);
            continue;
        }

        if strategy == ConflictStrategy::FailOnConflict {
            return failure(format!("CONFLICT_REJECTED: conflict on node {node_id}"));
        }

        let merge_candidates: Vec<MergeCandidate<'_>> = candidates
            .iter()
            .map(|(_, n)| MergeCandidate {
                source_hash: &n.source_hash,
                indexed_at: n.indexed_at.unwrap_or(DateTime::<Utc>::MIN_UTC),
            })
            .collect();
        let result = resolve_node_conflict(&merge_candidates);
        let (winner_idx, winner_node) = &candidates[result.winner_index];
        merged_nodes.push(winner_node.clone());
        winner_source.insert(node_id.clone(), *winner_idx);
        conflicts += 1;
    }

    let merged_node_ids: HashSet<&str> = merged_nodes.iter().map(|n| n.id.as_str()).collect();

    let mut seen_edges: HashSet<(String, String, String)> = HashSet::new();
    let mut merged_edges: Vec<GraphEdge> = Vec::new();
    for (store, _) in &sources {
        let edges = match store.read_edges() {
            Ok(e) => e,
            Err(e) => return failure(e.to_string()),
        };
        for edge in edges {
            if !merged_node_ids.contains(edge.from_node.as_str()) || !merged_node_ids.contains(edge.to_node.as_str()) {
                continue;
            }
            if seen_edges.insert(edge.identity()) {
                merged_edges.push(edge);
            }
        }
    }

    let mut merged_embeddings = Vec::new();
    for node in &merged_nodes {
        let doc_id = node.id.split_once(':').map(|(_, rest)| rest).unwrap_or(&node.id);
        let src_idx = *winner_source.get(&node.id).unwrap_or(&0);
        let Ok(embs) = sources[src_idx].0.read_embeddings(doc_id) else { continue };
        merged_embeddings.extend(embs);
    }

    let out_store = FilesystemArtifactStore::new(output_path.to_path_buf());
    for node in &merged_nodes {
        if let Err(e) = out_store.write_node(node) {
            return failure(e.to_string());
        }
    }
    if !merged_edges.is_empty() {
        if let Err(e) = out_store.append_edges(&merged_edges) {
            return failure(e.to_string());
        }
    }
    if !merged_embeddings.is_empty() {
        let by_doc: HashMap<String, Vec<kdd_core::Embedding>> =
            merged_embeddings.into_iter().fold(HashMap::new(), |mut acc, emb| {
                acc.entry(emb.document_id.clone()).or_default().push(emb);
                acc
            });
        for (doc_id, embs) in &by_doc {
            if let Err(e) = out_store.write_embeddings(doc_id, embs) {
                return failure(e.to_string());
            }
        }
    }

    let levels: Vec<IndexLevel> = sources.iter().map(|(_, m)| m.index_level).collect();
    let merged_level = if levels.iter().all(|l| *l == IndexLevel::L3) {
        IndexLevel::L3
    } else if levels.iter().all(|l| matches!(l, IndexLevel::L2 | IndexLevel::L3)) {
        IndexLevel::L2
    } else {
        IndexLevel::L1
    };

    let (emb_model, emb_dims) = sources
        .iter()
        .find_map(|(_, m)| m.embedding_model.clone().map(|model| (Some(model), m.embedding_dimensions)))
        .unwrap_or((None, None));

    let manifest = IndexManifest {
        version: "1.0.0".to_string(),
        kdd_version: "1.0.0".to_string(),
        embedding_model: emb_model,
        embedding_dimensions: emb_dims,
        indexed_at: Utc::now(),
        indexed_by: "kdd-merge".to_string(),
        structure: "single-domain".to_string(),
        index_level: merged_level,
        stats: IndexStats {
            nodes: merged_nodes.len(),
            edges: merged_edges.len(),
            embeddings: by_doc_embedding_count(output_path, &out_store),
            enrichments: 0,
        },
        domains: Vec::new(),
        git_commit: None,
    };
    if let Err(e) = out_store.write_manifest(&manifest) {
        return failure(e.to_string());
    }

    MergeResult {
        success: true,
        total_nodes: merged_nodes.len(),
        total_edges: merged_edges.len(),
        total_embeddings: manifest.stats.embeddings,
        conflicts_resolved: conflicts,
        error: None,
    }
}

fn by_doc_embedding_count(_output_path: &std::path::Path, store: &FilesystemArtifactStore) -> usize {
    store.read_all_embeddings().map(|e| e.len()).unwrap_or(0)
}

fn validate_compatibility(manifests: Vec<&IndexManifest>) -> KddResult<()> {
    let majors: HashSet<&str> = manifests.iter().filter_map(|m| m.major_version()).collect();
    if majors.len() > 1 {
        return Err(KddError::new(
            ErrorCode::IncompatibleVersion,
            format!("major versions differ: {majors:?}"),
        ));
    }

    let models: HashSet<&str> = manifests.iter().filter_map(|m| m.embedding_model.as_deref()).collect();
    if models.len() > 1 {
        return Err(KddError::new(
            ErrorCode::IncompatibleEmbeddingModel,
            format!("embedding models differ: {models:?}"),
        ));
    }

    let structures: HashSet<&str> = manifests.iter().map(|m| m.structure.as_str()).collect();
    if structures.len() > 1 {
        return Err(KddError::new(
            ErrorCode::IncompatibleStructure,
            format!("structures differ: {structures:?}"),
        ));
    }

    Ok(())
}

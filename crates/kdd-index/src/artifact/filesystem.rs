//! Filesystem [`ArtifactStore`] adapter: reads and writes the on-disk
//! `.kdd-index/` tree (manifest, nodes, edges, embeddings, enrichments).

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use kdd_core::{ArtifactStore, Embedding, ErrorCode, GraphEdge, GraphNode, IndexManifest, KddError, KddResult};

/// Reads/writes `.kdd-index/` artifacts on the local filesystem, laid out as:
///
/// ```text
/// .kdd-index/
/// ├── manifest.json
/// ├── nodes/{kind}/{id}.json
/// ├── edges/edges.jsonl
/// ├── embeddings/{kind}/{doc_id}.json
/// └── enrichments/{doc_id}.json
/// ```
pub struct FilesystemArtifactStore {
    root: PathBuf,
}

impl FilesystemArtifactStore {
    pub fn new(index_path: impl Into<PathBuf>) -> Self {
        Self { root: index_path.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn manifest_path(&self) -> PathBuf {
        self.root.join("manifest.json")
    }

    fn node_dir(&self, kind_value: &str) -> PathBuf {
        self.root.join("nodes").join(kind_value)
    }

    fn node_path(&self, node: &GraphNode) -> PathBuf {
        let doc_id = strip_kind_prefix(&node.id);
        self.node_dir(node.kind.as_str()).join(format!("{doc_id}.json"))
    }

    fn edges_path(&self) -> PathBuf {
        self.root.join("edges").join("edges.jsonl")
    }

    fn embedding_path(&self, kind_value: &str, document_id: &str) -> PathBuf {
        self.root.join("embeddings").join(kind_value).join(format!("{document_id}.json"))
    }

    fn enrichment_path(&self, document_id: &str) -> PathBuf {
        self.root.join("enrichments").join(format!("{document_id}.json"))
    }

    fn find_node_path(&self, node_id: &str) -> Option<PathBuf> {
        let doc_id = strip_kind_prefix(node_id);
        let nodes_dir = self.root.join("nodes");
        for entry in fs::read_dir(&nodes_dir).ok()?.flatten() {
            if !entry.path().is_dir() {
                continue;
            }
            let candidate = entry.path().join(format!("{doc_id}.json"));
            if candidate.exists() {
                return Some(candidate);
            }
        }
        None
    }
}

fn strip_kind_prefix(node_id: &str) -> &str {
    node_id.split_once(':').map(|(_, rest)| rest).unwrap_or(node_id)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> KddResult<T> {
    let text = fs::read_to_string(path)
        .map_err(|e| KddError::new(ErrorCode::ManifestNotFound, format!("{}: {e}", path.display())))?;
    serde_json::from_str(&text).map_err(|e| KddError::new(ErrorCode::ManifestNotFound, format!("{}: {e}", path.display())))
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> KddResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| KddError::new(ErrorCode::ManifestNotFound, format!("{}: {e}", parent.display())))?;
    }
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| KddError::new(ErrorCode::ManifestNotFound, e.to_string()))?;
    fs::write(path, text).map_err(|e| KddError::new(ErrorCode::ManifestNotFound, format!("{}: {e}", path.display())))
}

impl ArtifactStore for FilesystemArtifactStore {
    fn write_manifest(&self, manifest: &IndexManifest) -> KddResult<()> {
        write_json(&self.manifest_path(), manifest)
    }

    fn read_manifest(&self) -> KddResult<IndexManifest> {
        let path = self.manifest_path();
        if !path.exists() {
            return Err(KddError::new(ErrorCode::ManifestNotFound, format!("no manifest at {}", path.display())));
        }
        read_json(&path)
    }

    fn write_node(&self, node: &GraphNode) -> KddResult<()> {
        write_json(&self.node_path(node), node)
    }

    fn read_node(&self, node_id: &str) -> KddResult<GraphNode> {
        let path = self.find_node_path(node_id).ok_or_else(|| KddError::node_not_found(node_id))?;
        read_json(&path)
    }

    fn read_all_nodes(&self) -> KddResult<Vec<GraphNode>> {
        let nodes_dir = self.root.join("nodes");
        if !nodes_dir.exists() {
            return Ok(Vec::new());
        }
        let mut nodes = Vec::new();
        let mut kind_dirs: Vec<PathBuf> = fs::read_dir(&nodes_dir)
            .map_err(|e| KddError::new(ErrorCode::ManifestNotFound, e.to_string()))?
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.is_dir())
            .collect();
        kind_dirs.sort();
        for kind_dir in kind_dirs {
            let mut files: Vec<PathBuf> = fs::read_dir(&kind_dir)
                .map_err(|e| KddError::new(ErrorCode::ManifestNotFound, e.to_string()))?
                .flatten()
                .map(|e| e.path())
                .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
                .collect();
            files.sort();
            for file in files {
                nodes.push(read_json(&file)?);
            }
        }
        Ok(nodes)
    }

    fn append_edges(&self, edges: &[GraphEdge]) -> KddResult<()> {
        if edges.is_empty() {
            return Ok(());
        }
        let path = self.edges_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| KddError::new(ErrorCode::ManifestNotFound, e.to_string()))?;
        }
        let mut existing = if path.exists() {
            fs::read_to_string(&path).map_err(|e| KddError::new(ErrorCode::ManifestNotFound, e.to_string()))?
        } else {
            String::new()
        };
        for edge in edges {
            let line = serde_json::to_string(edge).map_err(|e| KddError::new(ErrorCode::ManifestNotFound, e.to_string()))?;
            existing.push_str(&line);
            existing.push('\n');
        }
        fs::write(&path, existing).map_err(|e| KddError::new(ErrorCode::ManifestNotFound, e.to_string()))
    }

    fn read_edges(&self) -> KddResult<Vec<GraphEdge>> {
        let path = self.edges_path();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let text = fs::read_to_string(&path).map_err(|e| KddError::new(ErrorCode::ManifestNotFound, e.to_string()))?;
        text.lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| serde_json::from_str(l).map_err(|e| KddError::new(ErrorCode::ManifestNotFound, e.to_string())))
            .collect()
    }

    fn rewrite_edges(&self, edges: &[GraphEdge]) -> KddResult<()> {
        let path = self.edges_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| KddError::new(ErrorCode::ManifestNotFound, e.to_string()))?;
        }
        let mut body = String::new();
        for edge in edges {
            let line = serde_json::to_string(edge).map_err(|e| KddError::new(ErrorCode::ManifestNotFound, e.to_string()))?;
            body.push_str(&line);
            body.push('\n');
        }
        fs::write(&path, body).map_err(|e| KddError::new(ErrorCode::ManifestNotFound, e.to_string()))
    }

    fn write_embeddings(&self, document_id: &str, embeddings: &[Embedding]) -> KddResult<()> {
        if embeddings.is_empty() {
            return Ok(());
        }
        let kind_value = embeddings[0].document_kind.as_str();
        write_json(&self.embedding_path(kind_value, document_id), &embeddings.to_vec())
    }

    fn read_embeddings(&self, document_id: &str) -> KddResult<Vec<Embedding>> {
        let emb_dir = self.root.join("embeddings");
        if !emb_dir.exists() {
            return Ok(Vec::new());
        }
        let mut results = Vec::new();
        for entry in fs::read_dir(&emb_dir).map_err(|e| KddError::new(ErrorCode::ManifestNotFound, e.to_string()))?.flatten() {
            if !entry.path().is_dir() {
                continue;
            }
            let candidate = entry.path().join(format!("{document_id}.json"));
            if candidate.exists() {
                let mut batch: Vec<Embedding> = read_json(&candidate)?;
                results.append(&mut batch);
            }
        }
        Ok(results)
    }

    fn read_all_embeddings(&self) -> KddResult<Vec<Embedding>> {
        let emb_dir = self.root.join("embeddings");
        if !emb_dir.exists() {
            return Ok(Vec::new());
        }
        let mut results = Vec::new();
        for entry in fs::read_dir(&emb_dir).map_err(|e| KddError::new(ErrorCode::ManifestNotFound, e.to_string()))?.flatten() {
            if !entry.path().is_dir() {
                continue;
            }
            let mut files: Vec<PathBuf> = fs::read_dir(entry.path())
                .map_err(|e| KddError::new(ErrorCode::ManifestNotFound, e.to_string()))?
                .flatten()
                .map(|e| e.path())
                .collect();
            files.sort();
            for file in files {
                let mut batch: Vec<Embedding> = read_json(&file)?;
                results.append(&mut batch);
            }
        }
        Ok(results)
    }

    fn write_enrichment(&self, document_id: &str, enrichment: &serde_json::Value) -> KddResult<()> {
        write_json(&self.enrichment_path(document_id), enrichment)
    }

    fn read_enrichment(&self, document_id: &str) -> KddResult<Option<serde_json::Value>> {
        let path = self.enrichment_path(document_id);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(read_json(&path)?))
    }

    fn delete_document_artifacts(&self, source_path: &str) -> KddResult<()> {
        // `source_path` is the document's repo-relative source path (what
        // incremental indexing tracks via git diff), not the bare doc-id
        // filename stem — a node's own `source_file` is the only reliable
        // join key, so find the node that way rather than guessing a path.
        let nodes_dir = self.root.join("nodes");
        let mut removed: Option<(String, String)> = None; // (node_id, doc_id)
        if nodes_dir.exists() {
            'search: for entry in fs::read_dir(&nodes_dir).map_err(|e| KddError::new(ErrorCode::ManifestNotFound, e.to_string()))?.flatten() {
                if !entry.path().is_dir() {
                    continue;
                }
                let mut files: Vec<PathBuf> = fs::read_dir(entry.path())
                    .map_err(|e| KddError::new(ErrorCode::ManifestNotFound, e.to_string()))?
                    .flatten()
                    .map(|e| e.path())
                    .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
                    .collect();
                files.sort();
                for file in files {
                    let node: GraphNode = read_json(&file)?;
                    if node.source_file == source_path {
                        let doc_id = strip_kind_prefix(&node.id).to_string();
                        removed = Some((node.id, doc_id));
                        fs::remove_file(&file).map_err(|e| KddError::new(ErrorCode::ManifestNotFound, e.to_string()))?;
                        if fs::read_dir(entry.path()).map(|mut d| d.next().is_none()).unwrap_or(false) {
                            let _ = fs::remove_dir(entry.path());
                        }
                        break 'search;
                    }
                }
            }
        }

        let Some((node_id, doc_id)) = removed else {
            return Ok(());
        };

        let remaining: Vec<GraphEdge> = self
            .read_edges()?
            .into_iter()
            .filter(|e| e.from_node != node_id && e.to_node != node_id)
            .collect();
        self.rewrite_edges(&remaining)?;

        let emb_dir = self.root.join("embeddings");
        if emb_dir.exists() {
            for entry in fs::read_dir(&emb_dir).map_err(|e| KddError::new(ErrorCode::ManifestNotFound, e.to_string()))?.flatten() {
                if !entry.path().is_dir() {
                    continue;
                }
                let candidate = entry.path().join(format!("{doc_id}.json"));
                if candidate.exists() {
                    fs::remove_file(&candidate).map_err(|e| KddError::new(ErrorCode::ManifestNotFound, e.to_string()))?;
                    if fs::read_dir(entry.path()).map(|mut d| d.next().is_none()).unwrap_or(false) {
                        let _ = fs::remove_dir(entry.path());
                    }
                }
            }
        }

        let enrichment_path = self.enrichment_path(&doc_id);
        if enrichment_path.exists() {
            fs::remove_file(&enrichment_path).map_err(|e| KddError::new(ErrorCode::ManifestNotFound, e.to_string()))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_node(id: &str) -> GraphNode {
        GraphNode {
            id: id.to_string(),
            kind: kdd_core::KDDKind::Entity,
            source_file: "specs/01-domain/entities/Order.md".into(),
            source_hash: "abc".into(),
            layer: kdd_core::KDDLayer::Domain,
            status: "draft".into(),
            aliases: Vec::new(),
            domain: None,
            indexed_fields: HashMap::new(),
            indexed_at: None,
        }
    }

    #[test]
    fn round_trips_node_and_manifest() {
        let dir = tempdir().unwrap();
        let store = FilesystemArtifactStore::new(dir.path());

        let node = sample_node("Entity:Order");
        store.write_node(&node).unwrap();
        let read_back = store.read_node("Entity:Order").unwrap();
        assert_eq!(read_back.id, "Entity:Order");

        assert!(store.read_manifest().is_err());
    }

    #[test]
    fn delete_document_artifacts_cascades_edges() {
        let dir = tempdir().unwrap();
        let store = FilesystemArtifactStore::new(dir.path());

        let node = sample_node("Entity:Order");
        store.write_node(&node).unwrap();
        store
            .append_edges(&[GraphEdge {
                from_node: "Entity:Order".into(),
                to_node: "Entity:Customer".into(),
                edge_type: kdd_core::EdgeType::Structural(kdd_core::StructuralEdgeType::WikiLink),
                source_file: "specs/01-domain/entities/Order.md".into(),
                extraction_method: kdd_core::ExtractionMethod::WikiLink,
                metadata: HashMap::new(),
                layer_violation: false,
                bidirectional: true,
            }])
            .unwrap();

        store.delete_document_artifacts("specs/01-domain/entities/Order.md").unwrap();
        assert!(store.read_node("Entity:Order").is_err());
        assert!(store.read_edges().unwrap().is_empty());
    }
}

//! Filesystem-copy [`Transport`] adapter (CMD-005): pushes and pulls derived
//! index artifacts to/from another `.kdd-index/`-shaped directory, standing
//! in for a shared server until a networked adapter is wired in. Built on
//! [`FilesystemArtifactStore`] so the on-disk layout is identical on both
//! ends of the "wire".

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use kdd_core::{ArtifactStore, Embedding, GraphEdge, GraphNode, IndexManifest, KddResult, PulledIndex, Transport};

use crate::artifact::FilesystemArtifactStore;

pub struct FilesystemTransport {
    remote_path: PathBuf,
}

impl FilesystemTransport {
    pub fn new(remote_path: impl Into<PathBuf>) -> Self {
        Self { remote_path: remote_path.into() }
    }
}

#[async_trait]
impl Transport for FilesystemTransport {
    async fn push(&self, manifest: &IndexManifest, nodes: &[GraphNode], edges: &[GraphEdge], embeddings: &[Embedding]) -> KddResult<()> {
        let remote = FilesystemArtifactStore::new(self.remote_path.clone());

        remote.write_manifest(manifest)?;
        for node in nodes {
            remote.write_node(node)?;
        }
        remote.rewrite_edges(edges)?;

        let mut by_document: HashMap<String, Vec<Embedding>> = HashMap::new();
        for embedding in embeddings {
            by_document.entry(embedding.document_id.clone()).or_default().push(embedding.clone());
        }
        for (document_id, document_embeddings) in &by_document {
            remote.write_embeddings(document_id, document_embeddings)?;
        }

        Ok(())
    }

    async fn pull(&self) -> KddResult<PulledIndex> {
        let remote = FilesystemArtifactStore::new(self.remote_path.clone());

        let manifest = remote.read_manifest()?;
        let nodes = remote.read_all_nodes()?;
        let edges = remote.read_edges()?;
        let embeddings = remote.read_all_embeddings()?;

        Ok(PulledIndex { manifest, nodes, edges, embeddings })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kdd_core::{IndexLevel, IndexStats, KDDKind, KDDLayer};
    use std::collections::HashMap as StdHashMap;
    use tempfile::tempdir;

    fn manifest() -> IndexManifest {
        IndexManifest {
            version: "1.0.0".to_string(),
            kdd_version: "1.0.0".to_string(),
            embedding_model: None,
            embedding_dimensions: None,
            indexed_at: chrono::Utc::now(),
            indexed_by: "test".to_string(),
            structure: "single-domain".to_string(),
            index_level: IndexLevel::L1,
            stats: IndexStats { nodes: 1, edges: 0, embeddings: 0, enrichments: 0 },
            domains: Vec::new(),
            git_commit: None,
        }
    }

    fn node() -> GraphNode {
        GraphNode {
            id: "Entity:Order".to_string(),
            kind: KDDKind::Entity,
            source_file: "Order.md".to_string(),
            source_hash: "h".to_string(),
            layer: KDDLayer::Domain,
            status: "draft".to_string(),
            aliases: Vec::new(),
            domain: None,
            indexed_fields: StdHashMap::new(),
            indexed_at: None,
        }
    }

    #[tokio::test]
    async fn push_then_pull_round_trips_the_index() {
        let dir = tempdir().unwrap();
        let transport = FilesystemTransport::new(dir.path().join("remote"));

        transport.push(&manifest(), &[node()], &[], &[]).await.unwrap();
        let pulled = transport.pull().await.unwrap();

        assert_eq!(pulled.nodes.len(), 1);
        assert_eq!(pulled.nodes[0].id, "Entity:Order");
        assert_eq!(pulled.manifest.indexed_by, "test");
    }

    #[tokio::test]
    async fn pull_before_any_push_fails() {
        let dir = tempdir().unwrap();
        let transport = FilesystemTransport::new(dir.path().join("remote"));
        assert!(transport.pull().await.is_err());
    }
}

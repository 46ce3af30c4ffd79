//! CMD-005 — synchronizes index artifacts between the local machine and a
//! shared server via the [`Transport`] port. Privacy guarantee (REQ-003):
//! only derived artifacts (`.kdd-index/`) ever cross the wire, never raw
//! spec source.

use std::collections::HashMap;

use kdd_core::{ArtifactStore, Transport};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncDirection {
    Push,
    Pull,
}

#[derive(Debug, Clone)]
pub struct SyncResult {
    pub success: bool,
    pub direction: SyncDirection,
    pub error: Option<String>,
}

impl SyncResult {
    fn failure(direction: SyncDirection, error: impl Into<String>) -> Self {
        Self { success: false, direction, error: Some(error.into()) }
    }

    fn success(direction: SyncDirection) -> Self {
        Self { success: true, direction, error: None }
    }
}

/// Push the local index to `transport`'s configured remote (CMD-005 push).
pub async fn sync_push(artifact_store: &dyn ArtifactStore, transport: &dyn Transport) -> SyncResult {
    let manifest = match artifact_store.read_manifest() {
        Ok(m) => m,
        Err(_) => return SyncResult::failure(SyncDirection::Push, "NO_LOCAL_INDEX"),
    };

    let nodes = match artifact_store.read_all_nodes() {
        Ok(n) => n,
        Err(e) => return SyncResult::failure(SyncDirection::Push, e.to_string()),
    };
    let edges = match artifact_store.read_edges() {
        Ok(e) => e,
        Err(e) => return SyncResult::failure(SyncDirection::Push, e.to_string()),
    };
    let embeddings = match artifact_store.read_all_embeddings() {
        Ok(e) => e,
        Err(e) => return SyncResult::failure(SyncDirection::Push, e.to_string()),
    };

    if let Err(e) = transport.push(&manifest, &nodes, &edges, &embeddings).await {
        return SyncResult::failure(SyncDirection::Push, format!("TRANSPORT_ERROR: {e}"));
    }

    SyncResult::success(SyncDirection::Push)
}

/// Pull the merged index from `transport`'s remote, replacing `artifact_store`'s
/// contents (CMD-005 pull).
pub async fn sync_pull(artifact_store: &dyn ArtifactStore, transport: &dyn Transport) -> SyncResult {
    let pulled = match transport.pull().await {
        Ok(p) => p,
        Err(e) => return SyncResult::failure(SyncDirection::Pull, format!("TRANSPORT_ERROR: {e}")),
    };

    if let Err(e) = artifact_store.write_manifest(&pulled.manifest) {
        return SyncResult::failure(SyncDirection::Pull, e.to_string());
    }
    for node in &pulled.nodes {
        if let Err(e) = artifact_store.write_node(node) {
            return SyncResult::failure(SyncDirection::Pull, e.to_string());
        }
    }
    if !pulled.edges.is_empty() {
        if let Err(e) = artifact_store.rewrite_edges(&pulled.edges) {
            return SyncResult::failure(SyncDirection::Pull, e.to_string());
        }
    }
    let by_doc: HashMap<String, Vec<kdd_core::Embedding>> =
        pulled.embeddings.into_iter().fold(HashMap::new(), |mut acc, emb| {
            acc.entry(emb.document_id.clone()).or_default().push(emb);
            acc
        });
    for (doc_id, embs) in &by_doc {
        if let Err(e) = artifact_store.write_embeddings(doc_id, embs) {
            return SyncResult::failure(SyncDirection::Pull, e.to_string());
        }
    }

    SyncResult::success(SyncDirection::Pull)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::FilesystemArtifactStore;
    use kdd_core::{ErrorCode, IndexLevel, IndexManifest, IndexStats, KddError, KddResult, PulledIndex};
    use async_trait::async_trait;
    use chrono::Utc;

    struct NoLocalIndexTransport;

    #[async_trait]
    impl Transport for NoLocalIndexTransport {
        async fn push(
            &self,
            _manifest: &IndexManifest,
            _nodes: &[kdd_core::GraphNode],
            _edges: &[kdd_core::GraphEdge],
            _embeddings: &[kdd_core::Embedding],
        ) -> KddResult<()> {
            Ok(())
        }

        async fn pull(&self) -> KddResult<PulledIndex> {
            Err(KddError::new(ErrorCode::TransportError, "unreachable"))
        }
    }

    #[tokio::test]
    async fn push_fails_without_local_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemArtifactStore::new(dir.path().to_path_buf());
        let result = sync_push(&store, &NoLocalIndexTransport).await;
        assert!(!result.success);
        assert_eq!(result.error.unwrap(), "NO_LOCAL_INDEX");
    }

    #[tokio::test]
    async fn push_succeeds_with_local_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemArtifactStore::new(dir.path().to_path_buf());
        store
            .write_manifest(&IndexManifest {
                version: "1.0.0".to_string(),
                kdd_version: "1.0.0".to_string(),
                embedding_model: None,
                embedding_dimensions: None,
                indexed_at: Utc::now(),
                indexed_by: "test".to_string(),
                structure: "single-domain".to_string(),
                index_level: IndexLevel::L1,
                stats: IndexStats::default(),
                domains: Vec::new(),
                git_commit: None,
            })
            .unwrap();

        let result = sync_push(&store, &NoLocalIndexTransport).await;
        assert!(result.success);
    }

    #[tokio::test]
    async fn pull_surfaces_transport_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemArtifactStore::new(dir.path().to_path_buf());
        let result = sync_pull(&store, &NoLocalIndexTransport).await;
        assert!(!result.success);
        assert!(result.error.unwrap().starts_with("TRANSPORT_ERROR"));
    }
}

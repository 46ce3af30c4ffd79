//! Loads the on-disk artifact tree into the in-memory [`PetgraphGraphStore`]
//! and [`BruteForceVectorStore`] the retrieval engine queries against.
//! Skips the reload when the manifest's derived cache key is unchanged.

use kdd_core::{ArtifactStore, ErrorCode, KddError, KddResult};

use crate::graph_store::PetgraphGraphStore;
use crate::vector_store::BruteForceVectorStore;

/// Owns a populated graph store and vector store, reloading both from an
/// [`ArtifactStore`] only when the manifest has actually changed.
pub struct IndexLoader<S: ArtifactStore> {
    artifact_store: S,
    graph_store: PetgraphGraphStore,
    vector_store: BruteForceVectorStore,
    cache_key: Option<String>,
}

impl<S: ArtifactStore> IndexLoader<S> {
    pub fn new(artifact_store: S) -> Self {
        Self { artifact_store, graph_store: PetgraphGraphStore::new(), vector_store: BruteForceVectorStore::new(), cache_key: None }
    }

    /// Load (or refresh, if stale) both stores, returning whether a reload
    /// actually happened.
    pub fn ensure_loaded(&mut self) -> KddResult<bool> {
        let manifest = self.artifact_store.read_manifest()?;
        let key = format!("{}:{}:{}", manifest.indexed_at.to_rfc3339(), manifest.stats.nodes, manifest.stats.edges);

        if self.cache_key.as_deref() == Some(key.as_str()) {
            return Ok(false);
        }

        self.reload()?;
        self.cache_key = Some(key);
        Ok(true)
    }

    /// Force a rebuild regardless of the cache key.
    pub fn reload(&mut self) -> KddResult<()> {
        let nodes = self.artifact_store.read_all_nodes()?;
        let edges = self.artifact_store.read_edges()?;
        let embeddings = self.artifact_store.read_all_embeddings()?;

        self.graph_store.load(nodes, edges);
        self.vector_store.load(embeddings);
        self.cache_key = None;
        Ok(())
    }

    pub fn graph_store(&self) -> &PetgraphGraphStore {
        &self.graph_store
    }

    pub fn vector_store(&self) -> &BruteForceVectorStore {
        &self.vector_store
    }

    pub fn artifact_store(&self) -> &S {
        &self.artifact_store
    }
}

/// `NODE_NOT_FOUND` helper shared by every query module.
pub fn node_not_found(node_id: &str) -> KddError {
    KddError::new(ErrorCode::NodeNotFound, format!("node not found: {node_id}"))
}

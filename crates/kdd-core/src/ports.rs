//! Port traits implemented by exactly one adapter apiece elsewhere in the
//! workspace: `kdd-index` (`ArtifactStore`, `Transport`), `kdd-query`
//! (`GraphStore`, `VectorStore`), and `kdd-ai` (`EmbeddingModel`, `AgentClient`).
//! Keeping the traits here lets every crate depend on the contract without
//! depending on each other's concrete adapter.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::KddResult;
use crate::model::{Document, Embedding, GraphEdge, GraphNode, IndexManifest, LayerViolation, ScoredNode};

/// Persistence for the on-disk `.kdd-index/` artifact tree: manifest, nodes,
/// edges, embeddings, and enrichments.
pub trait ArtifactStore: Send + Sync {
    fn write_manifest(&self, manifest: &IndexManifest) -> KddResult<()>;
    fn read_manifest(&self) -> KddResult<IndexManifest>;

    fn write_node(&self, node: &GraphNode) -> KddResult<()>;
    fn read_node(&self, node_id: &str) -> KddResult<GraphNode>;
    fn read_all_nodes(&self) -> KddResult<Vec<GraphNode>>;

    /// Append to `edges/edges.jsonl`. Callers are responsible for deduplication
    /// by `GraphEdge::identity`; the store appends verbatim.
    fn append_edges(&self, edges: &[GraphEdge]) -> KddResult<()>;
    fn read_edges(&self) -> KddResult<Vec<GraphEdge>>;
    /// Overwrite `edges/edges.jsonl` with exactly `edges`, used by cascade delete.
    fn rewrite_edges(&self, edges: &[GraphEdge]) -> KddResult<()>;

    fn write_embeddings(&self, document_id: &str, embeddings: &[Embedding]) -> KddResult<()>;
    fn read_embeddings(&self, document_id: &str) -> KddResult<Vec<Embedding>>;
    fn read_all_embeddings(&self) -> KddResult<Vec<Embedding>>;

    fn write_enrichment(&self, document_id: &str, enrichment: &serde_json::Value) -> KddResult<()>;
    fn read_enrichment(&self, document_id: &str) -> KddResult<Option<serde_json::Value>>;

    /// Remove every artifact (node, embeddings, enrichment) whose node's
    /// `source_file` equals `source_path` and drop any edge referencing it,
    /// cascading the deletion across the store. `source_path` is the
    /// document's repo-relative path, matching what incremental indexing
    /// tracks via `git diff`, not a bare document ID.
    fn delete_document_artifacts(&self, source_path: &str) -> KddResult<()>;
}

/// The in-memory knowledge graph built from `ArtifactStore` contents, queried
/// by every QRY-00x retrieval strategy.
pub trait GraphStore: Send + Sync {
    fn get_node(&self, node_id: &str) -> Option<&GraphNode>;
    fn has_node(&self, node_id: &str) -> bool;

    /// BFS from `root` to `depth` hops. Traverses both edge directions unless
    /// `respect_layers` is set, in which case an edge whose origin layer is
    /// strictly shallower than its destination layer is not followed.
    fn traverse(&self, root: &str, depth: u32, respect_layers: bool) -> Vec<(GraphNode, GraphEdge)>;

    /// Reverse-only BFS (incoming edges) used by impact analysis: every node
    /// that transitively depends on `root`.
    fn reverse_traverse(&self, root: &str, depth: u32) -> Vec<(GraphNode, GraphEdge)>;

    /// Case-insensitive substring match over node IDs, aliases, and indexed text fields.
    fn text_search(&self, query: &str) -> Vec<ScoredNode>;

    fn outgoing_edges(&self, node_id: &str) -> Vec<&GraphEdge>;
    fn incoming_edges(&self, node_id: &str) -> Vec<&GraphEdge>;
    fn all_edges(&self) -> Vec<&GraphEdge>;
    fn all_nodes(&self) -> Vec<&GraphNode>;

    fn find_violations(&self) -> Vec<LayerViolation>;
}

/// Nearest-neighbor search over stored embeddings.
pub trait VectorStore: Send + Sync {
    /// Cosine-similarity search against every loaded embedding, returning the
    /// `limit` highest-scoring chunks with score at or above `min_score`.
    fn search(&self, query_vector: &[f32], limit: usize, min_score: f32) -> Vec<ScoredNode>;
}

/// Text-to-vector encoding, backing L2/L3 indexing and QRY-002/003.
#[async_trait]
pub trait EmbeddingModel: Send + Sync {
    fn model_name(&self) -> &str;
    fn dimensions(&self) -> usize;
    async fn encode(&self, texts: &[String]) -> KddResult<Vec<Vec<f32>>>;
}

/// L3-only enrichment: an external agent that augments a node with a summary
/// and implicit relations inferred from its neighborhood.
#[async_trait]
pub trait AgentClient: Send + Sync {
    async fn enrich(&self, node: &GraphNode, context: &str) -> KddResult<EnrichmentResult>;
}

/// The structured result of one [`AgentClient::enrich`] call.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct EnrichmentResult {
    pub summary: String,
    pub implicit_relations: Vec<ImplicitRelation>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ImplicitRelation {
    pub target_node: String,
    pub relation: String,
    pub confidence: f32,
}

/// Push/pull of derived index artifacts between a local index and a remote
/// peer. Only ever carries `GraphNode`/`GraphEdge`/`Embedding`/manifest data —
/// never raw document source.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn push(&self, manifest: &IndexManifest, nodes: &[GraphNode], edges: &[GraphEdge], embeddings: &[Embedding]) -> KddResult<()>;
    async fn pull(&self) -> KddResult<PulledIndex>;
}

/// Everything retrieved by one [`Transport::pull`] call.
#[derive(Debug, Clone)]
pub struct PulledIndex {
    pub manifest: IndexManifest,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub embeddings: Vec<Embedding>,
}

/// Marker trait tying a parsed [`Document`] to the front matter map callers
/// pass into [`crate::rules::route_document`]; kept here so extract-stage
/// adapters share one vocabulary for "a document plus its raw front matter".
pub trait DocumentSource {
    fn document(&self) -> &Document;
    fn front_matter(&self) -> &HashMap<String, serde_json::Value>;
}

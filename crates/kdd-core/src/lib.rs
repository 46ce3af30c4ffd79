//! KDD Core — domain model, business rules, and ports shared by every
//! indexing and retrieval crate in the workspace.

pub mod error;
pub mod events;
pub mod hash;
pub mod markdown;
pub mod model;
pub mod ports;
pub mod rules;
pub mod tokenize;
pub mod wikilink;

pub use error::{ErrorCode, KddError, KddResult};
pub use events::{
    DocumentDeleted, DocumentDetected, DocumentIndexed, DocumentParsed, DocumentStale,
    InMemoryEventBus, MergeCompleted, MergeRequested, QueryCompleted, QueryFailed, QueryReceived,
};
pub use hash::compute_content_hash;
pub use markdown::{extract_frontmatter, extract_snippet, heading_to_anchor, parse_markdown_sections};
pub use model::{
    Document, DocumentStatus, EdgeType, Embedding, ExtractionMethod, GraphEdge, GraphNode,
    IndexLevel, IndexManifest, IndexStats, KDDKind, KDDLayer, LayerViolation, QueryStatus,
    RetrievalQuery, RetrievalResult, RetrievalStrategy, ScoredNode, Section, StructuralEdgeType,
};
pub use ports::{
    AgentClient, ArtifactStore, DocumentSource, EmbeddingModel, EnrichmentResult, GraphStore,
    ImplicitRelation, PulledIndex, Transport, VectorStore,
};
pub use rules::{
    ConflictResult, DeletionResult, MergeCandidate, RouteResult, detect_index_level,
    embeddable_sections, is_layer_violation, resolve_deletion, resolve_node_conflict,
    route_document,
};
pub use tokenize::{count_tokens, truncate_to_tokens};
pub use wikilink::{WikiLink, extract_wiki_link_targets, extract_wiki_links};

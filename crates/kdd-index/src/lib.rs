//! Indexing pipeline, merge engine, enrichment, sync, and the filesystem
//! `ArtifactStore` adapter: everything behind `kdd index`/`kdd merge`/
//! `kdd enrich`/`kdd sync`.

pub mod artifact;
pub mod enrichment;
pub mod git;
pub mod merge;
pub mod pipeline;
pub mod sync;
pub mod transport;

pub use artifact::FilesystemArtifactStore;
pub use enrichment::{EnrichResult, enrich_with_agent};
pub use merge::{ConflictStrategy, MergeResult, merge_index};
pub use pipeline::{
    IncrementalResult, IndexDocumentOptions, IndexIncrementalOptions, IndexResult, index_document,
    index_incremental,
};
pub use sync::{SyncDirection, SyncResult, sync_pull, sync_push};
pub use transport::FilesystemTransport;

//! Markdown spec extraction: the 15 kind extractors, their shared
//! infrastructure, the registry that dispatches by [`kdd_core::KDDKind`],
//! and the chunker that feeds the embedding pipeline.

pub mod chunking;
pub mod extractor;
pub mod kinds;
pub mod registry;

pub use chunking::{
    Chunk, DEFAULT_MAX_CHUNK_CHARS, DEFAULT_OVERLAP_CHARS, chunk_document, chunk_document_with,
};
pub use extractor::Extractor;
pub use registry::{ExtractorRegistry, create_default_registry};

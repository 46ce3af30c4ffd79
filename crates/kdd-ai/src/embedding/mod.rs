//! [`kdd_core::EmbeddingModel`] adapters.

pub mod local;
pub mod openai;

pub use local::LocalEmbeddingModel;
pub use openai::OpenAiEmbeddingModel;

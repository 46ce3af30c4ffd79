//! Adapters for the two L2/L3 ports defined in `kdd-core`:
//! [`kdd_core::EmbeddingModel`] (semantic embedding generation) and
//! [`kdd_core::AgentClient`] (agent-driven node enrichment), plus the
//! response cache, token budget, and prompt scaffolding they share.

pub mod agent;
pub mod budget;
pub mod cache;
pub mod embedding;
pub mod prompt;

pub use agent::AnthropicAgentClient;
pub use budget::{Budget, BudgetWarning};
pub use cache::ResponseCache;
pub use embedding::{LocalEmbeddingModel, OpenAiEmbeddingModel};

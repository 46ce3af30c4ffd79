//! [`kdd_core::AgentClient`] adapters.

pub mod anthropic;

pub use anthropic::AnthropicAgentClient;

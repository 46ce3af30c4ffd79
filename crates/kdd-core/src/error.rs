//! Typed error taxonomy shared by every KDD subsystem.

use thiserror::Error;

/// The upper-snake-case error codes carried at every public boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    NodeNotFound,
    QueryTooShort,
    UnknownKind,
    ManifestNotFound,
    IncompatibleVersion,
    IncompatibleEmbeddingModel,
    IncompatibleStructure,
    ConflictRejected,
    InsufficientSources,
    NoLocalIndex,
    TransportError,
    AgentError,
    DocumentNotFound,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::NodeNotFound => "NODE_NOT_FOUND",
            ErrorCode::QueryTooShort => "QUERY_TOO_SHORT",
            ErrorCode::UnknownKind => "UNKNOWN_KIND",
            ErrorCode::ManifestNotFound => "MANIFEST_NOT_FOUND",
            ErrorCode::IncompatibleVersion => "INCOMPATIBLE_VERSION",
            ErrorCode::IncompatibleEmbeddingModel => "INCOMPATIBLE_EMBEDDING_MODEL",
            ErrorCode::IncompatibleStructure => "INCOMPATIBLE_STRUCTURE",
            ErrorCode::ConflictRejected => "CONFLICT_REJECTED",
            ErrorCode::InsufficientSources => "INSUFFICIENT_SOURCES",
            ErrorCode::NoLocalIndex => "NO_LOCAL_INDEX",
            ErrorCode::TransportError => "TRANSPORT_ERROR",
            ErrorCode::AgentError => "AGENT_ERROR",
            ErrorCode::DocumentNotFound => "DOCUMENT_NOT_FOUND",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error type returned by core domain and query operations.
///
/// Each variant pairs an [`ErrorCode`] with a human-readable message, matching
/// the error taxonomy fixed by the external interface contract.
#[derive(Debug, Error)]
#[error("{code}: {message}")]
pub struct KddError {
    pub code: ErrorCode,
    pub message: String,
}

impl KddError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        KddError {
            code,
            message: message.into(),
        }
    }

    pub fn node_not_found(node_id: &str) -> Self {
        Self::new(ErrorCode::NodeNotFound, format!("node not found: {node_id}"))
    }

    pub fn query_too_short() -> Self {
        Self::new(
            ErrorCode::QueryTooShort,
            "query text must be at least 3 characters",
        )
    }

    pub fn unknown_kind(kind: &str) -> Self {
        Self::new(ErrorCode::UnknownKind, format!("no coverage rules for kind: {kind}"))
    }
}

pub type KddResult<T> = Result<T, KddError>;

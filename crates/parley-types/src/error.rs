use thiserror::Error;
use uuid::Uuid;

use crate::llm::LlmError;

/// Errors from repository operations (used by trait definitions in parley-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors from the chat orchestrator.
///
/// Every failure a chat request can surface, recovered at the HTTP
/// boundary and converted to a structured response.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("message is empty")]
    EmptyMessage,

    #[error("unknown session: {0}")]
    UnknownSession(Uuid),

    #[error("session already exists: {0}")]
    DuplicateSession(Uuid),

    #[error("storage error: {0}")]
    Store(#[from] RepositoryError),

    #[error("provider error: {0}")]
    Provider(#[from] LlmError),
}

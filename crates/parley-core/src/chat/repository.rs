//! ChatRepository trait definition.
//!
//! Provides CRUD operations for sessions and their message logs.
//! Implementations live in parley-infra (e.g., `SqliteChatRepository`).
//! Uses native async fn in traits (RPITIT, Rust 2024 edition).

use parley_types::chat::{Message, Session, SessionSummary};
use parley_types::error::RepositoryError;
use uuid::Uuid;

/// Repository trait for session and message persistence.
///
/// All operations are durable writes to a single on-disk store; no
/// caching happens at this layer.
pub trait ChatRepository: Send + Sync {
    /// Insert a new session row.
    ///
    /// Fails with `RepositoryError::Conflict` if the identifier already
    /// exists.
    fn create_session(
        &self,
        session: &Session,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Get a session by its unique id. `None` means the session does not
    /// exist -- this is the authoritative existence check.
    fn get_session(
        &self,
        session_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<Session>, RepositoryError>> + Send;

    /// List all sessions ordered by last_activity DESC, each annotated
    /// with its live message count.
    fn list_sessions(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<SessionSummary>, RepositoryError>> + Send;

    /// Update a session's title. `NotFound` if the session does not exist.
    fn rename_session(
        &self,
        session_id: &Uuid,
        title: &str,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Delete a session and all its messages as one atomic unit.
    ///
    /// Must not leave orphaned messages if interrupted. `NotFound` if the
    /// session does not exist.
    fn delete_session(
        &self,
        session_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Insert a message row and bump the owning session's last_activity
    /// timestamp in the same transaction.
    fn append_message(
        &self,
        message: &Message,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Get all messages for a session ordered ascending by `(created_at,
    /// id)`. An unknown session yields an empty list, not an error.
    fn list_messages(
        &self,
        session_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<Message>, RepositoryError>> + Send;
}

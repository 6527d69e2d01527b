//! Chat service orchestrating session lifecycle and message persistence.
//!
//! `ChatService` coordinates the `ChatRepository`, the `ContextCache`,
//! and the `LlmProvider` for the full conversation lifecycle: creating
//! sessions, rehydrating contexts after a cache miss, appending turns,
//! and running the provider exchange.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use parley_types::chat::{Message, MessageRole, Session, SessionSummary};
use parley_types::error::{ChatError, RepositoryError};

use crate::chat::cache::ContextCache;
use crate::chat::context::ProviderContext;
use crate::chat::repository::ChatRepository;
use crate::llm::provider::LlmProvider;

/// Outcome of one successful chat exchange.
#[derive(Debug, Clone)]
pub struct ChatReply {
    pub session_id: Uuid,
    pub reply: String,
}

/// Orchestrates chat sessions end to end.
///
/// Generic over `ChatRepository` and `LlmProvider` to maintain clean
/// architecture (parley-core never depends on parley-infra). Owns the
/// context cache: it is created with the service at process start and
/// torn down with it, never shared ambient state.
pub struct ChatService<C: ChatRepository, P: LlmProvider> {
    repo: C,
    provider: P,
    cache: ContextCache,
}

impl<C: ChatRepository, P: LlmProvider> ChatService<C, P> {
    /// Create a new chat service with the given repository and provider.
    ///
    /// `cache_capacity` bounds the number of live provider contexts.
    pub fn new(repo: C, provider: P, cache_capacity: usize) -> Self {
        Self {
            repo,
            provider,
            cache: ContextCache::new(cache_capacity),
        }
    }

    /// Access the repository.
    pub fn repo(&self) -> &C {
        &self.repo
    }

    // --- Chat exchange ---

    /// Handle one inbound chat message.
    ///
    /// With no session id, a new session is created. With a session id,
    /// the live context is used when cached, otherwise rebuilt by
    /// replaying persisted history; an id absent from the store is
    /// rejected. The user message is persisted before the provider
    /// exchange and stays recorded even if the exchange fails.
    pub async fn send_message(
        &self,
        text: &str,
        session_id: Option<Uuid>,
    ) -> Result<ChatReply, ChatError> {
        if text.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let (session_id, context) = match session_id {
            None => {
                let session = self.create_session(None).await?;
                let context = self.cache.insert(session.id, ProviderContext::empty());
                (session.id, context)
            }
            Some(id) => (id, self.resolve_context(id).await?),
        };

        // At most one in-flight exchange per session: the context lock is
        // held across append -> exchange -> append.
        let mut context = context.lock().await;

        let user_message = Message::new(session_id, MessageRole::User, text.to_string());
        self.repo.append_message(&user_message).await?;
        context.push_user(text);

        let reply = match self.provider.exchange(&context.request()).await {
            Ok(reply) => reply,
            Err(e) => {
                // The user message stays recorded: history shows an
                // unanswered turn, which is exactly what a fresh replay
                // of the store would rebuild.
                warn!(session_id = %session_id, error = %e, "provider exchange failed");
                return Err(ChatError::Provider(e));
            }
        };

        let bot_message = Message::new(session_id, MessageRole::Bot, reply.content.clone());
        self.repo.append_message(&bot_message).await?;
        context.push_reply(&reply.content);

        Ok(ChatReply {
            session_id,
            reply: reply.content,
        })
    }

    /// Get the live context for a session, rebuilding it from persisted
    /// history on a cache miss.
    ///
    /// Existence is decided by the store, never by cache absence: an id
    /// the store has no session for is rejected rather than silently
    /// treated as an empty conversation.
    async fn resolve_context(
        &self,
        session_id: Uuid,
    ) -> Result<Arc<Mutex<ProviderContext>>, ChatError> {
        if let Some(context) = self.cache.get(&session_id) {
            return Ok(context);
        }

        if self.repo.get_session(&session_id).await?.is_none() {
            return Err(ChatError::UnknownSession(session_id));
        }

        let history = self.repo.list_messages(&session_id).await?;
        debug!(
            session_id = %session_id,
            messages = history.len(),
            "rebuilding provider context from history"
        );

        // Concurrent rehydrations collapse to one installed context.
        Ok(self.cache.insert(session_id, ProviderContext::replay(&history)))
    }

    // --- Session registry ---

    /// Create a new session, optionally titled. Untitled sessions get a
    /// creation-timestamp-derived title.
    pub async fn create_session(&self, title: Option<String>) -> Result<Session, ChatError> {
        let session = Session::new(title);
        self.repo
            .create_session(&session)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => ChatError::DuplicateSession(session.id),
                other => ChatError::Store(other),
            })?;
        info!(session_id = %session.id, title = %session.title, "session created");
        Ok(session)
    }

    /// List all sessions, most recently active first, with live message
    /// counts.
    pub async fn list_sessions(&self) -> Result<Vec<SessionSummary>, ChatError> {
        Ok(self.repo.list_sessions().await?)
    }

    /// Get a session's messages in replay order. An unknown id yields an
    /// empty list, mirroring the store contract.
    pub async fn list_messages(&self, session_id: Uuid) -> Result<Vec<Message>, ChatError> {
        Ok(self.repo.list_messages(&session_id).await?)
    }

    /// Rename a session.
    pub async fn rename_session(
        &self,
        session_id: Uuid,
        title: &str,
    ) -> Result<(), ChatError> {
        self.repo
            .rename_session(&session_id, title)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => ChatError::UnknownSession(session_id),
                other => ChatError::Store(other),
            })?;
        info!(session_id = %session_id, title = %title, "session renamed");
        Ok(())
    }

    /// Delete a session with all its messages and evict its live context.
    ///
    /// The eviction is the cross-component invariant: a deleted session
    /// must never be answered from a stale cached context.
    pub async fn delete_session(&self, session_id: Uuid) -> Result<(), ChatError> {
        self.repo
            .delete_session(&session_id)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => ChatError::UnknownSession(session_id),
                other => ChatError::Store(other),
            })?;
        self.cache.remove(&session_id);
        info!(session_id = %session_id, "session deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_types::llm::{ExchangeReply, ExchangeRequest, LlmError, ProviderRole};
    use std::collections::HashMap;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    /// In-memory repository for orchestrator tests.
    #[derive(Clone, Default)]
    struct MemoryRepo {
        inner: Arc<MemoryRepoInner>,
    }

    #[derive(Default)]
    struct MemoryRepoInner {
        sessions: StdMutex<HashMap<Uuid, Session>>,
        messages: StdMutex<Vec<Message>>,
    }

    impl ChatRepository for MemoryRepo {
        async fn create_session(&self, session: &Session) -> Result<(), RepositoryError> {
            let mut sessions = self.inner.sessions.lock().unwrap();
            if sessions.contains_key(&session.id) {
                return Err(RepositoryError::Conflict(session.id.to_string()));
            }
            sessions.insert(session.id, session.clone());
            Ok(())
        }

        async fn get_session(&self, session_id: &Uuid) -> Result<Option<Session>, RepositoryError> {
            Ok(self.inner.sessions.lock().unwrap().get(session_id).cloned())
        }

        async fn list_sessions(&self) -> Result<Vec<SessionSummary>, RepositoryError> {
            let sessions = self.inner.sessions.lock().unwrap();
            let messages = self.inner.messages.lock().unwrap();
            let mut summaries: Vec<SessionSummary> = sessions
                .values()
                .map(|s| SessionSummary {
                    id: s.id,
                    title: s.title.clone(),
                    created_at: s.created_at,
                    last_activity: s.last_activity,
                    message_count: messages.iter().filter(|m| m.session_id == s.id).count()
                        as u32,
                })
                .collect();
            summaries.sort_by(|a, b| b.last_activity.cmp(&a.last_activity));
            Ok(summaries)
        }

        async fn rename_session(
            &self,
            session_id: &Uuid,
            title: &str,
        ) -> Result<(), RepositoryError> {
            let mut sessions = self.inner.sessions.lock().unwrap();
            match sessions.get_mut(session_id) {
                Some(session) => {
                    session.title = title.to_string();
                    Ok(())
                }
                None => Err(RepositoryError::NotFound),
            }
        }

        async fn delete_session(&self, session_id: &Uuid) -> Result<(), RepositoryError> {
            let mut sessions = self.inner.sessions.lock().unwrap();
            if sessions.remove(session_id).is_none() {
                return Err(RepositoryError::NotFound);
            }
            self.inner
                .messages
                .lock()
                .unwrap()
                .retain(|m| m.session_id != *session_id);
            Ok(())
        }

        async fn append_message(&self, message: &Message) -> Result<(), RepositoryError> {
            let mut sessions = self.inner.sessions.lock().unwrap();
            if let Some(session) = sessions.get_mut(&message.session_id) {
                session.last_activity = message.created_at;
            }
            self.inner.messages.lock().unwrap().push(message.clone());
            Ok(())
        }

        async fn list_messages(&self, session_id: &Uuid) -> Result<Vec<Message>, RepositoryError> {
            let mut messages: Vec<Message> = self
                .inner
                .messages
                .lock()
                .unwrap()
                .iter()
                .filter(|m| m.session_id == *session_id)
                .cloned()
                .collect();
            messages.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
            Ok(messages)
        }
    }

    /// Echoes the last user turn; optionally sleeps to widen race windows.
    struct EchoProvider {
        delay: Duration,
    }

    impl EchoProvider {
        fn new() -> Self {
            Self {
                delay: Duration::ZERO,
            }
        }

        fn slow() -> Self {
            Self {
                delay: Duration::from_millis(20),
            }
        }
    }

    impl LlmProvider for EchoProvider {
        fn name(&self) -> &str {
            "echo"
        }

        async fn exchange(&self, request: &ExchangeRequest) -> Result<ExchangeReply, LlmError> {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let last_user = request
                .turns
                .iter()
                .rev()
                .find(|t| t.role == ProviderRole::User)
                .map(|t| t.content.clone())
                .unwrap_or_default();
            Ok(ExchangeReply {
                content: format!("echo: {last_user}"),
            })
        }
    }

    /// Always fails with a network error.
    struct FailingProvider;

    impl LlmProvider for FailingProvider {
        fn name(&self) -> &str {
            "failing"
        }

        async fn exchange(&self, _request: &ExchangeRequest) -> Result<ExchangeReply, LlmError> {
            Err(LlmError::Network("connection reset".to_string()))
        }
    }

    fn service(repo: MemoryRepo) -> ChatService<MemoryRepo, EchoProvider> {
        ChatService::new(repo, EchoProvider::new(), 16)
    }

    #[tokio::test]
    async fn test_no_session_id_creates_fresh_session() {
        let repo = MemoryRepo::default();
        let svc = service(repo.clone());

        let reply = svc.send_message("hello", None).await.unwrap();
        assert_eq!(reply.reply, "echo: hello");

        let sessions = svc.list_sessions().await.unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].id, reply.session_id);
        assert_eq!(sessions[0].message_count, 2);
    }

    #[tokio::test]
    async fn test_n_turns_yield_2n_alternating_messages() {
        let svc = service(MemoryRepo::default());

        let first = svc.send_message("one", None).await.unwrap();
        let id = first.session_id;
        svc.send_message("two", Some(id)).await.unwrap();
        svc.send_message("three", Some(id)).await.unwrap();

        let messages = svc.list_messages(id).await.unwrap();
        assert_eq!(messages.len(), 6);
        for (i, msg) in messages.iter().enumerate() {
            let expected = if i % 2 == 0 {
                MessageRole::User
            } else {
                MessageRole::Bot
            };
            assert_eq!(msg.role, expected);
        }
        for pair in messages.windows(2) {
            assert!(pair[0].created_at <= pair[1].created_at);
        }
    }

    #[tokio::test]
    async fn test_empty_message_rejected_and_nothing_appended() {
        let svc = service(MemoryRepo::default());

        let err = svc.send_message("   \n\t", None).await.unwrap_err();
        assert!(matches!(err, ChatError::EmptyMessage));

        assert!(svc.list_sessions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_session_rejected() {
        let svc = service(MemoryRepo::default());

        let ghost = Uuid::now_v7();
        let err = svc.send_message("hello?", Some(ghost)).await.unwrap_err();
        assert!(matches!(err, ChatError::UnknownSession(id) if id == ghost));
    }

    #[tokio::test]
    async fn test_replay_after_cache_loss_is_observably_equivalent() {
        let repo = MemoryRepo::default();

        // Warm conversation on one service instance.
        let svc1 = service(repo.clone());
        let id = svc1.send_message("hello", None).await.unwrap().session_id;
        svc1.send_message("tell me more", Some(id)).await.unwrap();

        // A second instance over the same store simulates a process
        // restart: its cache is cold and the context must be replayed.
        let svc2 = service(repo.clone());
        svc2.send_message("and then?", Some(id)).await.unwrap();

        let messages = svc2.list_messages(id).await.unwrap();
        let expected: Vec<(MessageRole, &str)> = vec![
            (MessageRole::User, "hello"),
            (MessageRole::Bot, "echo: hello"),
            (MessageRole::User, "tell me more"),
            (MessageRole::Bot, "echo: tell me more"),
            (MessageRole::User, "and then?"),
            (MessageRole::Bot, "echo: and then?"),
        ];
        assert_eq!(messages.len(), expected.len());
        for (msg, (role, content)) in messages.iter().zip(&expected) {
            assert_eq!(msg.role, *role);
            assert_eq!(msg.content, *content);
        }
    }

    #[tokio::test]
    async fn test_provider_failure_keeps_user_message() {
        let repo = MemoryRepo::default();
        let svc = service(repo.clone());
        let id = svc.send_message("hello", None).await.unwrap().session_id;

        let failing: ChatService<MemoryRepo, FailingProvider> =
            ChatService::new(repo.clone(), FailingProvider, 16);
        let err = failing
            .send_message("are you there?", Some(id))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ChatError::Provider(LlmError::Network(_))
        ));

        // History shows the unanswered turn.
        let messages = failing.list_messages(id).await.unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[2].role, MessageRole::User);
        assert_eq!(messages[2].content, "are you there?");
    }

    #[tokio::test]
    async fn test_delete_removes_messages_and_forgets_session() {
        let svc = service(MemoryRepo::default());
        let id = svc.send_message("hello", None).await.unwrap().session_id;

        svc.delete_session(id).await.unwrap();

        assert!(svc.list_messages(id).await.unwrap().is_empty());
        let err = svc.send_message("anyone?", Some(id)).await.unwrap_err();
        assert!(matches!(err, ChatError::UnknownSession(_)));
    }

    #[tokio::test]
    async fn test_delete_unknown_session() {
        let svc = service(MemoryRepo::default());
        let err = svc.delete_session(Uuid::now_v7()).await.unwrap_err();
        assert!(matches!(err, ChatError::UnknownSession(_)));
    }

    #[tokio::test]
    async fn test_rename_then_list_shows_title_and_count() {
        let svc = service(MemoryRepo::default());
        let id = svc.send_message("hello", None).await.unwrap().session_id;

        svc.rename_session(id, "Greeting").await.unwrap();

        let sessions = svc.list_sessions().await.unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].title, "Greeting");
        assert_eq!(sessions[0].message_count, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_distinct_sessions_proceed_in_parallel_without_interleaving() {
        let repo = MemoryRepo::default();
        let svc = Arc::new(ChatService::new(repo.clone(), EchoProvider::slow(), 16));

        let a = svc.send_message("a0", None).await.unwrap().session_id;
        let b = svc.send_message("b0", None).await.unwrap().session_id;

        let mut handles = Vec::new();
        for turn in 1..=3 {
            let svc_a = svc.clone();
            handles.push(tokio::spawn(async move {
                svc_a.send_message(&format!("a{turn}"), Some(a)).await
            }));
            let svc_b = svc.clone();
            handles.push(tokio::spawn(async move {
                svc_b.send_message(&format!("b{turn}"), Some(b)).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        // Each session's log alternates user/bot with its own contents only.
        for (id, prefix) in [(a, "a"), (b, "b")] {
            let messages = svc.list_messages(id).await.unwrap();
            assert_eq!(messages.len(), 8);
            for (i, msg) in messages.iter().enumerate() {
                if i % 2 == 0 {
                    assert_eq!(msg.role, MessageRole::User);
                    assert!(msg.content.starts_with(prefix), "foreign turn in session");
                } else {
                    assert_eq!(msg.role, MessageRole::Bot);
                }
            }
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_same_session_exchanges_serialize() {
        let repo = MemoryRepo::default();
        let svc = Arc::new(ChatService::new(repo.clone(), EchoProvider::slow(), 16));
        let id = svc.send_message("start", None).await.unwrap().session_id;

        let mut handles = Vec::new();
        for turn in 1..=4 {
            let svc = svc.clone();
            handles.push(tokio::spawn(async move {
                svc.send_message(&format!("turn {turn}"), Some(id)).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        // Strict alternation: no logical turn was split by another, and
        // timestamps never invert.
        let messages = svc.list_messages(id).await.unwrap();
        assert_eq!(messages.len(), 10);
        for (i, msg) in messages.iter().enumerate() {
            let expected = if i % 2 == 0 {
                MessageRole::User
            } else {
                MessageRole::Bot
            };
            assert_eq!(msg.role, expected);
        }
        for pair in messages.windows(2) {
            assert!(pair[0].created_at <= pair[1].created_at);
        }
        // Every bot reply echoes the user message right before it.
        for pair in messages.chunks(2) {
            assert_eq!(pair[1].content, format!("echo: {}", pair[0].content));
        }
    }
}

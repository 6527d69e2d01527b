//! In-memory provider conversation context.
//!
//! A `ProviderContext` is the ordered, provider-role-tagged view of one
//! session's history. It is never persisted: it is either started empty
//! for a fresh session or rebuilt by replaying stored messages after a
//! cache miss, so the message log remains the single source of truth.

use parley_types::chat::Message;
use parley_types::llm::{ChatTurn, ExchangeRequest, ProviderRole};

/// The live conversation state for one session.
///
/// Turns are appended in exchange order and only after the matching
/// store write succeeded, so the context always equals what a fresh
/// replay of the store would rebuild.
#[derive(Debug, Default)]
pub struct ProviderContext {
    turns: Vec<ChatTurn>,
}

impl ProviderContext {
    /// An empty context for a newly created session.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Rebuild a context from persisted history.
    ///
    /// Messages must already be in ascending timestamp order (the
    /// repository's `list_messages` contract); each stored role is mapped
    /// to its provider-side role.
    pub fn replay(history: &[Message]) -> Self {
        let turns = history
            .iter()
            .map(|m| ChatTurn {
                role: m.role.provider_role(),
                content: m.content.clone(),
            })
            .collect();
        Self { turns }
    }

    /// Number of turns accumulated so far.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Whether the context holds no turns yet.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Append a user turn.
    pub fn push_user(&mut self, content: &str) {
        self.turns.push(ChatTurn {
            role: ProviderRole::User,
            content: content.to_string(),
        });
    }

    /// Append a model reply turn.
    pub fn push_reply(&mut self, content: &str) {
        self.turns.push(ChatTurn {
            role: ProviderRole::Model,
            content: content.to_string(),
        });
    }

    /// Build the exchange request carrying the full accumulated history,
    /// newest turn last.
    pub fn request(&self) -> ExchangeRequest {
        ExchangeRequest {
            turns: self.turns.clone(),
        }
    }

    /// The accumulated turns, oldest first.
    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }
}

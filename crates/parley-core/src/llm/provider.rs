//! LlmProvider trait definition.
//!
//! The single abstraction the orchestrator needs from a remote model:
//! send a sequence of role-tagged turns, receive a reply.
//! Uses native async fn in traits (RPITIT, Rust 2024 edition).

use parley_types::llm::{ExchangeReply, ExchangeRequest, LlmError};

/// Trait for LLM provider backends.
///
/// Implementations live in parley-infra (e.g., `GeminiProvider`). The
/// request carries the full accumulated conversation; the provider is
/// stateless across calls.
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g., "gemini").
    fn name(&self) -> &str;

    /// Send one exchange and receive the reply.
    ///
    /// Bounded by the provider client's own request timeout; never blocks
    /// indefinitely.
    fn exchange(
        &self,
        request: &ExchangeRequest,
    ) -> impl std::future::Future<Output = Result<ExchangeReply, LlmError>> + Send;
}

//! Provider exchange types for Parley.
//!
//! These types model the data shapes for talking to the LLM provider:
//! role-tagged conversation turns, the exchange request/reply pair, and
//! the typed provider error taxonomy.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role of a turn as the provider sees it.
///
/// The provider calls its own replies `model`; persisted `bot` messages
/// are replayed under this role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderRole {
    User,
    Model,
}

impl fmt::Display for ProviderRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderRole::User => write!(f, "user"),
            ProviderRole::Model => write!(f, "model"),
        }
    }
}

impl FromStr for ProviderRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(ProviderRole::User),
            "model" => Ok(ProviderRole::Model),
            other => Err(format!("invalid provider role: '{other}'")),
        }
    }
}

/// A single role-tagged turn in a provider conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ProviderRole,
    pub content: String,
}

/// Request to the provider: the full accumulated conversation, newest
/// turn last.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeRequest {
    pub turns: Vec<ChatTurn>,
}

/// Reply from the provider for one exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeReply {
    pub content: String,
}

/// Errors from provider operations.
///
/// The kinds are distinct so callers can apply differentiated retry
/// policy: network and rate-limit failures are transient, authentication
/// and malformed-request failures are not.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("rate limited (retry after {retry_after_ms:?}ms)")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("network error: {0}")]
    Network(String),

    #[error("malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("provider error: {message}")]
    Provider { message: String },
}

impl LlmError {
    /// Whether retrying the same request could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LlmError::Network(_) | LlmError::RateLimited { .. })
    }
}

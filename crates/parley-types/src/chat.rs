//! Session and message types for Parley.
//!
//! These types model persisted conversations: a session is a named thread,
//! a message is one immutable turn within it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

use crate::llm::ProviderRole;

/// Role of a persisted message.
///
/// Maps to the CHECK constraint in the SQLite schema:
/// `CHECK (role IN ('user', 'bot'))`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Bot,
}

impl MessageRole {
    /// The provider-side role this stored role is replayed as.
    ///
    /// Stored `user` turns replay as provider `user` turns; stored `bot`
    /// turns replay as the provider's `model` role.
    pub fn provider_role(self) -> ProviderRole {
        match self {
            MessageRole::User => ProviderRole::User,
            MessageRole::Bot => ProviderRole::Model,
        }
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Bot => write!(f, "bot"),
        }
    }
}

impl FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(MessageRole::User),
            "bot" => Ok(MessageRole::Bot),
            other => Err(format!("invalid message role: '{other}'")),
        }
    }
}

/// A durable chat session.
///
/// The identifier is generated once at creation and never reused.
/// `last_activity` is bumped every time a message is appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl Session {
    /// Create a new session with a fresh time-sortable id.
    ///
    /// When no title is given, derives one from the creation timestamp.
    pub fn new(title: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            title: title.unwrap_or_else(|| Self::default_title(now)),
            created_at: now,
            last_activity: now,
        }
    }

    /// The default title for a session created at `at`.
    pub fn default_title(at: DateTime<Utc>) -> String {
        format!("Chat {}", at.format("%Y-%m-%d %H:%M"))
    }
}

/// A session annotated with its live message count.
///
/// The count is computed from the message log at listing time, never
/// stored redundantly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub message_count: u32,
}

/// A single message within a session.
///
/// Messages are immutable once written and totally ordered within their
/// session by `(created_at, id)` ascending.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub session_id: Uuid,
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Create a new message for `session_id` stamped with the current time.
    pub fn new(session_id: Uuid, role: MessageRole, content: String) -> Self {
        Self {
            id: Uuid::now_v7(),
            session_id,
            role,
            content,
            created_at: Utc::now(),
        }
    }
}

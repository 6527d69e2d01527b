//! Session CRUD HTTP handlers.
//!
//! Endpoints:
//! - POST   /api/sessions               - Create a session
//! - GET    /api/sessions               - List sessions with message counts
//! - GET    /api/sessions/{id}/messages - Get a session's messages
//! - PUT    /api/sessions/{id}          - Rename a session
//! - DELETE /api/sessions/{id}          - Delete a session and its messages

use axum::Json;
use axum::extract::{Path, State};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use parley_types::chat::{Message, MessageRole, SessionSummary};

use super::chat::parse_session_id;
use crate::http::error::ApiError;
use crate::state::AppState;

/// Request body for session creation.
#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub title: Option<String>,
}

/// Response body for session creation.
#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub session_id: Uuid,
}

/// One session in the listing response.
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub message_count: u32,
}

impl From<SessionSummary> for SessionView {
    fn from(s: SessionSummary) -> Self {
        Self {
            session_id: s.id,
            title: s.title,
            created_at: s.created_at,
            last_activity: s.last_activity,
            message_count: s.message_count,
        }
    }
}

/// Response body for the session listing.
#[derive(Debug, Serialize)]
pub struct SessionListResponse {
    pub sessions: Vec<SessionView>,
}

/// One message in the message listing response.
#[derive(Debug, Serialize)]
pub struct MessageView {
    #[serde(rename = "type")]
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl From<Message> for MessageView {
    fn from(m: Message) -> Self {
        Self {
            role: m.role,
            content: m.content,
            timestamp: m.created_at,
        }
    }
}

/// Response body for the message listing.
#[derive(Debug, Serialize)]
pub struct MessageListResponse {
    pub messages: Vec<MessageView>,
}

/// Request body for renaming a session.
#[derive(Debug, Deserialize)]
pub struct RenameSessionRequest {
    pub title: String,
}

/// Response body for rename and delete.
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// POST /api/sessions - Create a new (optionally titled) session.
pub async fn create_session(
    State(state): State<AppState>,
    Json(body): Json<CreateSessionRequest>,
) -> Result<Json<CreateSessionResponse>, ApiError> {
    let session = state.chat_service.create_session(body.title).await?;
    Ok(Json(CreateSessionResponse {
        session_id: session.id,
    }))
}

/// GET /api/sessions - List sessions, most recently active first.
pub async fn list_sessions(
    State(state): State<AppState>,
) -> Result<Json<SessionListResponse>, ApiError> {
    let sessions = state.chat_service.list_sessions().await?;
    Ok(Json(SessionListResponse {
        sessions: sessions.into_iter().map(SessionView::from).collect(),
    }))
}

/// GET /api/sessions/{id}/messages - Get a session's messages in order.
pub async fn list_messages(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<MessageListResponse>, ApiError> {
    let sid = parse_session_id(&session_id)?;
    let messages = state.chat_service.list_messages(sid).await?;
    Ok(Json(MessageListResponse {
        messages: messages.into_iter().map(MessageView::from).collect(),
    }))
}

/// PUT /api/sessions/{id} - Rename a session.
pub async fn rename_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(body): Json<RenameSessionRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let sid = parse_session_id(&session_id)?;
    state.chat_service.rename_session(sid, &body.title).await?;
    Ok(Json(SuccessResponse { success: true }))
}

/// DELETE /api/sessions/{id} - Delete a session and all its messages.
pub async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let sid = parse_session_id(&session_id)?;
    state.chat_service.delete_session(sid).await?;
    Ok(Json(SuccessResponse { success: true }))
}

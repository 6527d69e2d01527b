//! Chat endpoint.
//!
//! POST /api/chat -- send a message, optionally continuing an existing
//! session, and receive the model's reply plus the session id.

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::http::error::ApiError;
use crate::state::AppState;

/// Request body for the chat endpoint.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// The user message to send.
    pub message: String,
    /// Existing session id to continue; if absent, a new session is created.
    pub session_id: Option<String>,
}

/// Response body for a successful exchange.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
    pub session_id: Uuid,
}

/// POST /api/chat -- run one exchange through the chat service.
pub async fn send_chat(
    State(state): State<AppState>,
    Json(body): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let session_id = body
        .session_id
        .as_deref()
        .map(parse_session_id)
        .transpose()?;

    let outcome = state
        .chat_service
        .send_message(&body.message, session_id)
        .await?;

    Ok(Json(ChatResponse {
        reply: outcome.reply,
        session_id: outcome.session_id,
    }))
}

/// Parse a session id from a request, returning a 400 error on invalid format.
pub(crate) fn parse_session_id(s: &str) -> Result<Uuid, ApiError> {
    s.parse::<Uuid>()
        .map_err(|_| ApiError::Validation(format!("Invalid session_id: {s}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_session_id_valid() {
        let id = Uuid::now_v7();
        assert_eq!(parse_session_id(&id.to_string()).unwrap(), id);
    }

    #[test]
    fn test_parse_session_id_invalid() {
        assert!(parse_session_id("not-a-uuid").is_err());
    }

    #[test]
    fn test_chat_request_deserializes_without_session_id() {
        let body: ChatRequest = serde_json::from_str(r#"{"message": "hello"}"#).unwrap();
        assert_eq!(body.message, "hello");
        assert!(body.session_id.is_none());
    }
}

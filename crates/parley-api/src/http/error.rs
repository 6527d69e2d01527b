//! Application error type mapping to HTTP status codes.
//!
//! Every failure becomes a `{"error": "..."}` body with the matching
//! status: 400 for client mistakes, 404 for unknown sessions, 409 for
//! conflicts, 500 for store and provider failures.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use parley_types::error::ChatError;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Failures surfaced by the chat service.
    Chat(ChatError),
    /// Malformed request input (e.g., a bad session id format).
    Validation(String),
}

impl From<ChatError> for ApiError {
    fn from(e: ChatError) -> Self {
        ApiError::Chat(e)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Chat(ChatError::EmptyMessage) => StatusCode::BAD_REQUEST,
            ApiError::Chat(ChatError::UnknownSession(_)) => StatusCode::NOT_FOUND,
            ApiError::Chat(ChatError::DuplicateSession(_)) => StatusCode::CONFLICT,
            ApiError::Chat(ChatError::Store(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Chat(ChatError::Provider(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Chat(e) => e.to_string(),
            ApiError::Validation(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = json!({ "error": self.message() });

        if status.is_server_error() {
            tracing::error!(status = %status, error = %self.message(), "request failed");
        }

        (
            status,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}

//! Gemini Generative Language API types.
//!
//! These are Gemini-specific request/response structures used for HTTP
//! communication with the `generateContent` endpoint. They are NOT the
//! generic exchange types from parley-types -- those are provider-agnostic.

use serde::{Deserialize, Serialize};

/// Request body for `models/{model}:generateContent`.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<GeminiContent>,
}

/// One role-tagged entry in a Gemini conversation.
///
/// Gemini uses `user` and `model` as role strings and wraps text in a
/// list of parts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiContent {
    pub role: String,
    pub parts: Vec<GeminiPart>,
}

/// A single content part. Only text parts are used here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiPart {
    pub text: String,
}

/// Response body for `generateContent`.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<GeminiCandidate>,
}

/// One generated candidate.
#[derive(Debug, Clone, Deserialize)]
pub struct GeminiCandidate {
    pub content: Option<CandidateContent>,
    #[serde(rename = "finishReason")]
    pub finish_reason: Option<String>,
}

/// The content of a candidate; parts may be absent for blocked replies.
#[derive(Debug, Clone, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<GeminiPart>,
}

/// Error envelope returned by the API on non-2xx statuses.
#[derive(Debug, Clone, Deserialize)]
pub struct GeminiErrorResponse {
    pub error: GeminiErrorDetail,
}

/// The error detail inside a [`GeminiErrorResponse`].
#[derive(Debug, Clone, Deserialize)]
pub struct GeminiErrorDetail {
    pub code: i32,
    pub message: String,
    pub status: Option<String>,
}

//! Google Gemini provider.
//!
//! HTTP client for the Generative Language API's `generateContent`
//! endpoint, plus the wire types it speaks.

pub mod client;
pub mod types;

pub use client::GeminiProvider;

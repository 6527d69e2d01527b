//! LLM provider implementations.
//!
//! Contains concrete implementations of the [`LlmProvider`] trait defined
//! in `parley-core`.
//!
//! [`LlmProvider`]: parley_core::llm::provider::LlmProvider

pub mod gemini;

//! LLM provider abstraction.
//!
//! Defines the `LlmProvider` trait that concrete provider clients
//! implement in `parley-infra`.

pub mod provider;

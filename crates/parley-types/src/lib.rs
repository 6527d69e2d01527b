//! Shared domain types for Parley.
//!
//! This crate contains the core domain types used across the Parley service:
//! sessions, messages, provider exchange shapes, and their error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod chat;
pub mod config;
pub mod error;
pub mod llm;

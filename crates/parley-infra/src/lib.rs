//! Infrastructure layer for Parley.
//!
//! Contains implementations of the ports defined in `parley-core`:
//! SQLite storage for sessions and messages, the Gemini HTTP provider
//! client, and configuration loading.

pub mod config;
pub mod llm;
pub mod sqlite;

//! Session lifecycle and history reconstruction.
//!
//! The chat module holds the core of the service: the `ChatRepository`
//! persistence port, the in-memory `ProviderContext` and its cache, and
//! the `ChatService` orchestrator that ties them together.

pub mod cache;
pub mod context;
pub mod repository;
pub mod service;

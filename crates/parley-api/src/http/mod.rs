//! HTTP/REST API layer for Parley.
//!
//! Axum-based API at `/api/` with flat JSON responses and CORS support.
//! Handlers only marshal requests and responses; all decisions live in
//! the chat service.

pub mod error;
pub mod handlers;
pub mod router;

//! Service configuration types for Parley.
//!
//! `Config` represents the optional `config.toml` in the data directory.
//! All fields have sensible defaults; the provider API key is NOT part of
//! this file -- it comes from the environment only.

use serde::{Deserialize, Serialize};

/// Top-level configuration for the Parley service.
///
/// Loaded from `{data_dir}/config.toml` when present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Address the HTTP server binds to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port the HTTP server listens on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Model identifier sent to the provider.
    #[serde(default = "default_model")]
    pub model: String,

    /// Maximum number of live provider contexts kept in the cache before
    /// least-recently-used eviction kicks in.
    #[serde(default = "default_context_cache_capacity")]
    pub context_cache_capacity: usize,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8002
}

fn default_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_context_cache_capacity() -> usize {
    256
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            model: default_model(),
            context_cache_capacity: default_context_cache_capacity(),
        }
    }
}

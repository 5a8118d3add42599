//! Runtime configuration for the model client and the HTTP server.
//!
//! Values come from CLI flags (with environment fallbacks) in `main.rs`;
//! this module only holds the resolved settings and derives endpoints.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use crate::consts::{
    DEFAULT_API_BASE, DEFAULT_CHAT_MODEL, DEFAULT_EMBEDDING_MODEL, DEFAULT_PORT, DEFAULT_READ_ROOT,
};

/// Connection settings for the OpenAI-compatible completion service.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub api_base: String,
    pub api_key: String,
    pub chat_model: String,
    pub embedding_model: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            api_key: String::new(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
        }
    }
}

impl ModelConfig {
    pub fn chat_completions_url(&self) -> String {
        join_url(&self.api_base, "chat/completions")
    }

    pub fn embeddings_url(&self) -> String {
        join_url(&self.api_base, "embeddings")
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

/// Where to listen and what `/read` may serve.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    /// `None` disables path confinement for `/read`.
    pub read_root: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT)),
            read_root: Some(PathBuf::from(DEFAULT_READ_ROOT)),
        }
    }
}

/// Join a base URL and a relative endpoint, tolerating a missing or doubled slash.
fn join_url(base: &str, endpoint: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        endpoint.trim_start_matches('/')
    )
}

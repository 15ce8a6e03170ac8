//! Client configuration.
//!
//! Defaults match a local development server. `from_env` reads
//! `SOCIAL_API_URL` (base URL) and `SOCIAL_TOKEN_PATH` (file that persists
//! the bearer token; unset keeps the token in memory only).

use std::path::PathBuf;
use std::sync::Arc;

use crate::storage::{FileTokenStore, MemoryTokenStore, TokenStore};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const BASE_URL_VAR: &str = "SOCIAL_API_URL";
pub const TOKEN_PATH_VAR: &str = "SOCIAL_TOKEN_PATH";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub token_path: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token_path: None,
        }
    }

    pub fn with_token_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_path = Some(path.into());
        self
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let base_url = lookup(BASE_URL_VAR)
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let config = Self::new(&base_url);
        match lookup(TOKEN_PATH_VAR).filter(|path| !path.is_empty()) {
            Some(path) => config.with_token_path(path),
            None => config,
        }
    }

    /// The token store this configuration asks for.
    pub fn token_store(&self) -> Arc<dyn TokenStore> {
        match &self.token_path {
            Some(path) => Arc::new(FileTokenStore::new(path.clone())),
            None => Arc::new(MemoryTokenStore::default()),
        }
    }
}

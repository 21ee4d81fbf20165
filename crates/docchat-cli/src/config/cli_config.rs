//! CLI configuration file support
//!
//! Loads configuration from ~/.config/docchat/config.toml

use docchat_core::RetrievalParams;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_SERVER: &str = "http://localhost:8000";

/// CLI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Backend settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Retrieval tuning sent with every question
    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetrievalConfig {
    pub topk: Option<u32>,
    pub rerank_topn: Option<u32>,
}

impl CliConfig {
    /// Load configuration from default path
    pub fn load() -> Self {
        Self::load_from_path(Self::default_path())
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: Option<PathBuf>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).unwrap_or_else(|err| {
                tracing::warn!(path = %path.display(), error = %err, "Ignoring invalid config file");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Get the default configuration file path
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("docchat").join("config.toml"))
    }

    /// Backend URL: command line (or DOCCHAT_SERVER) > config file > default
    pub fn resolve_server(&self, flag: Option<&str>) -> String {
        flag.filter(|s| !s.trim().is_empty())
            .or(self.server.base_url.as_deref())
            .unwrap_or(DEFAULT_SERVER)
            .to_string()
    }

    pub fn retrieval_params(&self) -> RetrievalParams {
        let defaults = RetrievalParams::default();
        RetrievalParams {
            topk: self.retrieval.topk.unwrap_or(defaults.topk),
            rerank_topn: self.retrieval.rerank_topn.unwrap_or(defaults.rerank_topn),
        }
    }
}

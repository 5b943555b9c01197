//! Vector store and pipeline configuration

use std::env;
use std::path::PathBuf;
use url::Url;

use medchat_core::{Error, IndexingConfig, Result};

pub const DEFAULT_INDEX_NAME: &str = "medical-chat";
pub const DEFAULT_TOP_K: usize = 2;
const DEFAULT_CONTROLLER_URL: &str = "https://api.pinecone.io";
const DEFAULT_CLOUD: &str = "aws";
const DEFAULT_REGION: &str = "us-east-1";

/// Credentials and placement for the Pinecone vector store
#[derive(Clone)]
pub struct PineconeConfig {
    pub api_key: String,
    pub controller_url: Url,
    pub cloud: String,
    pub region: String,
}

impl std::fmt::Debug for PineconeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PineconeConfig")
            .field("api_key", &"<redacted>")
            .field("controller_url", &self.controller_url.as_str())
            .field("cloud", &self.cloud)
            .field("region", &self.region)
            .finish()
    }
}

impl PineconeConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Create configuration from an arbitrary key lookup.
    ///
    /// Fails with `Error::Configuration` when `PINECONE_API_KEY` is absent
    /// or blank.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_key = lookup("PINECONE_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                Error::Configuration("PINECONE_API_KEY environment variable not found".to_string())
            })?;

        let controller = lookup("PINECONE_CONTROLLER_URL")
            .unwrap_or_else(|| DEFAULT_CONTROLLER_URL.to_string());
        let controller_url = Url::parse(&controller).map_err(|e| {
            Error::Configuration(format!("PINECONE_CONTROLLER_URL '{}' is not a URL: {}", controller, e))
        })?;

        Ok(Self {
            api_key,
            controller_url,
            cloud: lookup("PINECONE_CLOUD").unwrap_or_else(|| DEFAULT_CLOUD.to_string()),
            region: lookup("PINECONE_REGION").unwrap_or_else(|| DEFAULT_REGION.to_string()),
        })
    }

    /// Create configuration with explicit values
    pub fn new(api_key: impl Into<String>, controller_url: Url) -> Self {
        Self {
            api_key: api_key.into(),
            controller_url,
            cloud: DEFAULT_CLOUD.to_string(),
            region: DEFAULT_REGION.to_string(),
        }
    }
}

/// Settings shared by the indexing and query pipelines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RagConfig {
    pub index_name: String,
    pub data_dir: PathBuf,
    pub top_k: usize,
    pub indexing: IndexingConfig,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            index_name: DEFAULT_INDEX_NAME.to_string(),
            data_dir: PathBuf::from("data"),
            top_k: DEFAULT_TOP_K,
            indexing: IndexingConfig::default(),
        }
    }
}

impl RagConfig {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(name) = lookup("MEDCHAT_INDEX_NAME").filter(|n| !n.trim().is_empty()) {
            config.index_name = name;
        }
        config
    }
}

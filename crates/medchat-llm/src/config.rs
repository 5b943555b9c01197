//! Ollama configuration

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use url::Url;

use medchat_core::{Error, Result};

const DEFAULT_HOST: &str = "http://localhost:11434";
const DEFAULT_LLM_MODEL: &str = "llama2:7b-chat-q4_0";
const DEFAULT_EMBED_MODEL: &str = "all-minilm";
const DEFAULT_EMBED_DIMENSION: usize = 384;
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Configuration for the Ollama generator and embedder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OllamaConfig {
    pub host: Url,
    pub llm_model: String,
    pub embed_model: String,
    pub embed_dimension: usize,
    pub generation_timeout: Duration,
}

impl OllamaConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Create configuration from an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let host = lookup("OLLAMA_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let host = Url::parse(&host)
            .map_err(|e| Error::Configuration(format!("OLLAMA_HOST '{}' is not a URL: {}", host, e)))?;

        let llm_model = lookup("MEDCHAT_LLM_MODEL").unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string());
        let embed_model =
            lookup("MEDCHAT_EMBED_MODEL").unwrap_or_else(|| DEFAULT_EMBED_MODEL.to_string());

        let embed_dimension = match lookup("MEDCHAT_EMBED_DIMENSION") {
            Some(raw) => parse_number::<usize>("MEDCHAT_EMBED_DIMENSION", &raw)?,
            None => DEFAULT_EMBED_DIMENSION,
        };
        if embed_dimension == 0 {
            return Err(Error::Configuration(
                "MEDCHAT_EMBED_DIMENSION must be greater than zero".to_string(),
            ));
        }

        let timeout_secs = match lookup("MEDCHAT_GENERATION_TIMEOUT_SECS") {
            Some(raw) => parse_number::<u64>("MEDCHAT_GENERATION_TIMEOUT_SECS", &raw)?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            host,
            llm_model,
            embed_model,
            embed_dimension,
            generation_timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Create configuration for a specific host with default models
    pub fn new(host: Url) -> Self {
        Self {
            host,
            llm_model: DEFAULT_LLM_MODEL.to_string(),
            embed_model: DEFAULT_EMBED_MODEL.to_string(),
            embed_dimension: DEFAULT_EMBED_DIMENSION,
            generation_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub(crate) fn endpoint(&self, path: &str) -> Result<Url> {
        self.host
            .join(path)
            .map_err(|e| Error::Configuration(format!("invalid Ollama endpoint {}: {}", path, e)))
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| Error::Configuration(format!("{} must be a number, got '{}'", key, raw)))
}

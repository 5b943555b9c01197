//! Answer generator trait and types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::Result;

/// Sampling parameters for a generation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub max_new_tokens: u32,
    pub temperature: f32,
    /// Upper bound on a single generation; the call is abandoned afterwards
    pub timeout: Duration,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_new_tokens: 512,
            temperature: 0.8,
            timeout: Duration::from_secs(120),
        }
    }
}

/// Trait for answer generators (e.g., a local Llama model behind Ollama)
#[async_trait]
pub trait Generator: Send + Sync {
    /// Produce a completion for `prompt`.
    ///
    /// Implementations report model failures as `Error::Generation` and
    /// an exceeded `config.timeout` as `Error::Timeout`.
    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String>;

    /// Get the model ID being used
    fn model_id(&self) -> &str;
}

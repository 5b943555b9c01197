//! Ollama generation client

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::timeout;

use medchat_core::{Error, GenerationConfig, Generator, Result};

use crate::config::OllamaConfig;

/// Answer generator backed by a local Ollama server
pub struct OllamaGenerator {
    config: OllamaConfig,
    client: Client,
}

#[derive(Serialize)]
struct GenerateOptions {
    num_predict: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

impl OllamaGenerator {
    /// Create a new generator from configuration
    pub fn new(config: OllamaConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self { config, client })
    }

    /// Create a new generator from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(OllamaConfig::from_env()?)
    }

    /// Timeout configured for this deployment, used to seed `GenerationConfig`
    pub fn default_timeout(&self) -> Duration {
        self.config.generation_timeout
    }

    async fn perform_generation(&self, prompt: &str, config: &GenerationConfig) -> Result<String> {
        let url = self.config.endpoint("/api/generate")?;
        let request_body = GenerateRequest {
            model: &self.config.llm_model,
            prompt,
            stream: false,
            options: GenerateOptions {
                num_predict: config.max_new_tokens,
                temperature: config.temperature,
            },
        };

        let response = self
            .client
            .post(url)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| Error::Generation(format!("Ollama request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            return Err(Error::Generation(format!(
                "Ollama generate failed with status {}: {}",
                status, detail
            )));
        }

        let data: GenerateResponse = response
            .json()
            .await
            .map_err(|e| Error::Generation(format!("malformed Ollama response: {}", e)))?;

        let answer = data.response.trim().to_string();
        if answer.is_empty() {
            return Err(Error::Generation("model returned an empty answer".to_string()));
        }
        Ok(answer)
    }
}

#[async_trait]
impl Generator for OllamaGenerator {
    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String> {
        let generation = self.perform_generation(prompt, config);

        match timeout(config.timeout, generation).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout(format!(
                "generation exceeded {}s",
                config.timeout.as_secs_f32()
            ))),
        }
    }

    fn model_id(&self) -> &str {
        &self.config.llm_model
    }
}

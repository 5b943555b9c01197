//! Ollama embedding client

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use medchat_core::{Embedder, Error, Result, check_dimension};

use crate::config::OllamaConfig;

/// Sentence embedder backed by an Ollama embedding model
pub struct OllamaEmbedder {
    config: OllamaConfig,
    client: Client,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl OllamaEmbedder {
    pub fn new(config: OllamaConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self { config, client })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(OllamaConfig::from_env()?)
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    fn dimension(&self) -> usize {
        self.config.embed_dimension
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| Error::Generation("Ollama returned no embedding".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = self.config.endpoint("/api/embed")?;
        let response = self
            .client
            .post(url)
            .json(&EmbedRequest {
                model: &self.config.embed_model,
                input: texts,
            })
            .send()
            .await
            .map_err(|e| Error::Generation(format!("Ollama embed request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Generation(format!(
                "Ollama embed failed with status {}: {}",
                status, body
            )));
        }

        let data: EmbedResponse = response
            .json()
            .await
            .map_err(|e| Error::Generation(format!("malformed Ollama embed response: {}", e)))?;

        if data.embeddings.len() != texts.len() {
            return Err(Error::Generation(format!(
                "asked for {} embeddings, received {}",
                texts.len(),
                data.embeddings.len()
            )));
        }
        for vector in &data.embeddings {
            check_dimension(vector, self.config.embed_dimension)?;
        }

        Ok(data.embeddings)
    }

    fn model_id(&self) -> &str {
        &self.config.embed_model
    }
}

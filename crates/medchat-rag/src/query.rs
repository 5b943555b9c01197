//! Online query pipeline: embed → search → prompt → generate

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::time::timeout;

use medchat_core::{
    Embedder, Error, GenerationConfig, Generator, PromptTemplate, Result, RetryConfig, ScoredText,
    VectorIndex, rank, with_retry,
};

use crate::config::{DEFAULT_INDEX_NAME, DEFAULT_TOP_K};

/// Settings for answering queries
#[derive(Debug, Clone, PartialEq)]
pub struct QueryConfig {
    pub index_name: String,
    pub top_k: usize,
    pub generation: GenerationConfig,
    pub retry: RetryConfig,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            index_name: DEFAULT_INDEX_NAME.to_string(),
            top_k: DEFAULT_TOP_K,
            generation: GenerationConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

/// A generated answer and the context it was conditioned on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    pub context: Vec<ScoredText>,
}

/// Answers questions from the indexed corpus
pub struct QueryPipeline {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    generator: Arc<dyn Generator>,
    template: PromptTemplate,
    config: QueryConfig,
}

impl QueryPipeline {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        generator: Arc<dyn Generator>,
        config: QueryConfig,
    ) -> Self {
        Self {
            embedder,
            index,
            generator,
            template: PromptTemplate::default(),
            config,
        }
    }

    pub fn with_template(mut self, template: PromptTemplate) -> Self {
        self.template = template;
        self
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// The `top_k` stored chunks most similar to `question`, best first
    pub async fn retrieve(&self, question: &str) -> Result<Vec<ScoredText>> {
        let question = validate(question)?;
        let retry = &self.config.retry;

        let vector = with_retry(retry, "embed query", || self.embedder.embed(question)).await?;
        let matches = with_retry(retry, "vector search", || {
            self.index.query(&self.config.index_name, &vector, self.config.top_k)
        })
        .await?;

        Ok(rank(matches, self.config.top_k))
    }

    /// Fill the prompt template from retrieved chunks
    pub fn build_prompt(&self, context: &[ScoredText], question: &str) -> String {
        self.template.render(&join_context(context), question)
    }

    /// Answer `question` using retrieved context
    pub async fn answer(&self, question: &str) -> Result<Answer> {
        let question = validate(question)?;
        let context = self.retrieve(question).await?;
        tracing::debug!(matches = context.len(), "retrieved context");

        let prompt = self.build_prompt(&context, question);
        let text = with_retry(&self.config.retry, "generate answer", || self.generate(&prompt)).await?;

        Ok(Answer { text, context })
    }

    /// One generator call, abandoned once the configured timeout elapses
    async fn generate(&self, prompt: &str) -> Result<String> {
        let generation = &self.config.generation;
        match timeout(generation.timeout, self.generator.generate(prompt, generation)).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout(format!(
                "{} did not answer within {}s",
                self.generator.model_id(),
                generation.timeout.as_secs_f32()
            ))),
        }
    }
}

fn validate(question: &str) -> Result<&str> {
    let trimmed = question.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput("question must not be empty".to_string()));
    }
    Ok(trimmed)
}

/// Retrieved texts joined by a blank line, best match first
pub fn join_context(context: &[ScoredText]) -> String {
    context
        .iter()
        .map(|m| m.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

//! Embedder trait

use async_trait::async_trait;

use crate::{Error, Result};

/// Maps text to a fixed-length vector.
///
/// Implementations must be deterministic for a given model and text, and
/// every vector they return must have exactly [`Embedder::dimension`]
/// components.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Length of every vector this embedder produces
    fn dimension(&self) -> usize;

    /// Embed a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed several texts, preserving order
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }

    /// Model identifier, for logs
    fn model_id(&self) -> &str;
}

/// Reject a vector whose length differs from `expected`.
pub fn check_dimension(vector: &[f32], expected: usize) -> Result<()> {
    if vector.len() != expected {
        return Err(Error::Configuration(format!(
            "embedding dimension mismatch: expected {}, got {}",
            expected,
            vector.len()
        )));
    }
    Ok(())
}

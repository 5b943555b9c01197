//! Vector index trait and types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::Result;

/// Similarity metric an index is created with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Cosine,
    Euclidean,
    Dotproduct,
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Metric::Cosine => "cosine",
            Metric::Euclidean => "euclidean",
            Metric::Dotproduct => "dotproduct",
        };
        f.write_str(name)
    }
}

/// Parameters for creating a named index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSpec {
    pub name: String,
    pub dimension: usize,
    pub metric: Metric,
}

impl IndexSpec {
    pub fn cosine(name: impl Into<String>, dimension: usize) -> Self {
        Self {
            name: name.into(),
            dimension,
            metric: Metric::Cosine,
        }
    }
}

/// An entry stored in a vector index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub id: String,
    pub values: Vec<f32>,
    pub text: String,
    pub metadata: serde_json::Value,
}

/// A stored text together with its similarity to a query vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredText {
    pub text: String,
    pub score: f32,
    pub metadata: serde_json::Value,
}

/// Sort by descending score and keep the first `k`.
pub fn rank(mut matches: Vec<ScoredText>, k: usize) -> Vec<ScoredText> {
    matches.sort_by(|a, b| b.score.total_cmp(&a.score));
    matches.truncate(k);
    matches
}

/// Trait for vector indexes (e.g., Pinecone, in-memory)
///
/// Implementations must tolerate concurrent readers.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Create a new index. Fails if the name is already taken.
    async fn create_index(&self, spec: &IndexSpec) -> Result<()>;

    /// Names of all existing indexes
    async fn list_indexes(&self) -> Result<HashSet<String>>;

    /// Dimension an existing index was created with
    async fn index_dimension(&self, name: &str) -> Result<usize>;

    /// Insert or replace entries, returning how many were written
    async fn upsert(&self, name: &str, entries: Vec<IndexEntry>) -> Result<usize>;

    /// The `k` entries most similar to `vector`, highest score first
    async fn query(&self, name: &str, vector: &[f32], k: usize) -> Result<Vec<ScoredText>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scored(text: &str, score: f32) -> ScoredText {
        ScoredText {
            text: text.to_string(),
            score,
            metadata: json!({}),
        }
    }

    #[test]
    fn test_rank_orders_descending_and_truncates() {
        let ranked = rank(
            vec![scored("low", 0.1), scored("high", 0.9), scored("mid", 0.5)],
            2,
        );
        let texts: Vec<&str> = ranked.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["high", "mid"]);
    }

    #[test]
    fn test_rank_with_fewer_matches_than_k() {
        let ranked = rank(vec![scored("only", 0.3)], 2);
        assert_eq!(ranked.len(), 1);
    }

    #[test]
    fn test_metric_wire_names() {
        assert_eq!(Metric::Cosine.to_string(), "cosine");
        assert_eq!(serde_json::to_value(Metric::Dotproduct).unwrap(), json!("dotproduct"));
    }
}

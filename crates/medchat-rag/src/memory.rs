//! In-memory vector index

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use medchat_core::{
    Error, IndexEntry, IndexSpec, Metric, Result, ScoredText, VectorIndex, check_dimension, rank,
};

struct NamedIndex {
    spec: IndexSpec,
    entries: Vec<IndexEntry>,
}

/// Local in-memory vector index implementation
///
/// Brute-force search over every entry. Suitable for tests and small
/// offline corpora; contents are lost when the process exits.
#[derive(Default)]
pub struct InMemoryVectorIndex {
    indexes: RwLock<HashMap<String, NamedIndex>>,
}

impl InMemoryVectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries stored under `name`
    pub fn len(&self, name: &str) -> Result<usize> {
        let indexes = self.read()?;
        indexes
            .get(name)
            .map(|index| index.entries.len())
            .ok_or_else(|| Error::Retrieval(format!("index '{}' does not exist", name)))
    }

    /// All entries stored under `name`, in insertion order
    pub fn entries(&self, name: &str) -> Result<Vec<IndexEntry>> {
        let indexes = self.read()?;
        indexes
            .get(name)
            .map(|index| index.entries.clone())
            .ok_or_else(|| Error::Retrieval(format!("index '{}' does not exist", name)))
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, HashMap<String, NamedIndex>>> {
        self.indexes
            .read()
            .map_err(|e| Error::Retrieval(format!("Lock error: {}", e)))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<String, NamedIndex>>> {
        self.indexes
            .write()
            .map_err(|e| Error::Retrieval(format!("Lock error: {}", e)))
    }
}

fn similarity(metric: Metric, a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    match metric {
        Metric::Dotproduct => dot,
        Metric::Cosine => {
            let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
            let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm_a == 0.0 || norm_b == 0.0 {
                0.0
            } else {
                dot / (norm_a * norm_b)
            }
        }
        // Negated distance so that larger is still more similar
        Metric::Euclidean => -a
            .iter()
            .zip(b)
            .map(|(x, y)| (x - y) * (x - y))
            .sum::<f32>()
            .sqrt(),
    }
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    async fn create_index(&self, spec: &IndexSpec) -> Result<()> {
        if spec.dimension == 0 {
            return Err(Error::Configuration("index dimension must be greater than zero".to_string()));
        }
        let mut indexes = self.write()?;
        if indexes.contains_key(&spec.name) {
            return Err(Error::Configuration(format!("index '{}' already exists", spec.name)));
        }
        indexes.insert(
            spec.name.clone(),
            NamedIndex {
                spec: spec.clone(),
                entries: Vec::new(),
            },
        );
        Ok(())
    }

    async fn list_indexes(&self) -> Result<HashSet<String>> {
        Ok(self.read()?.keys().cloned().collect())
    }

    async fn index_dimension(&self, name: &str) -> Result<usize> {
        self.read()?
            .get(name)
            .map(|index| index.spec.dimension)
            .ok_or_else(|| Error::Retrieval(format!("index '{}' does not exist", name)))
    }

    async fn upsert(&self, name: &str, entries: Vec<IndexEntry>) -> Result<usize> {
        let mut indexes = self.write()?;
        let index = indexes
            .get_mut(name)
            .ok_or_else(|| Error::Retrieval(format!("index '{}' does not exist", name)))?;

        // Validate the whole batch before touching stored entries
        for entry in &entries {
            check_dimension(&entry.values, index.spec.dimension)?;
        }

        let count = entries.len();
        for entry in entries {
            match index.entries.iter_mut().find(|e| e.id == entry.id) {
                Some(existing) => *existing = entry,
                None => index.entries.push(entry),
            }
        }
        Ok(count)
    }

    async fn query(&self, name: &str, vector: &[f32], k: usize) -> Result<Vec<ScoredText>> {
        let indexes = self.read()?;
        let index = indexes
            .get(name)
            .ok_or_else(|| Error::Retrieval(format!("index '{}' does not exist", name)))?;
        check_dimension(vector, index.spec.dimension)?;

        let matches = index
            .entries
            .iter()
            .map(|entry| ScoredText {
                text: entry.text.clone(),
                score: similarity(index.spec.metric, vector, &entry.values),
                metadata: entry.metadata.clone(),
            })
            .collect();

        Ok(rank(matches, k))
    }
}

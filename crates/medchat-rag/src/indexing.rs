//! Offline indexing pipeline: load → chunk → embed → upsert

use chrono::Utc;
use futures::stream::{self, StreamExt, TryStreamExt};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

use medchat_core::{
    Chunk, Document, Embedder, Error, IndexEntry, IndexSpec, IndexingConfig, IndexingReport, Result,
    RetryConfig, VectorIndex, check_dimension, with_retry,
};

use crate::chunker::Chunker;
use crate::loader::DirectoryLoader;

/// Embedding requests kept in flight at once
const EMBED_CONCURRENCY: usize = 4;

/// Builds a vector index from a directory of documents.
///
/// Loading, chunking and embedding all finish before the first upsert, so
/// bad input never leaves a half-written index. Entries get fresh ids on
/// every run; indexing the same corpus twice stores it twice.
pub struct IndexingPipeline {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    index_name: String,
    config: IndexingConfig,
    retry: RetryConfig,
}

impl IndexingPipeline {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        index_name: impl Into<String>,
        config: IndexingConfig,
    ) -> Self {
        Self {
            embedder,
            index,
            index_name: index_name.into(),
            config,
            retry: RetryConfig::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Index every supported file in `dir`
    pub async fn run(&self, dir: &Path) -> Result<IndexingReport> {
        self.config.validate()?;
        tracing::info!(dir = %dir.display(), index = %self.index_name, "indexing started");

        let documents = DirectoryLoader::new(dir).load().await?;
        self.index_documents(&documents).await
    }

    /// Index already-loaded documents
    pub async fn index_documents(&self, documents: &[Document]) -> Result<IndexingReport> {
        if documents.is_empty() {
            return Err(Error::Data("no documents to index".to_string()));
        }

        let chunker = Chunker::new(&self.config)?;
        let chunks = chunker.chunk_all(documents)?;
        if chunks.is_empty() {
            return Err(Error::Data("documents produced no chunks".to_string()));
        }
        tracing::info!(documents = documents.len(), chunks = chunks.len(), "chunked documents");

        let created_index = self.ensure_index().await?;
        let entries = self.embed_chunks(&chunks).await?;
        let upserted = self.upsert_all(entries).await?;

        let report = IndexingReport {
            index_name: self.index_name.clone(),
            documents: documents.len(),
            chunks: chunks.len(),
            upserted,
            created_index,
        };
        tracing::info!(
            index = %report.index_name,
            documents = report.documents,
            chunks = report.chunks,
            upserted = report.upserted,
            "documents indexed successfully"
        );
        Ok(report)
    }

    /// Create the index if missing; returns whether it was created
    async fn ensure_index(&self) -> Result<bool> {
        let dimension = self.embedder.dimension();
        let existing = with_retry(&self.retry, "list indexes", || self.index.list_indexes()).await?;

        if existing.contains(&self.index_name) {
            let stored = self.index.index_dimension(&self.index_name).await?;
            if stored != dimension {
                return Err(Error::Configuration(format!(
                    "index '{}' has dimension {} but embedder '{}' produces {}",
                    self.index_name,
                    stored,
                    self.embedder.model_id(),
                    dimension
                )));
            }
            return Ok(false);
        }

        self.index
            .create_index(&IndexSpec::cosine(&self.index_name, dimension))
            .await?;
        Ok(true)
    }

    async fn embed_chunks(&self, chunks: &[Chunk]) -> Result<Vec<IndexEntry>> {
        let dimension = self.embedder.dimension();
        let indexed_at = Utc::now().to_rfc3339();

        let batches: Vec<Vec<Vec<f32>>> = stream::iter(chunks.chunks(self.config.batch_size))
            .map(|batch| async move {
                let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
                let vectors = with_retry(&self.retry, "embed chunks", || {
                    self.embedder.embed_batch(&texts)
                })
                .await?;
                if vectors.len() != batch.len() {
                    return Err(Error::Generation(format!(
                        "embedder returned {} vectors for {} chunks",
                        vectors.len(),
                        batch.len()
                    )));
                }
                Ok::<_, Error>(vectors)
            })
            .buffered(EMBED_CONCURRENCY)
            .try_collect()
            .await?;

        let mut entries = Vec::with_capacity(chunks.len());
        for (chunk, values) in chunks.iter().zip(batches.into_iter().flatten()) {
            check_dimension(&values, dimension)?;
            entries.push(IndexEntry {
                id: Uuid::new_v4().to_string(),
                values,
                text: chunk.text.clone(),
                metadata: json!({
                    "source": chunk.source_path.display().to_string(),
                    "page": chunk.page,
                    "chunk_index": chunk.sequence_index,
                    "indexed_at": indexed_at,
                }),
            });
        }
        Ok(entries)
    }

    async fn upsert_all(&self, entries: Vec<IndexEntry>) -> Result<usize> {
        let total = entries.len();
        let mut upserted = 0;

        for batch in entries.chunks(self.config.batch_size) {
            let result = with_retry(&self.retry, "upsert", || {
                self.index.upsert(&self.index_name, batch.to_vec())
            })
            .await;

            match result {
                Ok(count) => {
                    upserted += count;
                    tracing::debug!(upserted, total, "upserted batch");
                }
                Err(e) => {
                    if upserted > 0 {
                        tracing::error!(
                            index = %self.index_name,
                            upserted,
                            total,
                            error = %e,
                            "indexing aborted after partial upsert"
                        );
                    }
                    return Err(e);
                }
            }
        }
        Ok(upserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::HashingEmbedder;
    use crate::memory::InMemoryVectorIndex;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn small_config() -> IndexingConfig {
        IndexingConfig {
            chunk_size: 40,
            chunk_overlap: 5,
            batch_size: 3,
        }
    }

    fn document(text: &str) -> Document {
        Document {
            source_path: PathBuf::from("data/pharmacology.pdf"),
            page: 1,
            raw_text: text.to_string(),
        }
    }

    #[tokio::test]
    async fn test_one_entry_per_chunk_with_index_dimension() {
        let index = Arc::new(InMemoryVectorIndex::new());
        let pipeline = IndexingPipeline::new(
            Arc::new(HashingEmbedder::new(32)),
            index.clone(),
            "medical-chat",
            small_config(),
        );

        let text = "Aspirin is used to reduce pain, fever and inflammation. \
                    Paracetamol reduces fever. Ibuprofen is a non-steroidal anti-inflammatory drug.";
        let expected_chunks = Chunker::new(&small_config())
            .unwrap()
            .chunk_document(&document(text))
            .unwrap()
            .len();

        let report = pipeline.index_documents(&[document(text)]).await.unwrap();
        assert!(report.created_index);
        assert_eq!(report.chunks, expected_chunks);
        assert_eq!(report.upserted, expected_chunks);

        let entries = index.entries("medical-chat").unwrap();
        assert_eq!(entries.len(), expected_chunks);
        let dimension = index.index_dimension("medical-chat").await.unwrap();
        assert_eq!(dimension, 32);
        assert!(entries.iter().all(|e| e.values.len() == dimension));
        assert_eq!(entries[0].metadata["source"], "data/pharmacology.pdf");
        assert_eq!(entries[1].metadata["chunk_index"], 1);
    }

    #[tokio::test]
    async fn test_existing_index_is_reused_and_reindex_duplicates() {
        let index = Arc::new(InMemoryVectorIndex::new());
        let pipeline = IndexingPipeline::new(
            Arc::new(HashingEmbedder::new(16)),
            index.clone(),
            "medical-chat",
            small_config(),
        );

        let first = pipeline.index_documents(&[document("Aspirin reduces pain.")]).await.unwrap();
        let second = pipeline.index_documents(&[document("Aspirin reduces pain.")]).await.unwrap();
        assert!(first.created_index);
        assert!(!second.created_index);
        assert_eq!(index.len("medical-chat").unwrap(), 2);
    }

    #[tokio::test]
    async fn test_dimension_mismatch_with_existing_index() {
        let index = Arc::new(InMemoryVectorIndex::new());
        index.create_index(&IndexSpec::cosine("medical-chat", 8)).await.unwrap();

        let pipeline = IndexingPipeline::new(
            Arc::new(HashingEmbedder::new(16)),
            index.clone(),
            "medical-chat",
            small_config(),
        );
        let err = pipeline.index_documents(&[document("text")]).await.unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        assert_eq!(index.len("medical-chat").unwrap(), 0);
    }

    #[tokio::test]
    async fn test_empty_chunk_aborts_before_any_upsert() {
        let index = Arc::new(InMemoryVectorIndex::new());
        let pipeline = IndexingPipeline::new(
            Arc::new(HashingEmbedder::new(16)),
            index.clone(),
            "medical-chat",
            IndexingConfig {
                chunk_size: 2,
                chunk_overlap: 0,
                batch_size: 1,
            },
        );

        let documents = [document("good text"), document("ab    cd")];
        let err = pipeline.index_documents(&documents).await.unwrap_err();
        assert!(matches!(err, Error::Data(_)));
        assert!(index.list_indexes().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_run_on_empty_directory_is_data_error() {
        let dir = tempdir().unwrap();
        let pipeline = IndexingPipeline::new(
            Arc::new(HashingEmbedder::new(16)),
            Arc::new(InMemoryVectorIndex::new()),
            "medical-chat",
            IndexingConfig::default(),
        );

        let err = pipeline.run(dir.path()).await.unwrap_err();
        assert!(matches!(err, Error::Data(_)));
    }

    #[tokio::test]
    async fn test_run_loads_directory() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("aspirin.txt"), "Aspirin is used to reduce pain.").unwrap();
        fs::write(dir.path().join("insulin.txt"), "Insulin lowers blood glucose.").unwrap();

        let index = Arc::new(InMemoryVectorIndex::new());
        let pipeline = IndexingPipeline::new(
            Arc::new(HashingEmbedder::new(16)),
            index.clone(),
            "medical-chat",
            IndexingConfig::default(),
        );

        let report = pipeline.run(dir.path()).await.unwrap();
        assert_eq!(report.documents, 2);
        assert_eq!(report.upserted, 2);
    }
}

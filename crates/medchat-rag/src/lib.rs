//! Retrieval-augmented generation pipelines for medchat
//!
//! This crate provides the document loader and chunker, the Pinecone and
//! in-memory vector indexes, an offline hashing embedder, and the indexing
//! and query pipelines that bind them to an embedder and a generator.

mod chunker;
mod config;
mod hashing;
mod indexing;
mod loader;
mod memory;
mod pinecone;
mod query;
#[cfg(any(test, feature = "testing"))]
pub mod testing;


pub use chunker::Chunker;
pub use config::{DEFAULT_INDEX_NAME, DEFAULT_TOP_K, PineconeConfig, RagConfig};
pub use hashing::HashingEmbedder;
pub use indexing::IndexingPipeline;
pub use loader::{DirectoryLoader, normalize_whitespace};
pub use memory::InMemoryVectorIndex;
pub use pinecone::PineconeIndex;
pub use query::{Answer, QueryConfig, QueryPipeline, join_context};

// Re-export core types for convenience
pub use medchat_core::{
    Chunk, Document, Embedder, Error, GenerationConfig, Generator, IndexEntry, IndexSpec,
    IndexingConfig, IndexingReport, Result, RetryConfig, ScoredText, VectorIndex,
};

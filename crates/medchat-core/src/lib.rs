//! Core traits and types for medchat
//!
//! This crate defines the seams of the retrieval-augmented chatbot: the
//! `Embedder`, `VectorIndex` and `Generator` traits that backends implement,
//! the document and chunk types the indexing pipeline passes around, the
//! prompt template, and the shared error type.

pub mod document;
pub mod embedder;
pub mod error;
pub mod llm;
pub mod prompt;
pub mod types;
pub mod vector_index;

pub use document::{Chunk, Document, IndexingConfig, IndexingReport};
pub use embedder::{Embedder, check_dimension};
pub use error::{Error, Result};
pub use llm::{GenerationConfig, Generator};
pub use prompt::{DEFAULT_TEMPLATE, PromptTemplate, build_prompt};
pub use types::{RetryConfig, with_retry};
pub use vector_index::{IndexEntry, IndexSpec, Metric, ScoredText, VectorIndex, rank};

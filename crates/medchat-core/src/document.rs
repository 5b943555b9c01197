//! Document, chunk and indexing types

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::{Error, Result};

/// Text of one page of a source file, as produced by a loader
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub source_path: PathBuf,
    /// 1-based page number; plain-text files are a single page
    pub page: usize,
    pub raw_text: String,
}

/// A bounded, possibly overlapping slice of a document's text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub source_path: PathBuf,
    pub page: usize,
    /// Position of this chunk within its document
    pub sequence_index: usize,
}

/// Configuration for document indexing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexingConfig {
    /// Maximum chunk length in characters
    pub chunk_size: usize,
    /// Characters shared by adjacent chunks of the same document
    pub chunk_overlap: usize,
    /// Entries per upsert request
    pub batch_size: usize,
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 20,
            batch_size: 100,
        }
    }
}

impl IndexingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::Configuration("chunk_size must be greater than zero".to_string()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(Error::Configuration(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.batch_size == 0 {
            return Err(Error::Configuration("batch_size must be greater than zero".to_string()));
        }
        Ok(())
    }
}

/// Summary of a completed indexing run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexingReport {
    pub index_name: String,
    pub documents: usize,
    pub chunks: usize,
    pub upserted: usize,
    pub created_index: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = IndexingConfig::default();
        assert_eq!(config.chunk_size, 500);
        assert_eq!(config.chunk_overlap, 20);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overlap_must_be_smaller_than_size() {
        let config = IndexingConfig {
            chunk_size: 10,
            chunk_overlap: 10,
            batch_size: 1,
        };
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_zero_sizes_rejected() {
        let zero_chunk = IndexingConfig {
            chunk_size: 0,
            chunk_overlap: 0,
            batch_size: 1,
        };
        assert!(zero_chunk.validate().is_err());

        let zero_batch = IndexingConfig {
            batch_size: 0,
            ..IndexingConfig::default()
        };
        assert!(zero_batch.validate().is_err());
    }
}

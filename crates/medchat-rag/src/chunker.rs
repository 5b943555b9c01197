//! Fixed-window text chunking with overlap

use medchat_core::{Chunk, Document, Error, IndexingConfig, Result};

/// Splits documents into windows of `chunk_size` characters where each
/// window starts `chunk_size - chunk_overlap` characters after the last.
#[derive(Debug, Clone)]
pub struct Chunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Chunker {
    pub fn new(config: &IndexingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
        })
    }

    /// Chunk a document into smaller pieces
    pub fn chunk_document(&self, document: &Document) -> Result<Vec<Chunk>> {
        let chars: Vec<char> = document.raw_text.chars().collect();
        let mut chunks = Vec::new();
        let mut start = 0;

        while start < chars.len() {
            let end = (start + self.chunk_size).min(chars.len());
            let text: String = chars[start..end].iter().collect();

            if text.trim().is_empty() {
                return Err(Error::Data(format!(
                    "empty chunk {} in {} page {}",
                    chunks.len(),
                    document.source_path.display(),
                    document.page
                )));
            }

            chunks.push(Chunk {
                text,
                source_path: document.source_path.clone(),
                page: document.page,
                sequence_index: chunks.len(),
            });

            if end >= chars.len() {
                break;
            }
            start = end - self.chunk_overlap;
        }

        Ok(chunks)
    }

    /// Chunk every document, failing on the first bad chunk
    pub fn chunk_all(&self, documents: &[Document]) -> Result<Vec<Chunk>> {
        let mut all = Vec::new();
        for document in documents {
            all.extend(self.chunk_document(document)?);
        }
        Ok(all)
    }
}

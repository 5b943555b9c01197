//! Loads documents from a source directory

use regex::Regex;
use std::panic;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use medchat_core::{Document, Error, Result};

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceKind {
    Pdf,
    Text,
}

impl SourceKind {
    fn of(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(SourceKind::Pdf),
            "txt" | "md" => Some(SourceKind::Text),
            _ => None,
        }
    }
}

/// Reads every supported file directly inside a directory.
///
/// PDFs yield one document per non-blank page. Plain-text and Markdown
/// files yield a single document. Other files are ignored.
#[derive(Debug, Clone)]
pub struct DirectoryLoader {
    dir: PathBuf,
}

impl DirectoryLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub async fn load(&self) -> Result<Vec<Document>> {
        let mut entries = tokio::fs::read_dir(&self.dir).await.map_err(|e| {
            Error::Data(format!("cannot read data directory {}: {}", self.dir.display(), e))
        })?;

        let mut sources = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !entry.file_type().await?.is_file() {
                continue;
            }
            match SourceKind::of(&path) {
                Some(kind) => sources.push((path, kind)),
                None => tracing::debug!(path = %path.display(), "skipping unsupported file"),
            }
        }
        sources.sort_by(|a, b| a.0.cmp(&b.0));

        let mut documents = Vec::new();
        for (path, kind) in sources {
            let pages = match kind {
                SourceKind::Pdf => load_pdf(&path).await?,
                SourceKind::Text => vec![load_text(&path).await?],
            };
            let before = documents.len();
            documents.extend(pages_to_documents(&path, pages));
            tracing::info!(
                path = %path.display(),
                pages = documents.len() - before,
                "loaded document"
            );
        }

        if documents.is_empty() {
            return Err(Error::Data(format!(
                "no documents with text found in {}",
                self.dir.display()
            )));
        }
        Ok(documents)
    }
}

async fn load_pdf(path: &Path) -> Result<Vec<String>> {
    let bytes = tokio::fs::read(path).await?;
    let display = path.display().to_string();

    tokio::task::spawn_blocking(move || {
        // pdf-extract panics on some fonts instead of returning an error
        match panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(&bytes)) {
            Ok(Ok(pages)) => Ok(pages),
            Ok(Err(e)) => Err(Error::Data(format!("failed to extract text from {}: {}", display, e))),
            Err(_) => Err(Error::Data(format!("PDF parser crashed on {}", display))),
        }
    })
    .await
    .map_err(|e| Error::Data(format!("PDF extraction task failed: {}", e)))?
}

async fn load_text(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| Error::Data(format!("cannot read {} as UTF-8 text: {}", path.display(), e)))
}

fn pages_to_documents(path: &Path, pages: Vec<String>) -> Vec<Document> {
    pages
        .into_iter()
        .enumerate()
        .filter_map(|(i, raw)| {
            let text = normalize_whitespace(&raw);
            if text.is_empty() {
                tracing::warn!(path = %path.display(), page = i + 1, "skipping blank page");
                return None;
            }
            Some(Document {
                source_path: path.to_path_buf(),
                page: i + 1,
                raw_text: text,
            })
        })
        .collect()
}

/// Collapse runs of whitespace into single spaces and trim the ends
pub fn normalize_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

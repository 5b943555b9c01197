use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use medchat_core::GenerationConfig;
use medchat_llm::{OllamaConfig, OllamaEmbedder, OllamaGenerator};
use medchat_rag::{IndexingPipeline, PineconeConfig, PineconeIndex, QueryConfig, QueryPipeline, RagConfig};
use medchat_web::AppContext;

#[derive(Parser)]
#[command(name = "medchat")]
#[command(about = "Retrieval-augmented medical question answering", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load, chunk, embed and upload the documents in a directory
    Index {
        /// Directory holding the PDF corpus
        #[arg(long, env = "MEDCHAT_DATA_DIR")]
        data_dir: Option<PathBuf>,
    },
    /// Serve the chat page and question endpoint
    Serve {
        #[arg(long, default_value = "0.0.0.0")]
        host: IpAddr,
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
}

/// Everything read from the environment at startup
struct Settings {
    pinecone: PineconeConfig,
    ollama: OllamaConfig,
    rag: RagConfig,
}

impl Settings {
    /// Must run before any directory is read or port bound, so a missing
    /// `PINECONE_API_KEY` stops both subcommands up front.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> medchat_core::Result<Self> {
        let pinecone = PineconeConfig::from_lookup(&lookup)?;
        let ollama = OllamaConfig::from_lookup(&lookup)?;
        let rag = RagConfig::from_lookup(&lookup);
        Ok(Self { pinecone, ollama, rag })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let Settings { pinecone, ollama, rag } = Settings::from_lookup(|key| std::env::var(key).ok())?;

    let index = Arc::new(PineconeIndex::new(pinecone)?);
    let embedder = Arc::new(OllamaEmbedder::new(ollama.clone())?);

    match cli.command {
        Command::Index { data_dir } => {
            let data_dir = data_dir.unwrap_or(rag.data_dir);
            let pipeline = IndexingPipeline::new(
                embedder,
                index,
                rag.index_name,
                rag.indexing,
            );

            let report = pipeline
                .run(&data_dir)
                .await
                .with_context(|| format!("indexing {} failed", data_dir.display()))?;
            println!(
                "Documents indexed successfully! {} documents, {} chunks into '{}'{}",
                report.documents,
                report.chunks,
                report.index_name,
                if report.created_index { " (new index)" } else { "" }
            );
        }
        Command::Serve { host, port } => {
            let generator = Arc::new(OllamaGenerator::new(ollama)?);
            let config = QueryConfig {
                index_name: rag.index_name,
                top_k: rag.top_k,
                generation: GenerationConfig {
                    timeout: generator.default_timeout(),
                    ..GenerationConfig::default()
                },
                ..QueryConfig::default()
            };

            let ctx = AppContext::new(QueryPipeline::new(embedder, index, generator, config));
            medchat_web::serve(ctx, SocketAddr::new(host, port)).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use medchat_core::Error;

    #[test]
    fn test_missing_pinecone_key_fails_startup() {
        let err = Settings::from_lookup(|_| None).err().unwrap();
        assert!(matches!(err, Error::Configuration(_)));
        assert!(err.to_string().contains("PINECONE_API_KEY"));
    }

    #[test]
    fn test_settings_with_key() {
        let settings = Settings::from_lookup(|key| {
            (key == "PINECONE_API_KEY").then(|| "pc-test".to_string())
        })
        .unwrap();
        assert_eq!(settings.pinecone.api_key, "pc-test");
        assert_eq!(settings.rag.index_name, "medical-chat");
        assert_eq!(settings.ollama.embed_dimension, 384);
    }
}

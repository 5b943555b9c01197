//! Ollama integration for medchat
//!
//! This crate provides the Ollama implementations of the `Generator` and
//! `Embedder` traits.

mod client;
mod config;
mod embedder;


pub use client::OllamaGenerator;
pub use config::OllamaConfig;
pub use embedder::OllamaEmbedder;

// Re-export core types for convenience
pub use medchat_core::{Embedder, Error, GenerationConfig, Generator, Result};

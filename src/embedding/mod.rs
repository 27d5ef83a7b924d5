//! Text-to-vector embedding providers.
//!
//! The core never computes embeddings itself. It consumes the
//! [`EmbeddingProvider`] capability surface; [`create_provider`] builds the
//! HTTP-backed implementation named in configuration.

pub mod ollama;
pub mod openai;

use anyhow::Result;
use std::time::Duration;

use crate::config::EmbeddingConfig;
use crate::error::Error;

/// Trait for embedding text into vectors.
///
/// All methods are synchronous and block for the network round-trip, which is
/// bounded by the provider's request timeout.
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text string into a vector.
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text])?;
        anyhow::ensure!(vectors.len() == 1, "provider returned {} vectors for 1 input", vectors.len());
        Ok(vectors.remove(0))
    }

    /// Embed a batch of texts. All-or-nothing: either one vector per input or an error.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;

    /// Identifier of the model producing the vectors.
    fn model(&self) -> &str;

    /// Number of components in every vector.
    fn dimensions(&self) -> usize;
}

/// Create an embedding provider from config.
pub fn create_provider(config: &EmbeddingConfig) -> crate::Result<Box<dyn EmbeddingProvider>> {
    match config.provider.as_str() {
        "openai" => Ok(Box::new(openai::OpenAiProvider::new(config)?)),
        "ollama" => Ok(Box::new(ollama::OllamaProvider::new(config)?)),
        other => Err(Error::Config(format!(
            "unknown embedding provider: {other}. Supported: openai, ollama"
        ))),
    }
}

/// Blocking HTTP client honoring the configured per-request deadline.
pub(crate) fn http_client(config: &EmbeddingConfig) -> crate::Result<reqwest::blocking::Client> {
    reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs.max(1)))
        .build()
        .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))
}

/// Enforce the batch contract: one vector per input, each of the expected width.
pub(crate) fn check_batch(vectors: &[Vec<f32>], expected_len: usize, dimensions: usize) -> Result<()> {
    anyhow::ensure!(
        vectors.len() == expected_len,
        "provider returned {} vectors for {expected_len} inputs",
        vectors.len()
    );
    if let Some(bad) = vectors.iter().find(|v| v.len() != dimensions) {
        anyhow::bail!(
            "provider returned a {}-dimensional vector, expected {dimensions}",
            bad.len()
        );
    }
    Ok(())
}

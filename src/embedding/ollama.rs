//! Ollama embedding provider (`POST /api/embed`).

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use super::{check_batch, http_client, EmbeddingProvider};
use crate::config::EmbeddingConfig;

pub struct OllamaProvider {
    client: Client,
    endpoint: String,
    model: String,
    dimensions: usize,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl OllamaProvider {
    pub fn new(config: &EmbeddingConfig) -> crate::Result<Self> {
        Ok(Self {
            client: http_client(config)?,
            endpoint: format!("{}/api/embed", config.resolved_base_url()),
            model: config.resolved_model(),
            dimensions: config.resolved_dimensions(),
        })
    }
}

impl EmbeddingProvider for OllamaProvider {
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let response = self
            .client
            .post(&self.endpoint)
            .json(&EmbedRequest {
                model: &self.model,
                input: texts,
            })
            .send()
            .with_context(|| format!("Ollama not reachable at {}", self.endpoint))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            anyhow::bail!("ollama embed returned HTTP {status}: {text}");
        }

        let parsed: EmbedResponse = response
            .json()
            .context("failed to decode ollama embed response")?;

        check_batch(&parsed.embeddings, texts.len(), self.dimensions)?;
        Ok(parsed.embeddings)
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

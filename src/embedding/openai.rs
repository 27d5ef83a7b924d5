//! OpenAI-compatible embedding provider (`POST /v1/embeddings`).

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use super::{check_batch, http_client, EmbeddingProvider};
use crate::config::EmbeddingConfig;
use crate::error::Error;

pub struct OpenAiProvider {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    dimensions: usize,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
    dimensions: usize,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

impl OpenAiProvider {
    pub fn new(config: &EmbeddingConfig) -> crate::Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                Error::Config("OpenAI API key required (set embedding.api_key or OPENAI_API_KEY)".into())
            })?;

        Ok(Self {
            client: http_client(config)?,
            endpoint: format!("{}/v1/embeddings", config.resolved_base_url()),
            api_key,
            model: config.resolved_model(),
            dimensions: config.resolved_dimensions(),
        })
    }
}

impl EmbeddingProvider for OpenAiProvider {
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let body = EmbeddingRequest {
            model: &self.model,
            input: texts,
            dimensions: self.dimensions,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .with_context(|| format!("embedding request to {} failed", self.endpoint))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            anyhow::bail!("openai embeddings returned HTTP {status}: {text}");
        }

        let parsed: EmbeddingResponse = response
            .json()
            .context("failed to decode openai embeddings response")?;
        let vectors = into_ordered_vectors(parsed);

        check_batch(&vectors, texts.len(), self.dimensions)?;
        tracing::debug!(model = %self.model, count = vectors.len(), "embedded batch");
        Ok(vectors)
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// The API does not promise `data` is in input order; `index` is authoritative.
fn into_ordered_vectors(mut response: EmbeddingResponse) -> Vec<Vec<f32>> {
    response.data.sort_by_key(|d| d.index);
    response.data.into_iter().map(|d| d.embedding).collect()
}

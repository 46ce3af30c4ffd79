//! HTTP embedding adapter against `/v1/embeddings`: reqwest::Client + serde
//! request/response structs, bearer-token auth, environment-variable
//! API-key fallback.

use async_trait::async_trait;
use kdd_core::{ErrorCode, EmbeddingModel, KddError, KddResult};
use serde::{Deserialize, Serialize};

use crate::cache::ResponseCache;

const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/embeddings";

pub struct OpenAiEmbeddingModel {
    client: reqwest::Client,
    api_key: String,
    model: String,
    dimensions: usize,
    endpoint: String,
    cache: ResponseCache<Vec<f32>>,
}

impl OpenAiEmbeddingModel {
    /// `text-embedding-3-small`'s native dimensionality; override via
    /// [`Self::with_dimensions`] if configured for a different model.
    pub const DEFAULT_DIMENSIONS: usize = 1536;

    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.unwrap_or_else(|| std::env::var("OPENAI_API_KEY").unwrap_or_default()),
            model: "text-embedding-3-small".to_string(),
            dimensions: Self::DEFAULT_DIMENSIONS,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            cache: ResponseCache::default(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = dimensions;
        self
    }

    #[cfg(test)]
    fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
    index: usize,
}

#[async_trait]
impl EmbeddingModel for OpenAiEmbeddingModel {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// One request per call: callers batch every chunk of a document into a
    /// single `encode`, never invoking it per-chunk.
    async fn encode(&self, texts: &[String]) -> KddResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut hashes: Vec<String> = texts.iter().map(|t| kdd_core::compute_content_hash(t)).collect();
        let mut pending: Vec<String> = Vec::new();
        let mut pending_positions: Vec<usize> = Vec::new();
        let mut results: Vec<Option<Vec<f32>>> = vec![None; texts.len()];

        for (i, hash) in hashes.iter().enumerate() {
            if let Some(cached) = self.cache.get(hash) {
                results[i] = Some(cached);
            } else {
                pending.push(texts[i].clone());
                pending_positions.push(i);
            }
        }

        if !pending.is_empty() {
            let request = EmbeddingsRequest { model: &self.model, input: &pending };
            let response = self
                .client
                .post(&self.endpoint)
                .bearer_auth(&self.api_key)
                .json(&request)
                .send()
                .await
                .map_err(|e| KddError::new(ErrorCode::TransportError, format!("openai embeddings request failed: {e}")))?;

            if !response.status().is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(KddError::new(ErrorCode::TransportError, format!("openai embeddings error: {body}")));
            }

            let parsed: EmbeddingsResponse = response
                .json()
                .await
                .map_err(|e| KddError::new(ErrorCode::TransportError, format!("invalid openai embeddings response: {e}")))?;

            for datum in parsed.data {
                let Some(&original_index) = pending_positions.get(datum.index) else { continue };
                self.cache.insert(std::mem::take(&mut hashes[original_index]), datum.embedding.clone());
                results[original_index] = Some(datum.embedding);
            }
        }

        results
            .into_iter()
            .enumerate()
            .map(|(i, v)| v.ok_or_else(|| KddError::new(ErrorCode::TransportError, format!("missing embedding for input {i}"))))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_model_targets_the_small_embedding_model_and_its_native_dimensions() {
        let model = OpenAiEmbeddingModel::new(Some("test-key".to_string()));
        assert_eq!(model.model_name(), "text-embedding-3-small");
        assert_eq!(model.dimensions(), 1536);
    }

    #[tokio::test]
    async fn empty_batch_short_circuits_without_a_request() {
        let model = OpenAiEmbeddingModel::new(Some("test-key".to_string())).with_endpoint("http://127.0.0.1:0/unreachable");
        let result = model.encode(&[]).await.unwrap();
        assert!(result.is_empty());
    }
}

//! Deterministic, offline embedding model — no network call, no API key.
//! A feature-hashed bag-of-words vector so the full L2/L3 pipeline is
//! exercisable without a live embedding endpoint.

use async_trait::async_trait;
use kdd_core::{EmbeddingModel, KddResult};

/// Hashes whitespace-delimited tokens into a fixed-width vector (the
/// "hashing trick"), then L2-normalizes it so cosine similarity behaves
/// sensibly. Two texts sharing vocabulary land close together; this is not
/// a semantic embedding, just a stand-in with the right shape and metric
/// behavior for tests, offline development, and CI.
pub struct LocalEmbeddingModel {
    dimensions: usize,
}

impl LocalEmbeddingModel {
    pub const DEFAULT_DIMENSIONS: usize = 256;

    pub fn new() -> Self {
        Self { dimensions: Self::DEFAULT_DIMENSIONS }
    }

    pub fn with_dimensions(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn encode_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0f32; self.dimensions];
        for token in text.split_whitespace() {
            let token = token.to_lowercase();
            let hash = fnv1a(token.as_bytes());
            let bucket = (hash as usize) % self.dimensions;
            let sign = if (hash >> 63) & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }
        normalize(&mut vector);
        vector
    }
}

impl Default for LocalEmbeddingModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingModel for LocalEmbeddingModel {
    fn model_name(&self) -> &str {
        "local-hashing-v1"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn encode(&self, texts: &[String]) -> KddResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.encode_one(t)).collect())
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;
    let mut hash = OFFSET;
    for &byte in bytes {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

fn normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in vector.iter_mut() {
            *v /= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn encodes_one_vector_per_text_at_configured_dimensions() {
        let model = LocalEmbeddingModel::new();
        let vectors = model.encode(&["hello world".to_string(), "another text".to_string()]).await.unwrap();
        assert_eq!(vectors.len(), 2);
        assert_eq!(vectors[0].len(), LocalEmbeddingModel::DEFAULT_DIMENSIONS);
    }

    #[tokio::test]
    async fn identical_text_encodes_identically() {
        let model = LocalEmbeddingModel::new();
        let vectors = model.encode(&["same text".to_string(), "same text".to_string()]).await.unwrap();
        assert_eq!(vectors[0], vectors[1]);
    }

    #[tokio::test]
    async fn vectors_are_unit_normalized() {
        let model = LocalEmbeddingModel::new();
        let vectors = model.encode(&["order placed event raised".to_string()]).await.unwrap();
        let norm: f32 = vectors[0].iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
    }
}

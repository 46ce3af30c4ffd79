//! In-memory brute-force [`VectorStore`], parallelized with rayon: scores
//! every loaded embedding against the query vector by cosine similarity.
//! Used by QRY-002/003; scales to the single-developer, single-index corpus
//! sizes this engine targets rather than an ANN index.

use kdd_core::{Embedding, ScoredNode, VectorStore};
use rayon::prelude::*;

pub struct BruteForceVectorStore {
    embeddings: Vec<Embedding>,
}

impl Default for BruteForceVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BruteForceVectorStore {
    pub fn new() -> Self {
        Self { embeddings: Vec::new() }
    }

    pub fn load(&mut self, embeddings: Vec<Embedding>) {
        self.embeddings = embeddings;
    }

    pub fn len(&self) -> usize {
        self.embeddings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.embeddings.is_empty()
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|y| y * y).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

impl VectorStore for BruteForceVectorStore {
    /// `node_id` on each result is the raw `Embedding::id` (a chunk id, e.g.
    /// `Entity:Order:chunk-2`) — resolving it down to the owning graph node
    /// is the caller's job (QRY-002's document-id-to-node-id lookup), since
    /// the vector store has no graph awareness.
    fn search(&self, query_vector: &[f32], limit: usize, min_score: f32) -> Vec<ScoredNode> {
        let mut scored: Vec<ScoredNode> = self
            .embeddings
            .par_iter()
            .map(|e| ScoredNode {
                node_id: e.id.clone(),
                score: cosine_similarity(query_vector, &e.vector),
                snippet: Some(e.raw_text.clone()),
                match_source: "semantic".to_string(),
            })
            .filter(|s| s.score >= min_score)
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);
        scored
    }
}

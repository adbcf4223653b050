//! Deterministic stub provider.

use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::debug;

use crate::hashing::hash_to_u64;

use super::EmbeddingProvider;
use super::error::ProviderResult;

/// Produces unit-length vectors seeded from `(model_id, text)`.
///
/// The same input always yields the same vector, across processes and
/// platforms, which makes the stub usable for fetch-mode demos without
/// credentials.
#[derive(Debug)]
pub struct StubEmbeddingProvider {
    embedding_dim: usize,
    calls: AtomicUsize,
}

impl StubEmbeddingProvider {
    pub fn new(embedding_dim: usize) -> Self {
        Self {
            embedding_dim,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn embedding_dim(&self) -> usize {
        self.embedding_dim
    }

    /// Number of `embed` calls served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The vector this provider returns for `text` under `model_id`.
    pub fn vector_for(&self, text: &str, model_id: &str) -> Vec<f32> {
        let mut key = Vec::with_capacity(model_id.len() + text.len() + 1);
        key.extend_from_slice(model_id.as_bytes());
        key.push(b'|');
        key.extend_from_slice(text.as_bytes());

        let mut state = hash_to_u64(&key);
        let mut embedding = Vec::with_capacity(self.embedding_dim);
        for _ in 0..self.embedding_dim {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
            let value = ((state >> 32) as f32 / u32::MAX as f32) * 2.0 - 1.0;
            embedding.push(value);
        }

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut embedding {
                *x /= norm;
            }
        }
        embedding
    }
}

impl EmbeddingProvider for StubEmbeddingProvider {
    fn embed(&self, texts: &[String], model_id: &str) -> ProviderResult<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        debug!(batch = texts.len(), model_id, "Generating stub embeddings");
        Ok(texts
            .iter()
            .map(|text| self.vector_for(text, model_id))
            .collect())
    }

    fn name(&self) -> &str {
        "stub"
    }
}

//! Scriptable provider for tests.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::hashing::canonicalize;

use super::EmbeddingProvider;
use super::error::{ProviderError, ProviderResult};
use super::stub::StubEmbeddingProvider;

/// Returns pinned vectors for known texts and stub vectors otherwise.
///
/// Records every requested text and can be switched into a failing state.
#[derive(Debug)]
pub struct MockEmbeddingProvider {
    fallback: StubEmbeddingProvider,
    pinned: Mutex<BTreeMap<String, Vec<f32>>>,
    failure: Mutex<Option<ProviderError>>,
    requested: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl MockEmbeddingProvider {
    pub fn new(embedding_dim: usize) -> Self {
        Self {
            fallback: StubEmbeddingProvider::new(embedding_dim),
            pinned: Mutex::new(BTreeMap::new()),
            failure: Mutex::new(None),
            requested: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Pins the vector returned for `text` (matched on its canonical form).
    pub fn with_vector(self, text: &str, vector: Vec<f32>) -> Self {
        self.pinned.lock().insert(canonicalize(text), vector);
        self
    }

    pub fn pin(&self, text: &str, vector: Vec<f32>) {
        self.pinned.lock().insert(canonicalize(text), vector);
    }

    /// Makes every subsequent call fail with `error`.
    pub fn fail_with(&self, error: ProviderError) {
        *self.failure.lock() = Some(error);
    }

    pub fn recover(&self) {
        *self.failure.lock() = None;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every text received so far, in request order.
    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().clone()
    }
}

impl EmbeddingProvider for MockEmbeddingProvider {
    fn embed(&self, texts: &[String], model_id: &str) -> ProviderResult<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requested.lock().extend(texts.iter().cloned());

        if let Some(error) = self.failure.lock().clone() {
            return Err(error);
        }

        let pinned = self.pinned.lock();
        Ok(texts
            .iter()
            .map(|text| {
                pinned
                    .get(text)
                    .cloned()
                    .unwrap_or_else(|| self.fallback.vector_for(text, model_id))
            })
            .collect())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

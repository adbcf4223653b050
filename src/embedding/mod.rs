//! Embedding providers.
//!
//! The cache talks to the outside world only through [`EmbeddingProvider`]:
//!
//! - [`HttpEmbeddingProvider`] calls an OpenAI-compatible `/embeddings` endpoint.
//! - [`StubEmbeddingProvider`] produces deterministic hash-seeded vectors.
//! - [`UnavailableProvider`] fails every call; replay mode is wired to it so an
//!   accidental provider call is an error rather than a network request.

pub mod config;
mod error;
pub mod http;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod stub;


pub use config::{ProviderConfig, ProviderKind};
pub use error::{ProviderError, ProviderResult};
pub use http::HttpEmbeddingProvider;
#[cfg(any(test, feature = "mock"))]
pub use mock::MockEmbeddingProvider;
pub use stub::StubEmbeddingProvider;

/// Batched text → vector provider.
///
/// Implementations must return exactly one vector per input text, in input
/// order, or an error for the whole batch.
pub trait EmbeddingProvider: Send + Sync {
    /// Embeds `texts` with `model_id`.
    fn embed(&self, texts: &[String], model_id: &str) -> ProviderResult<Vec<Vec<f32>>>;

    /// Short name for logs.
    fn name(&self) -> &str;
}

impl<P: EmbeddingProvider + ?Sized> EmbeddingProvider for std::sync::Arc<P> {
    fn embed(&self, texts: &[String], model_id: &str) -> ProviderResult<Vec<Vec<f32>>> {
        (**self).embed(texts, model_id)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<P: EmbeddingProvider + ?Sized> EmbeddingProvider for Box<P> {
    fn embed(&self, texts: &[String], model_id: &str) -> ProviderResult<Vec<Vec<f32>>> {
        (**self).embed(texts, model_id)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Provider that refuses every request.
#[derive(Debug, Clone, Default)]
pub struct UnavailableProvider;

impl EmbeddingProvider for UnavailableProvider {
    fn embed(&self, texts: &[String], model_id: &str) -> ProviderResult<Vec<Vec<f32>>> {
        Err(ProviderError::Unavailable {
            reason: format!(
                "no provider configured ({} texts requested for model '{}')",
                texts.len(),
                model_id
            ),
        })
    }

    fn name(&self) -> &str {
        "unavailable"
    }
}

/// Builds the provider described by `config`.
pub fn build_provider(
    config: &ProviderConfig,
    embedding_dim: usize,
) -> ProviderResult<Box<dyn EmbeddingProvider>> {
    match config.kind {
        ProviderKind::Http => Ok(Box::new(HttpEmbeddingProvider::new(config)?)),
        ProviderKind::Stub => Ok(Box::new(StubEmbeddingProvider::new(embedding_dim))),
    }
}

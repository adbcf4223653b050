use thiserror::Error;

use crate::embedding::ProviderError;
use crate::storage::{LedgerError, StoreError};

#[derive(Debug, Error)]
/// Errors returned by the embedding cache.
pub enum CacheError {
    /// Replay-mode lookup found nothing. Fatal for the request: replay never
    /// falls back to the provider.
    #[error("cache miss in replay mode: content_hash={content_hash}, model_id={model_id}")]
    CacheMiss {
        content_hash: String,
        model_id: String,
    },

    /// Fetch-mode provider call failed; nothing was cached.
    #[error("embedding provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("cache storage error: {0}")]
    Storage(#[from] StoreError),

    /// A vector read from disk or supplied by a caller has the wrong shape.
    #[error("invalid cached vector: {reason}")]
    InvalidVector { reason: String },

    #[error("cache ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// A write was requested in replay mode, which is read-only.
    #[error("write refused in replay mode: content_hash={content_hash}, model_id={model_id}")]
    ReadOnly {
        content_hash: String,
        model_id: String,
    },
}

impl CacheError {
    pub fn is_cache_miss(&self) -> bool {
        matches!(self, CacheError::CacheMiss { .. })
    }
}

/// Convenience result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

use thiserror::Error;

use crate::cache::CacheError;

#[derive(Debug, Error)]
pub enum RetrievalError {
    /// `k` or `alpha` out of range. Raised before any scoring work.
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("unknown document: {doc_id}")]
    UnknownDocument { doc_id: String },

    #[error("embedding cache error: {0}")]
    Cache(#[from] CacheError),
}

impl RetrievalError {
    pub fn is_cache_miss(&self) -> bool {
        matches!(self, Self::Cache(e) if e.is_cache_miss())
    }
}

use thiserror::Error;

use crate::retrieval::RetrievalError;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("retrieval failed: {0}")]
    Retrieval(#[from] RetrievalError),

    #[error("scorer failed on theme '{theme}': {reason}")]
    Scorer { theme: String, reason: String },

    #[error("no themes given for document {doc_id}")]
    NoThemes { doc_id: String },
}

impl PipelineError {
    pub fn is_cache_miss(&self) -> bool {
        matches!(self, Self::Retrieval(e) if e.is_cache_miss())
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;

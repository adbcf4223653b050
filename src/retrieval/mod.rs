//! Hybrid retrieval.
//!
//! BM25 over a document's chunks plus cosine similarity of cached embeddings,
//! each min-max normalized over the candidate set and fused with weight
//! `alpha` on the lexical side.

pub mod bm25;
mod error;
pub mod fusion;
pub mod hybrid;
pub mod types;

#[cfg(test)]
mod tests;

pub use bm25::LexicalIndex;
pub use error::RetrievalError;
pub use fusion::{cosine_similarity, fuse, min_max_normalize};
pub use hybrid::{HybridRetriever, compare_scored, validate_params};
pub use types::{RetrievalResult, ScoredChunk};

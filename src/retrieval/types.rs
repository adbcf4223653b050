use serde::{Deserialize, Serialize};

/// One ranked passage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk_id: String,
    /// Raw BM25 score.
    pub lexical_score: f64,
    /// Raw cosine similarity to the query.
    pub semantic_score: f64,
    /// Weighted sum of the min-max normalized scores, in `[0, 1]`.
    pub fused_score: f64,
    pub page_num: Option<u32>,
    pub content_hash: String,
    pub text: String,
}

/// Top-K passages for one query against one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub doc_id: String,
    pub query: String,
    pub k: usize,
    pub alpha: f64,
    /// Sorted by `fused_score` descending, ties by ascending `chunk_id`.
    pub results: Vec<ScoredChunk>,
}

impl RetrievalResult {
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn chunk_ids(&self) -> impl Iterator<Item = &str> {
        self.results.iter().map(|r| r.chunk_id.as_str())
    }

    pub fn get(&self, chunk_id: &str) -> Option<&ScoredChunk> {
        self.results.iter().find(|r| r.chunk_id == chunk_id)
    }
}

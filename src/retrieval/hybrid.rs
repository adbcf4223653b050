//! Hybrid lexical + semantic ranking over one document's chunks.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::cache::{CacheMode, EmbeddingCache};
use crate::chunk::{Chunk, dedup_chunks};
use crate::config::Config;
use crate::embedding::EmbeddingProvider;

use super::bm25::LexicalIndex;
use super::error::RetrievalError;
use super::fusion::{cosine_similarity, fuse, min_max_normalize};
use super::types::{RetrievalResult, ScoredChunk};

#[derive(Debug)]
struct DocumentIndex {
    chunks: Vec<Chunk>,
    lexical: LexicalIndex,
}

/// Ranks a registered document's chunks against free-text queries.
///
/// Embeddings for both the query and the chunks go through the shared
/// [`EmbeddingCache`] in the retriever's mode, so a replay-mode retriever never
/// reaches the provider.
pub struct HybridRetriever<P> {
    cache: Arc<EmbeddingCache<P>>,
    model_id: String,
    mode: CacheMode,
    documents: BTreeMap<String, DocumentIndex>,
}

impl<P> std::fmt::Debug for HybridRetriever<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HybridRetriever")
            .field("model_id", &self.model_id)
            .field("mode", &self.mode)
            .field("documents", &self.documents.len())
            .finish()
    }
}

/// Checks `k >= 1` and `alpha` in `[0, 1]` (NaN rejected).
pub fn validate_params(k: usize, alpha: f64) -> Result<(), RetrievalError> {
    if k == 0 {
        return Err(RetrievalError::InvalidParameter {
            name: "k",
            reason: "must be >= 1".to_string(),
        });
    }
    if !(0.0..=1.0).contains(&alpha) {
        return Err(RetrievalError::InvalidParameter {
            name: "alpha",
            reason: format!("must be within [0, 1], got {alpha}"),
        });
    }
    Ok(())
}

/// Keeps the first chunk for each `chunk_id`; ranking ties break on the id.
fn dedup_chunk_ids(doc_id: &str, chunks: Vec<Chunk>) -> Vec<Chunk> {
    let mut seen = BTreeSet::new();
    chunks
        .into_iter()
        .filter(|c| {
            let fresh = seen.insert(c.chunk_id.clone());
            if !fresh {
                warn!(doc_id = %doc_id, chunk_id = %c.chunk_id, "Dropped chunk with repeated chunk_id");
            }
            fresh
        })
        .collect()
}

/// Orders by fused score descending, then `chunk_id` ascending.
pub fn compare_scored(a: &ScoredChunk, b: &ScoredChunk) -> Ordering {
    b.fused_score
        .total_cmp(&a.fused_score)
        .then_with(|| a.chunk_id.cmp(&b.chunk_id))
}

impl<P: EmbeddingProvider> HybridRetriever<P> {
    pub fn new(cache: Arc<EmbeddingCache<P>>, model_id: impl Into<String>, mode: CacheMode) -> Self {
        Self {
            cache,
            model_id: model_id.into(),
            mode,
            documents: BTreeMap::new(),
        }
    }

    pub fn from_config(config: &Config, cache: Arc<EmbeddingCache<P>>) -> Self {
        Self::new(cache, config.model_id.clone(), config.mode)
    }

    /// Registers (or replaces) the chunk set of the document each chunk names.
    ///
    /// Chunks are grouped by `doc_id` and deduplicated by content hash. A
    /// repeated `chunk_id` with different text is dropped with a warning,
    /// keeping the first. The lexical index for each document is rebuilt.
    /// Returns the number of chunks kept.
    pub fn add_document(&mut self, chunks: Vec<Chunk>) -> usize {
        let mut grouped: BTreeMap<String, Vec<Chunk>> = BTreeMap::new();
        for chunk in chunks {
            grouped.entry(chunk.doc_id.clone()).or_default().push(chunk);
        }

        let mut kept = 0;
        for (doc_id, chunks) in grouped {
            let chunks = dedup_chunk_ids(&doc_id, dedup_chunks(chunks));
            let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
            let lexical = LexicalIndex::build(&texts);
            kept += chunks.len();
            info!(doc_id = %doc_id, chunks = chunks.len(), "Indexed document");
            self.documents.insert(doc_id, DocumentIndex { chunks, lexical });
        }
        kept
    }

    pub fn has_document(&self, doc_id: &str) -> bool {
        self.documents.contains_key(doc_id)
    }

    pub fn chunks(&self, doc_id: &str) -> Option<&[Chunk]> {
        self.documents.get(doc_id).map(|d| d.chunks.as_slice())
    }

    pub fn cache(&self) -> &EmbeddingCache<P> {
        &self.cache
    }

    pub fn mode(&self) -> CacheMode {
        self.mode
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    /// Ranks `doc_id`'s chunks against `query` and returns the top `k`.
    pub fn rank(
        &self,
        doc_id: &str,
        query: &str,
        k: usize,
        alpha: f64,
    ) -> Result<RetrievalResult, RetrievalError> {
        validate_params(k, alpha)?;

        let doc = self
            .documents
            .get(doc_id)
            .ok_or_else(|| RetrievalError::UnknownDocument {
                doc_id: doc_id.to_string(),
            })?;

        if doc.chunks.is_empty() {
            return Ok(RetrievalResult {
                doc_id: doc_id.to_string(),
                query: query.to_string(),
                k,
                alpha,
                results: Vec::new(),
            });
        }

        let lexical = doc.lexical.scores(query);

        let mut texts: Vec<&str> = Vec::with_capacity(doc.chunks.len() + 1);
        texts.push(query);
        texts.extend(doc.chunks.iter().map(|c| c.text.as_str()));
        let vectors = self
            .cache
            .get_or_compute_batch(&texts, &self.model_id, self.mode)?;
        let (query_vec, chunk_vecs) = vectors.split_at(1);
        let semantic: Vec<f64> = chunk_vecs
            .iter()
            .map(|v| cosine_similarity(&query_vec[0], v))
            .collect();

        let fused = fuse(
            &min_max_normalize(&lexical),
            &min_max_normalize(&semantic),
            alpha,
        );

        let mut results: Vec<ScoredChunk> = doc
            .chunks
            .iter()
            .enumerate()
            .map(|(i, chunk)| ScoredChunk {
                chunk_id: chunk.chunk_id.clone(),
                lexical_score: lexical[i],
                semantic_score: semantic[i],
                fused_score: fused[i],
                page_num: chunk.page_num,
                content_hash: chunk.content_hash.clone(),
                text: chunk.text.clone(),
            })
            .collect();
        results.sort_by(compare_scored);
        results.truncate(k);

        debug!(
            doc_id,
            candidates = doc.chunks.len(),
            returned = results.len(),
            k,
            alpha,
            "Ranked document"
        );

        Ok(RetrievalResult {
            doc_id: doc_id.to_string(),
            query: query.to_string(),
            k,
            alpha,
            results,
        })
    }
}

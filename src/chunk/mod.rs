//! Retrievable passages.
//!
//! Extraction output arrives as [`RawChunkRecord`]s whose text and page live
//! under whichever field name the extractor chose. [`Chunk::from_raw`] folds
//! them into the one canonical [`Chunk`]; nothing downstream looks at raw
//! field names.

mod error;


pub use error::{ChunkError, ChunkResult};

use std::collections::BTreeSet;
use std::io::BufRead;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::hashing::{canonicalize, hash_canonical};

/// Immutable unit of retrievable text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub doc_id: String,
    /// Unique within `doc_id`.
    pub chunk_id: String,
    /// Canonical (trimmed, lower-cased) text.
    pub text: String,
    /// 1-indexed source page, when the extractor knew it.
    pub page_num: Option<u32>,
    /// SHA-256 hex of `text`.
    pub content_hash: String,
}

impl Chunk {
    pub fn new(
        doc_id: impl Into<String>,
        chunk_id: impl Into<String>,
        text: &str,
        page_num: Option<u32>,
    ) -> Self {
        let text = canonicalize(text);
        let content_hash = hash_canonical(&text);
        Self {
            doc_id: doc_id.into(),
            chunk_id: chunk_id.into(),
            text,
            page_num,
            content_hash,
        }
    }

    /// Normalizes an extraction record, falling back to `doc_id` when the
    /// record does not name its document.
    pub fn from_raw(doc_id: &str, raw: RawChunkRecord) -> ChunkResult<Self> {
        let chunk_id = raw.chunk_id.trim().to_string();
        if chunk_id.is_empty() {
            return Err(ChunkError::MissingChunkId);
        }
        let text = raw
            .text
            .or(raw.content)
            .or(raw.snippet)
            .or(raw.raw_text)
            .ok_or_else(|| ChunkError::MissingText {
                chunk_id: chunk_id.clone(),
            })?;
        let page_num = raw.page_num.or(raw.page).or(raw.page_number);
        if page_num == Some(0) {
            return Err(ChunkError::InvalidPage { chunk_id });
        }
        let doc_id = raw
            .doc_id
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| doc_id.to_string());

        Ok(Self::new(doc_id, chunk_id, &text, page_num))
    }
}

/// Extraction record as produced upstream.
///
/// Exactly one text field is expected; if several are present the first of
/// `text`, `content`, `snippet`, `raw_text` wins. Pages resolve the same way
/// across `page_num`, `page`, `page_number`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawChunkRecord {
    #[serde(default)]
    pub doc_id: Option<String>,
    pub chunk_id: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub snippet: Option<String>,
    #[serde(default)]
    pub raw_text: Option<String>,
    #[serde(default)]
    pub page_num: Option<u32>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub page_number: Option<u32>,
}

/// Drops chunks whose `content_hash` was already seen, keeping the first.
pub fn dedup_chunks(chunks: Vec<Chunk>) -> Vec<Chunk> {
    let before = chunks.len();
    let mut seen = BTreeSet::new();
    let kept: Vec<Chunk> = chunks
        .into_iter()
        .filter(|c| seen.insert(c.content_hash.clone()))
        .collect();

    if kept.len() != before {
        debug!(
            before,
            after = kept.len(),
            "dropped duplicate chunks by content hash"
        );
    }
    kept
}

/// Reads JSON-lines extraction output for one document. Blank lines are skipped.
pub fn read_jsonl<R: BufRead>(doc_id: &str, reader: R) -> ChunkResult<Vec<Chunk>> {
    let mut chunks = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let raw: RawChunkRecord = serde_json::from_str(&line)
            .map_err(|source| ChunkError::Parse {
                line: idx + 1,
                source,
            })?;
        chunks.push(Chunk::from_raw(doc_id, raw)?);
    }
    Ok(chunks)
}

/// True when every chunk reports the same non-null page (or none at all).
pub fn pages_are_uniform(chunks: &[Chunk]) -> bool {
    let pages: BTreeSet<Option<u32>> = chunks.iter().map(|c| c.page_num).collect();
    chunks.len() > 1 && pages.len() <= 1
}

use thiserror::Error;

/// Errors raised while normalizing extraction records into [`Chunk`](super::Chunk)s.
#[derive(Debug, Error)]
pub enum ChunkError {
    #[error("chunk record '{chunk_id}' has no text field")]
    MissingText { chunk_id: String },

    #[error("chunk record has an empty chunk_id")]
    MissingChunkId,

    #[error("chunk record '{chunk_id}' has page 0 (pages are 1-indexed)")]
    InvalidPage { chunk_id: String },

    #[error("failed to parse chunk record at line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to read chunk records: {0}")]
    Io(#[from] std::io::Error),
}

pub type ChunkResult<T> = Result<T, ChunkError>;

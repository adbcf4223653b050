//! Storage model types.

use rkyv::{Archive, Deserialize, Serialize};

use crate::cache::CacheMode;

/// Cached embedding persisted to disk.
///
/// Stored as `rkyv` bytes, one file per `(content_hash, model_id)`.
///
/// # Example
/// ```rust
/// use verdant::storage::CacheEntry;
/// use verdant::cache::CacheMode;
///
/// let entry = CacheEntry {
///     content_hash: "ab".repeat(32),
///     model_id: "m".to_string(),
///     vector: vec![0.0, 1.0],
///     fetched_at: "2025-01-01T00:00:00Z".to_string(),
///     mode: CacheMode::Fetch,
/// };
/// assert_eq!(entry.dim(), 2);
/// ```
#[derive(Archive, Deserialize, Serialize, Debug, PartialEq, Clone)]
pub struct CacheEntry {
    /// SHA-256 (hex) of the canonical text.
    pub content_hash: String,
    /// Embedding model identifier.
    pub model_id: String,
    /// The embedding.
    pub vector: Vec<f32>,
    /// RFC 3339 write time, read from the logical clock.
    pub fetched_at: String,
    /// Mode the entry was produced in.
    pub mode: CacheMode,
}

impl CacheEntry {
    pub fn dim(&self) -> usize {
        self.vector.len()
    }
}

/// One line of the append-only write ledger.
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LedgerRecord {
    pub content_hash: String,
    pub model_id: String,
    pub mode: CacheMode,
    pub timestamp: String,
}

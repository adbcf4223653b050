use std::path::PathBuf;

use crate::config::Config;
use crate::constants::DEFAULT_EMBEDDING_DIM;

pub const DEFAULT_HOT_CAPACITY: u64 = 10_000;

#[derive(Debug, Clone)]
/// Settings for [`EmbeddingCache`](super::EmbeddingCache).
pub struct CacheConfig {
    /// Root of the on-disk store.
    pub cache_dir: PathBuf,
    /// Ledger file (JSON lines).
    pub ledger_path: PathBuf,
    /// Expected vector dimension; provider output is checked against it.
    pub embedding_dim: usize,
    /// Max entries in the in-memory layer.
    pub hot_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("./.verdant/cache"),
            ledger_path: PathBuf::from("./.verdant/ledger.jsonl"),
            embedding_dim: DEFAULT_EMBEDDING_DIM,
            hot_capacity: DEFAULT_HOT_CAPACITY,
        }
    }
}

impl CacheConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            cache_dir: config.cache_dir.clone(),
            ledger_path: config.ledger_path.clone(),
            embedding_dim: config.embedding_dim,
            hot_capacity: config.hot_capacity,
        }
    }

    /// Config rooted at `dir` (store in `dir/cache`, ledger in `dir/ledger.jsonl`).
    pub fn in_dir(dir: impl Into<PathBuf>, embedding_dim: usize) -> Self {
        let dir = dir.into();
        Self {
            cache_dir: dir.join("cache"),
            ledger_path: dir.join("ledger.jsonl"),
            embedding_dim,
            ..Default::default()
        }
    }
}

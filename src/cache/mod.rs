//! Content-addressed embedding cache with fetch / replay modes.

pub mod config;
pub mod embedding_cache;
pub mod error;
pub mod types;


pub use config::{CacheConfig, DEFAULT_HOT_CAPACITY};
pub use embedding_cache::EmbeddingCache;
pub use error::{CacheError, CacheResult};
pub use types::{CacheKey, CacheMode, CacheStatsSnapshot, LookupSource};

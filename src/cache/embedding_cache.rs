//! Content-addressed embedding cache.
//!
//! Lookup order is memory → disk → provider. The provider is only reachable in
//! [`CacheMode::Fetch`]; in [`CacheMode::Replay`] an unseen input fails with
//! [`CacheError::CacheMiss`] before anything is written or requested.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use moka::sync::Cache;
use tracing::{debug, info, warn};

use crate::clock::LogicalClock;
use crate::config::Config;
use crate::constants::validate_embedding_dim;
use crate::embedding::{EmbeddingProvider, ProviderError};
use crate::hashing::{canonicalize, hash_canonical};
use crate::storage::{CacheEntry, EmbeddingStore, Ledger, LedgerRecord};

use super::config::CacheConfig;
use super::error::{CacheError, CacheResult};
use super::types::{CacheKey, CacheMode, CacheStats, CacheStatsSnapshot, LookupSource};

/// Embedding cache keyed by `(content_hash, model_id)`.
pub struct EmbeddingCache<P> {
    provider: P,
    store: EmbeddingStore,
    ledger: Ledger,
    hot: Cache<CacheKey, Arc<Vec<f32>>>,
    clock: LogicalClock,
    config: CacheConfig,
    stats: CacheStats,
}

impl<P> std::fmt::Debug for EmbeddingCache<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingCache")
            .field("cache_dir", &self.config.cache_dir)
            .field("ledger", &self.ledger.path())
            .field("embedding_dim", &self.config.embedding_dim)
            .field("hot_entries", &self.hot.entry_count())
            .finish()
    }
}

impl<P: EmbeddingProvider> EmbeddingCache<P> {
    pub fn new(provider: P, config: CacheConfig, clock: LogicalClock) -> Self {
        Self {
            provider,
            store: EmbeddingStore::new(config.cache_dir.clone()),
            ledger: Ledger::new(config.ledger_path.clone()),
            hot: Cache::builder().max_capacity(config.hot_capacity).build(),
            clock,
            config,
            stats: CacheStats::default(),
        }
    }

    /// Builds a cache from the crate-level [`Config`].
    pub fn from_config(config: &Config, provider: P) -> Self {
        Self::new(provider, CacheConfig::from_config(config), config.clock())
    }

    /// Returns the vector for `text`, computing it in fetch mode if needed.
    pub fn get_or_compute(&self, text: &str, model_id: &str, mode: CacheMode) -> CacheResult<Vec<f32>> {
        let mut vectors = self.get_or_compute_batch(&[text], model_id, mode)?;
        vectors.pop().ok_or_else(|| {
            CacheError::Provider(ProviderError::InvalidResponse {
                reason: "empty batch result".to_string(),
            })
        })
    }

    /// Resolves a batch in input order.
    ///
    /// Hits are served first; all distinct misses go to the provider in one
    /// request. The batch either fully succeeds or changes nothing.
    pub fn get_or_compute_batch<S: AsRef<str>>(
        &self,
        texts: &[S],
        model_id: &str,
        mode: CacheMode,
    ) -> CacheResult<Vec<Vec<f32>>> {
        let canonical: Vec<String> = texts.iter().map(|t| canonicalize(t.as_ref())).collect();
        let hashes: Vec<String> = canonical.iter().map(|c| hash_canonical(c)).collect();

        let mut resolved: Vec<Option<Arc<Vec<f32>>>> = Vec::with_capacity(texts.len());
        let mut pending: Vec<usize> = Vec::new();
        let mut seen = BTreeSet::new();

        for (idx, hash) in hashes.iter().enumerate() {
            match self.lookup_hash(hash, model_id)? {
                Some((vector, source)) => {
                    self.stats.record_hit(source);
                    resolved.push(Some(vector));
                }
                None => {
                    resolved.push(None);
                    if seen.insert(hash.as_str()) {
                        self.stats.record_miss();
                        pending.push(idx);
                    }
                }
            }
        }

        if pending.is_empty() {
            return Ok(resolved.into_iter().flatten().map(unwrap_arc).collect());
        }

        if !mode.allows_provider_calls() {
            let content_hash = hashes[pending[0]].clone();
            debug!(
                %content_hash,
                model_id,
                missing = pending.len(),
                "Replay lookup missed; failing closed"
            );
            return Err(CacheError::CacheMiss {
                content_hash,
                model_id: model_id.to_string(),
            });
        }

        let miss_texts: Vec<String> = pending.iter().map(|&i| canonical[i].clone()).collect();
        let miss_hashes: Vec<&str> = pending.iter().map(|&i| hashes[i].as_str()).collect();
        let fetched = self.fetch_and_store(&miss_texts, &miss_hashes, model_id)?;

        let by_hash: BTreeMap<&str, Arc<Vec<f32>>> = miss_hashes.into_iter().zip(fetched).collect();

        let mut out = Vec::with_capacity(resolved.len());
        for (idx, slot) in resolved.into_iter().enumerate() {
            let vector = match slot {
                Some(v) => v,
                None => by_hash
                    .get(hashes[idx].as_str())
                    .cloned()
                    .ok_or_else(|| CacheError::CacheMiss {
                        content_hash: hashes[idx].clone(),
                        model_id: model_id.to_string(),
                    })?,
            };
            out.push(unwrap_arc(vector));
        }
        Ok(out)
    }

    /// Read-only lookup. Never calls the provider and never writes.
    pub fn lookup(&self, text: &str, model_id: &str) -> CacheResult<Option<Vec<f32>>> {
        let hash = hash_canonical(&canonicalize(text));
        Ok(self.lookup_hash(&hash, model_id)?.map(|(v, _)| unwrap_arc(v)))
    }

    /// `true` if `text` is cached for `model_id`.
    pub fn contains(&self, text: &str, model_id: &str) -> bool {
        let hash = hash_canonical(&canonicalize(text));
        let key = CacheKey::new(hash.clone(), model_id);
        self.hot.contains_key(&key) || self.store.exists(&hash, model_id)
    }

    /// Writes a known vector for `text` (fetch-mode write, recorded in the ledger).
    ///
    /// Replay mode is read-only and refuses the write before touching disk.
    /// Writing the same `(text, model_id, vector)` twice leaves the store as
    /// writing it once.
    pub fn put(
        &self,
        text: &str,
        model_id: &str,
        vector: Vec<f32>,
        mode: CacheMode,
    ) -> CacheResult<CacheEntry> {
        let hash = hash_canonical(&canonicalize(text));
        if !mode.allows_provider_calls() {
            return Err(CacheError::ReadOnly {
                content_hash: hash,
                model_id: model_id.to_string(),
            });
        }
        self.check_vector(&vector)?;
        self.write_entry(&hash, model_id, Arc::new(vector))
    }

    fn lookup_hash(
        &self,
        content_hash: &str,
        model_id: &str,
    ) -> CacheResult<Option<(Arc<Vec<f32>>, LookupSource)>> {
        let key = CacheKey::new(content_hash, model_id);
        if let Some(vector) = self.hot.get(&key) {
            return Ok(Some((vector, LookupSource::Memory)));
        }

        let Some(entry) = self.store.load(content_hash, model_id)? else {
            return Ok(None);
        };

        self.check_vector(&entry.vector)?;
        let vector = Arc::new(entry.vector);
        self.hot.insert(key, Arc::clone(&vector));
        Ok(Some((vector, LookupSource::Disk)))
    }

    fn fetch_and_store(
        &self,
        texts: &[String],
        hashes: &[&str],
        model_id: &str,
    ) -> CacheResult<Vec<Arc<Vec<f32>>>> {
        self.stats.record_provider_call();
        debug!(
            provider = self.provider.name(),
            model_id,
            batch = texts.len(),
            "Fetching embeddings for cache misses"
        );

        let vectors = self.provider.embed(texts, model_id).map_err(|e| {
            warn!(provider = self.provider.name(), error = %e, "Embedding provider failed");
            CacheError::Provider(e)
        })?;

        if vectors.len() != texts.len() {
            return Err(CacheError::Provider(ProviderError::InvalidResponse {
                reason: format!(
                    "requested {} embeddings, received {}",
                    texts.len(),
                    vectors.len()
                ),
            }));
        }

        // Validate the whole batch before the first write.
        for vector in &vectors {
            validate_embedding_dim(vector.len(), self.config.embedding_dim).map_err(|_| {
                ProviderError::DimensionMismatch {
                    expected: self.config.embedding_dim,
                    actual: vector.len(),
                }
            })?;
            if vector.iter().any(|v| !v.is_finite()) {
                return Err(CacheError::Provider(ProviderError::InvalidResponse {
                    reason: "embedding contains non-finite values".to_string(),
                }));
            }
        }

        let mut out = Vec::with_capacity(vectors.len());
        for (hash, vector) in hashes.iter().zip(vectors) {
            let vector = Arc::new(vector);
            self.write_entry(hash, model_id, Arc::clone(&vector))?;
            out.push(vector);
        }

        info!(
            model_id,
            written = out.len(),
            "Cached fetched embeddings"
        );
        Ok(out)
    }

    fn write_entry(
        &self,
        content_hash: &str,
        model_id: &str,
        vector: Arc<Vec<f32>>,
    ) -> CacheResult<CacheEntry> {
        let timestamp = self.clock.now_rfc3339();
        let entry = CacheEntry {
            content_hash: content_hash.to_string(),
            model_id: model_id.to_string(),
            vector: vector.as_ref().clone(),
            fetched_at: timestamp.clone(),
            mode: CacheMode::Fetch,
        };

        // Ledger first: an entry must never be servable without its record.
        self.ledger.append(&LedgerRecord {
            content_hash: entry.content_hash.clone(),
            model_id: entry.model_id.clone(),
            mode: CacheMode::Fetch,
            timestamp,
        })?;
        self.store.store(&entry)?;
        self.hot
            .insert(CacheKey::new(content_hash, model_id), vector);
        self.stats.record_write();

        Ok(entry)
    }

    fn check_vector(&self, vector: &[f32]) -> CacheResult<()> {
        validate_embedding_dim(vector.len(), self.config.embedding_dim).map_err(|_| {
            CacheError::InvalidVector {
                reason: format!(
                    "expected dimension {}, got {}",
                    self.config.embedding_dim,
                    vector.len()
                ),
            }
        })?;
        if vector.iter().any(|v| !v.is_finite()) {
            return Err(CacheError::InvalidVector {
                reason: "vector contains non-finite values".to_string(),
            });
        }
        Ok(())
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn store(&self) -> &EmbeddingStore {
        &self.store
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn clock(&self) -> LogicalClock {
        self.clock
    }

    pub fn embedding_dim(&self) -> usize {
        self.config.embedding_dim
    }

    pub fn stats(&self) -> CacheStatsSnapshot {
        self.stats.snapshot()
    }

    /// Drops the in-memory layer; the disk store is untouched.
    pub fn clear_memory(&self) {
        self.hot.invalidate_all();
        self.hot.run_pending_tasks();
    }
}

#[inline]
fn unwrap_arc(vector: Arc<Vec<f32>>) -> Vec<f32> {
    Arc::try_unwrap(vector).unwrap_or_else(|shared| shared.as_ref().clone())
}

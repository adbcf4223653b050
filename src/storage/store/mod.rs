//! File-per-entry embedding store.
//!
//! Layout: `<root>/<model_slug>/<content_hash>.rkyv`. Writes go to a uniquely
//! named temp file that is fsynced and renamed over the final path, so two
//! writers racing on the same key leave one complete entry (last writer wins).


use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use rkyv::rancor::Error as RkyvError;
use rkyv::util::AlignedVec;
use rkyv::{from_bytes, to_bytes};
use tracing::debug;

use crate::hashing::model_slug;

use super::error::{StoreError, StoreResult};
use super::model::CacheEntry;

const RKYV_EXTENSION: &str = "rkyv";

const TEMP_EXTENSION: &str = "tmp";

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone)]
/// Stores and retrieves [`CacheEntry`] records on disk.
pub struct EmbeddingStore {
    storage_path: PathBuf,
}

impl EmbeddingStore {
    /// Creates a store rooted at `storage_path`. Nothing is created until the
    /// first write.
    pub fn new(storage_path: PathBuf) -> Self {
        Self { storage_path }
    }

    /// Returns the root storage directory.
    pub fn storage_path(&self) -> &Path {
        &self.storage_path
    }

    fn model_path(&self, model_id: &str) -> PathBuf {
        self.storage_path.join(model_slug(model_id))
    }

    fn entry_path(&self, content_hash: &str, model_id: &str) -> PathBuf {
        self.model_path(model_id)
            .join(format!("{}.{}", content_hash, RKYV_EXTENSION))
    }

    fn temp_entry_path(&self, content_hash: &str, model_id: &str) -> PathBuf {
        let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        self.model_path(model_id).join(format!(
            "{}.{}.{}.{}",
            content_hash,
            std::process::id(),
            n,
            TEMP_EXTENSION
        ))
    }

    fn ensure_model_dir(&self, model_id: &str) -> StoreResult<()> {
        let model_path = self.model_path(model_id);
        if !model_path.exists() {
            fs::create_dir_all(&model_path).map_err(|_| StoreError::StorageUnavailable {
                path: model_path.clone(),
            })?;
        }
        Ok(())
    }

    /// Writes `entry` under its `(content_hash, model_id)` key.
    ///
    /// Rewriting an existing key with the same entry leaves the store unchanged.
    pub fn store(&self, entry: &CacheEntry) -> StoreResult<()> {
        validate_hash(&entry.content_hash)?;
        self.ensure_model_dir(&entry.model_id)?;

        let bytes = to_bytes::<RkyvError>(entry)
            .map_err(|e| StoreError::Serialization(format!("{:?}", e)))?;

        let temp_path = self.temp_entry_path(&entry.content_hash, &entry.model_id);
        let final_path = self.entry_path(&entry.content_hash, &entry.model_id);

        {
            let mut file = File::create(&temp_path)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
        }

        fs::rename(&temp_path, &final_path)?;

        debug!(
            content_hash = %entry.content_hash,
            model_id = %entry.model_id,
            bytes = bytes.len(),
            "Stored cache entry"
        );
        Ok(())
    }

    /// Loads the entry for `(content_hash, model_id)`; `Ok(None)` when absent.
    pub fn load(&self, content_hash: &str, model_id: &str) -> StoreResult<Option<CacheEntry>> {
        validate_hash(content_hash)?;
        let path = self.entry_path(content_hash, model_id);

        if !path.exists() {
            return Ok(None);
        }

        let raw = fs::read(&path)?;
        let mut aligned = AlignedVec::<16>::with_capacity(raw.len());
        aligned.extend_from_slice(&raw);

        let entry = from_bytes::<CacheEntry, RkyvError>(&aligned).map_err(|e| {
            StoreError::Corrupt {
                path: path.clone(),
                reason: format!("{:?}", e),
            }
        })?;

        if entry.content_hash != content_hash || entry.model_id != model_id {
            return Err(StoreError::Corrupt {
                path,
                reason: format!(
                    "key mismatch: stored ({}, {})",
                    entry.content_hash, entry.model_id
                ),
            });
        }

        Ok(Some(entry))
    }

    /// Returns `true` if `(content_hash, model_id)` exists.
    pub fn exists(&self, content_hash: &str, model_id: &str) -> bool {
        validate_hash(content_hash).is_ok() && self.entry_path(content_hash, model_id).exists()
    }

    /// Lists content hashes stored for `model_id`, sorted.
    pub fn list_entries(&self, model_id: &str) -> StoreResult<Vec<String>> {
        let model_path = self.model_path(model_id);

        if !model_path.exists() {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();

        for entry in fs::read_dir(&model_path)? {
            let entry = entry?;
            let path = entry.path();

            if let Some(ext) = path.extension()
                && ext == RKYV_EXTENSION
                && let Some(stem) = path.file_stem()
                && let Some(stem_str) = stem.to_str()
            {
                entries.push(stem_str.to_string());
            }
        }

        entries.sort();
        Ok(entries)
    }

    /// Returns basic stats for `model_id` by scanning its directory.
    pub fn stats(&self, model_id: &str) -> StoreResult<StoreStats> {
        let entries = self.list_entries(model_id)?;
        let mut total_bytes = 0;

        for content_hash in &entries {
            let path = self.entry_path(content_hash, model_id);
            total_bytes += fs::metadata(&path)?.len();
        }

        Ok(StoreStats {
            entry_count: entries.len(),
            total_bytes,
        })
    }
}

/// Content hashes become file names; only lowercase hex is accepted.
fn validate_hash(content_hash: &str) -> StoreResult<()> {
    if content_hash.is_empty()
        || !content_hash
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
    {
        return Err(StoreError::Serialization(format!(
            "invalid content hash '{}'",
            content_hash
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Aggregate stats for one model's entries.
pub struct StoreStats {
    /// Total number of entry files.
    pub entry_count: usize,
    /// Total bytes across all entry files.
    pub total_bytes: u64,
}

use std::sync::atomic::{AtomicU64, Ordering};

/// Cache operating mode.
///
/// `Fetch` may call the embedding provider and populate the store; `Replay`
/// reads only, and a miss is a hard error.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    serde::Serialize,
    serde::Deserialize,
    rkyv::Archive,
    rkyv::Serialize,
    rkyv::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum CacheMode {
    Fetch,
    Replay,
}

impl CacheMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "fetch" => Some(Self::Fetch),
            "replay" => Some(Self::Replay),
            _ => None,
        }
    }

    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheMode::Fetch => "fetch",
            CacheMode::Replay => "replay",
        }
    }

    #[inline]
    pub fn allows_provider_calls(&self) -> bool {
        matches!(self, CacheMode::Fetch)
    }
}

impl std::fmt::Display for CacheMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `(content_hash, model_id)` cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    pub content_hash: String,
    pub model_id: String,
}

impl CacheKey {
    pub fn new(content_hash: impl Into<String>, model_id: impl Into<String>) -> Self {
        Self {
            content_hash: content_hash.into(),
            model_id: model_id.into(),
        }
    }
}

/// Where a lookup was answered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupSource {
    Memory,
    Disk,
    Provider,
}

/// Running counters for one cache instance.
#[derive(Debug, Default)]
pub struct CacheStats {
    memory_hits: AtomicU64,
    disk_hits: AtomicU64,
    misses: AtomicU64,
    provider_calls: AtomicU64,
    writes: AtomicU64,
}

impl CacheStats {
    pub(crate) fn record_hit(&self, source: LookupSource) {
        let counter = match source {
            LookupSource::Memory => &self.memory_hits,
            LookupSource::Disk => &self.disk_hits,
            LookupSource::Provider => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_provider_call(&self) {
        self.provider_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CacheStatsSnapshot {
        CacheStatsSnapshot {
            memory_hits: self.memory_hits.load(Ordering::Relaxed),
            disk_hits: self.disk_hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            provider_calls: self.provider_calls.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStatsSnapshot {
    pub memory_hits: u64,
    pub disk_hits: u64,
    pub misses: u64,
    pub provider_calls: u64,
    pub writes: u64,
}

impl CacheStatsSnapshot {
    pub fn hits(&self) -> u64 {
        self.memory_hits + self.disk_hits
    }
}

//! Test fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use tempfile::TempDir;

use verdant::cache::{CacheConfig, CacheMode, EmbeddingCache};
use verdant::chunk::Chunk;
use verdant::clock::LogicalClock;
use verdant::embedding::MockEmbeddingProvider;
use verdant::evidence::EvidenceGate;
use verdant::pipeline::{DocumentPipeline, Theme};
use verdant::retrieval::HybridRetriever;

pub const DOC_ID: &str = "acme-sustainability-2024";

pub const MODEL_ID: &str = "test-embedding-model";

pub const EMBEDDING_DIM: usize = 16;

pub const FIXED_SEED: u64 = 42;

pub type MockPipeline = DocumentPipeline<Arc<MockEmbeddingProvider>>;

pub fn fixed_clock() -> LogicalClock {
    LogicalClock::fixed(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap())
}

/// Ten chunks over seven pages; several mention climate risk.
pub fn disclosure_chunks() -> Vec<Chunk> {
    [
        ("c01", "The board of directors oversees climate risk and opportunities", Some(3)),
        ("c02", "Climate risk is integrated into enterprise risk management", Some(4)),
        ("c03", "Scope 1 emissions decreased 8 percent year on year", Some(10)),
        ("c04", "Scope 3 emissions cover purchased goods and logistics", Some(11)),
        ("c05", "Physical climate risk assessments cover all production sites", Some(4)),
        ("c06", "Our net zero target is validated by the science based targets initiative", Some(12)),
        ("c07", "Employee engagement survey participation rose to 81 percent", Some(20)),
        ("c08", "Transition risk includes carbon pricing and policy changes", Some(5)),
        ("c09", "Water withdrawal in stressed basins fell by 5 percent", None),
        ("c10", "The audit committee reviews climate related disclosures", Some(3)),
    ]
    .into_iter()
    .map(|(id, text, page)| Chunk::new(DOC_ID, id, text, page))
    .collect()
}

pub fn disclosure_jsonl() -> String {
    disclosure_chunks()
        .iter()
        .map(|c| {
            serde_json::json!({
                "chunk_id": c.chunk_id,
                "content": c.text,
                "page": c.page_num,
            })
            .to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn standard_themes() -> Vec<Theme> {
    vec![
        Theme::new("governance", "board oversight of climate risk"),
        Theme::new("strategy", "transition and physical climate risk"),
        Theme::new("metrics", "scope 3 emissions and net zero target"),
    ]
}

/// A cache directory plus a scriptable provider shared by every cache built on it.
pub struct TestEnv {
    pub dir: TempDir,
    pub provider: Arc<MockEmbeddingProvider>,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
            provider: Arc::new(MockEmbeddingProvider::new(EMBEDDING_DIM)),
        }
    }

    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig::in_dir(self.dir.path(), EMBEDDING_DIM)
    }

    pub fn ledger_path(&self) -> std::path::PathBuf {
        self.cache_config().ledger_path
    }

    pub fn cache(&self) -> EmbeddingCache<Arc<MockEmbeddingProvider>> {
        EmbeddingCache::new(Arc::clone(&self.provider), self.cache_config(), fixed_clock())
    }

    pub fn retriever(&self, mode: CacheMode) -> HybridRetriever<Arc<MockEmbeddingProvider>> {
        let mut retriever = HybridRetriever::new(Arc::new(self.cache()), MODEL_ID, mode);
        retriever.add_document(disclosure_chunks());
        retriever
    }

    pub fn pipeline(&self, mode: CacheMode) -> MockPipeline {
        DocumentPipeline::new(self.retriever(mode), 5, 0.6, EvidenceGate::default())
            .with_seed(FIXED_SEED)
            .with_clock(fixed_clock())
    }
}

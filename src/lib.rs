//! Verdant library crate (used by the CLI and integration tests).
//!
//! Deterministic evidence retrieval for sustainability disclosure scoring.
//!
//! ## Core Types
//! - [`Config`], [`ConfigError`] - Run configuration
//! - [`EmbeddingCache`], [`CacheMode`] - Content-addressed embedding cache (fetch / replay)
//! - [`HybridRetriever`], [`RetrievalResult`] - BM25 + cosine fusion
//! - [`DeterminismHarness`], [`DeterminismReport`] - Repeat-and-hash certification
//! - [`EvidenceGate`], [`ParityReport`] - Structural evidence checks
//! - [`DocumentPipeline`], [`Scorer`] - Per-document orchestration
//!
//! ## Embedding Providers
//! - [`HttpEmbeddingProvider`] - OpenAI-compatible endpoint
//! - [`StubEmbeddingProvider`] - Deterministic offline vectors
//! - [`UnavailableProvider`] - Fails every call (replay wiring)
//!
//! ## Test/Mock Support
//! Mock implementations are available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod cache;
pub mod chunk;
pub mod clock;
pub mod config;
pub mod constants;
pub mod determinism;
pub mod embedding;
pub mod evidence;
pub mod hashing;
pub mod pipeline;
pub mod retrieval;
pub mod storage;

pub use cache::{CacheConfig, CacheError, CacheMode, CacheResult, EmbeddingCache};
pub use chunk::{Chunk, ChunkError, RawChunkRecord, dedup_chunks};
pub use clock::LogicalClock;
pub use config::{Config, ConfigError};
pub use constants::{DimValidationError, validate_embedding_dim};
pub use determinism::{DeterminismError, DeterminismHarness, DeterminismReport, HarnessState};
#[cfg(any(test, feature = "mock"))]
pub use embedding::MockEmbeddingProvider;
pub use embedding::{
    EmbeddingProvider, HttpEmbeddingProvider, ProviderConfig, ProviderError, ProviderKind,
    StubEmbeddingProvider, UnavailableProvider, build_provider,
};
pub use evidence::{
    DocumentStatus, EvidenceAudit, EvidenceGate, EvidenceRecord, GateReason, GateResult,
    ParityReport,
};
pub use hashing::{canonicalize, content_hash, stable_hash};
pub use pipeline::{
    BatchOutcome, DocumentOutcome, DocumentPipeline, PipelineError, RunContext, Scorer, Theme,
    ThemeOutcome, TopQuotesScorer,
};
pub use retrieval::{HybridRetriever, RetrievalError, RetrievalResult, ScoredChunk};
pub use storage::{CacheEntry, Ledger, LedgerAudit, LedgerRecord, audit_replay};

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use tempfile::TempDir;

use super::*;
use crate::cache::{CacheConfig, CacheMode, EmbeddingCache};
use crate::chunk::Chunk;
use crate::determinism::{DeterminismHarness, HarnessState};
use crate::embedding::MockEmbeddingProvider;
use crate::evidence::{EvidenceRecord, GateReason};
use crate::retrieval::RetrievalResult;

const DIM: usize = 8;
const MODEL: &str = "test-model";
const DOC: &str = "acme-2024";

fn clock() -> LogicalClock {
    LogicalClock::fixed(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap())
}

fn chunks() -> Vec<Chunk> {
    vec![
        Chunk::new(DOC, "c1", "The board oversees climate risk", Some(2)),
        Chunk::new(DOC, "c2", "Climate risk is reviewed by the audit committee", Some(5)),
        Chunk::new(DOC, "c3", "Scope 3 emissions are estimated annually", Some(9)),
        Chunk::new(DOC, "c4", "Emissions targets are validated by SBTi", Some(9)),
        Chunk::new(DOC, "c5", "Employee safety training hours increased", Some(12)),
    ]
}

fn themes() -> Vec<Theme> {
    vec![
        Theme::new("governance", "board climate risk oversight"),
        Theme::new("metrics", "scope 3 emissions targets"),
    ]
}

fn create_pipeline(
    mode: CacheMode,
    dir: &TempDir,
) -> (DocumentPipeline<Arc<MockEmbeddingProvider>>, Arc<MockEmbeddingProvider>) {
    let provider = Arc::new(MockEmbeddingProvider::new(DIM));
    let cache = EmbeddingCache::new(
        Arc::clone(&provider),
        CacheConfig::in_dir(dir.path(), DIM),
        clock(),
    );
    let mut retriever = HybridRetriever::new(Arc::new(cache), MODEL, mode);
    retriever.add_document(chunks());
    let pipeline = DocumentPipeline::new(retriever, 3, 0.6, EvidenceGate::default())
        .with_seed(42)
        .with_clock(clock());
    (pipeline, provider)
}

/// Cites a chunk id that was never retrieved.
struct OffListScorer;

impl Scorer for OffListScorer {
    fn score(&self, theme: &Theme, result: &RetrievalResult) -> PipelineResult<ThemeScore> {
        let mut evidence: Vec<EvidenceRecord> = TopQuotesScorer::new(2)
            .score(theme, result)?
            .evidence;
        evidence.push(EvidenceRecord {
            doc_id: result.doc_id.clone(),
            theme: theme.name.clone(),
            chunk_id: "c-unretrieved".to_string(),
            quote: "fabricated".to_string(),
            page_num: Some(40),
            content_hash: String::new(),
        });
        Ok(ThemeScore {
            stage: 1,
            confidence: 0.5,
            evidence,
        })
    }
}

struct FailingScorer;

impl Scorer for FailingScorer {
    fn score(&self, theme: &Theme, _result: &RetrievalResult) -> PipelineResult<ThemeScore> {
        Err(PipelineError::Scorer {
            theme: theme.name.clone(),
            reason: "rubric unavailable".to_string(),
        })
    }
}

#[test]
fn test_theme_parse() {
    assert_eq!(
        Theme::parse("governance = board oversight"),
        Some(Theme::new("governance", "board oversight"))
    );
    assert_eq!(Theme::parse("no-separator"), None);
    assert_eq!(Theme::parse("=query"), None);
}

#[test]
fn test_correlation_id_is_derived() {
    let a = RunContext::new(0, 42, clock());
    let b = RunContext::new(1, 42, clock());
    assert_eq!(a.correlation_id(DOC), a.correlation_id(DOC));
    assert_ne!(a.correlation_id(DOC), b.correlation_id(DOC));
    assert_eq!(a.correlation_id(DOC).get_version_num(), 5);
}

#[test]
fn test_top_quotes_scorer() {
    let dir = TempDir::new().unwrap();
    let (pipeline, _provider) = create_pipeline(CacheMode::Fetch, &dir);
    let theme = Theme::new("governance", "board climate risk oversight");
    let result = pipeline.retriever().rank(DOC, &theme.query, 3, 0.6).unwrap();

    let score = TopQuotesScorer::new(2).score(&theme, &result).unwrap();
    assert_eq!(score.evidence.len(), 2);
    assert_eq!(score.evidence[0].chunk_id, result.results[0].chunk_id);
    assert_eq!(score.evidence[0].quote, result.results[0].text);
    assert!(score.stage <= MAX_STAGE);
    let mean = (result.results[0].fused_score + result.results[1].fused_score) / 2.0;
    assert!((score.confidence - mean).abs() < 1e-12);
}

#[test]
fn test_top_quotes_scorer_empty_result() {
    let result = RetrievalResult {
        doc_id: DOC.to_string(),
        query: "q".to_string(),
        k: 3,
        alpha: 0.6,
        results: Vec::new(),
    };
    let score = TopQuotesScorer::default()
        .score(&Theme::new("t", "q"), &result)
        .unwrap();
    assert!(score.evidence.is_empty());
    assert_eq!(score.stage, 0);
    assert_eq!(score.confidence, 0.0);
}

#[test]
fn test_run_evaluates_every_theme_in_order() {
    let dir = TempDir::new().unwrap();
    let (pipeline, _provider) = create_pipeline(CacheMode::Fetch, &dir);

    let outcome = pipeline
        .run(DOC, &themes(), &TopQuotesScorer::new(3), pipeline.context(0))
        .unwrap();

    assert_eq!(outcome.themes.len(), 2);
    assert_eq!(outcome.themes[0].theme, "governance");
    assert_eq!(outcome.themes[1].theme, "metrics");
    assert_eq!(outcome.generated_at, "2025-01-01T00:00:00Z");
    for theme in &outcome.themes {
        assert!(theme.retrieval.len() <= 3);
        assert!(theme.parity.subset_ok);
    }
    assert_eq!(
        outcome.status,
        DocumentStatus::from_passed(outcome.themes.iter().all(ThemeOutcome::passed))
    );
}

#[test]
fn test_parity_failure_needs_revision() {
    let dir = TempDir::new().unwrap();
    let (pipeline, _provider) = create_pipeline(CacheMode::Fetch, &dir);

    let outcome = pipeline
        .run(DOC, &themes(), &OffListScorer, pipeline.context(0))
        .unwrap();

    assert_eq!(outcome.status, DocumentStatus::NeedsRevision);
    assert!(outcome.themes.iter().all(|t| !t.parity.subset_ok));
    assert!(outcome.themes[0].parity.missing.contains("c-unretrieved"));

    let audit = audit(&outcome);
    assert_eq!(audit.status, DocumentStatus::NeedsRevision);
}

#[test]
fn test_gate_failure_needs_revision() {
    let dir = TempDir::new().unwrap();
    let (pipeline, _provider) = create_pipeline(CacheMode::Fetch, &dir);

    let outcome = pipeline
        .run(DOC, &themes(), &TopQuotesScorer::new(1), pipeline.context(0))
        .unwrap();

    assert_eq!(outcome.status, DocumentStatus::NeedsRevision);
    assert!(matches!(
        outcome.themes[0].gate.reason,
        GateReason::InsufficientQuotes { found: 1, required: 2 }
    ));
}

#[test]
fn test_scorer_error_propagates() {
    let dir = TempDir::new().unwrap();
    let (pipeline, _provider) = create_pipeline(CacheMode::Fetch, &dir);
    let err = pipeline
        .run(DOC, &themes(), &FailingScorer, pipeline.context(0))
        .unwrap_err();
    assert!(matches!(err, PipelineError::Scorer { .. }));
}

#[test]
fn test_no_themes() {
    let dir = TempDir::new().unwrap();
    let (pipeline, _provider) = create_pipeline(CacheMode::Fetch, &dir);
    let err = pipeline
        .run(DOC, &[], &TopQuotesScorer::default(), pipeline.context(0))
        .unwrap_err();
    assert!(matches!(err, PipelineError::NoThemes { .. }));
}

#[test]
fn test_run_batch_records_failures() {
    let dir = TempDir::new().unwrap();
    let (pipeline, _provider) = create_pipeline(CacheMode::Fetch, &dir);

    let docs = vec![
        ("unknown-doc".to_string(), themes()),
        (DOC.to_string(), themes()),
    ];
    let batch = pipeline.run_batch(&docs, &TopQuotesScorer::new(3), pipeline.context(0));

    assert!(!batch.is_complete());
    assert_eq!(batch.outcomes.len(), 1);
    assert_eq!(batch.outcomes[0].doc_id, DOC);
    assert_eq!(batch.failures.len(), 1);
    assert_eq!(batch.failures[0].doc_id, "unknown-doc");
    assert!(!batch.failures[0].cache_miss);
}

#[test]
fn test_replay_miss_is_reported_in_batch() {
    let dir = TempDir::new().unwrap();
    let (pipeline, provider) = create_pipeline(CacheMode::Replay, &dir);

    let docs = vec![(DOC.to_string(), themes())];
    let batch = pipeline.run_batch(&docs, &TopQuotesScorer::new(3), pipeline.context(0));

    assert!(batch.failures[0].cache_miss);
    assert_eq!(provider.calls(), 0);
}

#[test]
fn test_certify_three_runs() {
    let dir = TempDir::new().unwrap();
    let (pipeline, _provider) = create_pipeline(CacheMode::Fetch, &dir);
    let mut harness = DeterminismHarness::new(3).unwrap();

    let report = pipeline
        .certify(&mut harness, DOC, &themes(), &TopQuotesScorer::new(3))
        .unwrap();

    assert!(report.identical);
    assert_eq!(report.hashes.len(), 3);
    assert_eq!(harness.state(), HarnessState::Certified);
}

#[test]
fn test_certify_replay_after_fetch_matches() {
    let dir = TempDir::new().unwrap();
    let (fetcher, _) = create_pipeline(CacheMode::Fetch, &dir);
    let mut harness = DeterminismHarness::new(2).unwrap();
    let fetched = fetcher
        .certify(&mut harness, DOC, &themes(), &TopQuotesScorer::new(3))
        .unwrap();

    let (replayer, provider) = create_pipeline(CacheMode::Replay, &dir);
    let replayed = replayer
        .certify(&mut harness, DOC, &themes(), &TopQuotesScorer::new(3))
        .unwrap();

    assert!(replayed.identical);
    assert_eq!(provider.calls(), 0);
    assert_eq!(fetched.hashes[0], replayed.hashes[0]);
}

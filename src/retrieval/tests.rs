use std::sync::Arc;

use chrono::{TimeZone, Utc};
use tempfile::TempDir;

use super::*;
use crate::cache::{CacheConfig, CacheError, CacheMode, EmbeddingCache};
use crate::chunk::Chunk;
use crate::clock::LogicalClock;
use crate::embedding::MockEmbeddingProvider;

const DIM: usize = 4;
const MODEL: &str = "test-model";
const DOC: &str = "acme-2024";

type MockRetriever = HybridRetriever<Arc<MockEmbeddingProvider>>;

fn create_retriever(mode: CacheMode) -> (MockRetriever, Arc<MockEmbeddingProvider>, TempDir) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let provider = Arc::new(MockEmbeddingProvider::new(DIM));
    let clock = LogicalClock::fixed(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
    let cache = EmbeddingCache::new(
        Arc::clone(&provider),
        CacheConfig::in_dir(dir.path(), DIM),
        clock,
    );
    (
        HybridRetriever::new(Arc::new(cache), MODEL, mode),
        provider,
        dir,
    )
}

fn climate_chunks() -> Vec<Chunk> {
    [
        ("c01", "The board reviews climate risk every quarter", 1),
        ("c02", "Climate risk scenarios follow TCFD guidance", 2),
        ("c03", "Scope 1 and scope 2 emissions fell by 12 percent", 3),
        ("c04", "Physical climate risk includes flooding at two sites", 4),
        ("c05", "Employee volunteering reached a record high", 5),
        ("c06", "Transition risk from carbon pricing is material", 6),
        ("c07", "Water withdrawal intensity decreased", 7),
        ("c08", "Risk committee charter covers climate topics", 8),
        ("c09", "Renewable electricity share reached 40 percent", 9),
        ("c10", "Climate related disclosures are externally assured", 10),
    ]
    .into_iter()
    .map(|(id, text, page)| Chunk::new(DOC, id, text, Some(page)))
    .collect()
}

fn ids(result: &RetrievalResult) -> Vec<&str> {
    result.chunk_ids().collect()
}

#[test]
fn test_min_max_normalize() {
    assert_eq!(min_max_normalize(&[1.0, 2.0, 3.0]), vec![0.0, 0.5, 1.0]);
    assert_eq!(min_max_normalize(&[4.2, 4.2, 4.2]), vec![0.0, 0.0, 0.0]);
    assert!(min_max_normalize(&[]).is_empty());
    assert_eq!(min_max_normalize(&[-1.0, 1.0]), vec![0.0, 1.0]);
}

#[test]
fn test_fuse_weights() {
    let fused = fuse(&[1.0, 0.0], &[0.0, 1.0], 0.6);
    assert!((fused[0] - 0.6).abs() < 1e-12);
    assert!((fused[1] - 0.4).abs() < 1e-12);
}

#[test]
fn test_cosine_similarity() {
    assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-9);
    assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-9);
    assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
}

#[test]
fn test_bm25_prefers_term_matches() {
    let index = LexicalIndex::build(&[
        "climate risk climate risk",
        "climate policy",
        "water usage",
    ]);
    let scores = index.scores("climate risk");
    assert!(scores[0] > scores[1]);
    assert!(scores[1] > scores[2]);
    assert_eq!(scores[2], 0.0);
}

#[test]
fn test_bm25_idf_non_negative() {
    let index = LexicalIndex::build(&["risk", "risk", "risk"]);
    assert!(index.idf("risk") > 0.0);
    assert!(index.scores("risk").iter().all(|&s| s > 0.0));
}

#[test]
fn test_bm25_empty_query_and_index() {
    let index = LexicalIndex::build(&["climate"]);
    assert_eq!(index.scores("   "), vec![0.0]);

    let empty = LexicalIndex::build::<&str>(&[]);
    assert!(empty.is_empty());
    assert!(empty.scores("climate").is_empty());
}

#[test]
fn test_invalid_parameters_checked_first() {
    // Replay on an empty cache: a parameter error must win over a cache miss.
    let (mut retriever, provider, _dir) = create_retriever(CacheMode::Replay);
    retriever.add_document(climate_chunks());

    for (k, alpha) in [(0, 0.6), (5, -0.1), (5, 1.1), (5, f64::NAN)] {
        let err = retriever.rank(DOC, "climate risk", k, alpha).unwrap_err();
        assert!(
            matches!(err, RetrievalError::InvalidParameter { .. }),
            "k={k} alpha={alpha}: {err}"
        );
    }
    assert_eq!(provider.calls(), 0);
}

#[test]
fn test_unknown_document() {
    let (retriever, _provider, _dir) = create_retriever(CacheMode::Fetch);
    let err = retriever.rank("missing", "climate", 5, 0.6).unwrap_err();
    assert!(matches!(err, RetrievalError::UnknownDocument { doc_id } if doc_id == "missing"));
}

#[test]
fn test_climate_risk_scenario() {
    let (mut retriever, _provider, _dir) = create_retriever(CacheMode::Fetch);
    retriever.add_document(climate_chunks());

    let result = retriever.rank(DOC, "climate risk", 5, 0.6).unwrap();

    assert_eq!(result.len(), 5);
    for pair in result.results.windows(2) {
        assert!(compare_scored(&pair[0], &pair[1]).is_le());
    }
    for r in &result.results {
        assert!((0.0..=1.0).contains(&r.fused_score), "{}", r.fused_score);
    }
    // Chunks mentioning neither term carry no lexical signal.
    let top = &result.results[0];
    assert!(top.lexical_score > 0.0);
}

#[test]
fn test_alpha_one_is_pure_lexical() {
    let (mut retriever, _provider, _dir) = create_retriever(CacheMode::Fetch);
    let chunks = climate_chunks();
    retriever.add_document(chunks.clone());

    let result = retriever.rank(DOC, "climate risk", 10, 1.0).unwrap();

    let index = LexicalIndex::build(&chunks.iter().map(|c| c.text.as_str()).collect::<Vec<_>>());
    let lexical = index.scores("climate risk");
    let mut expected: Vec<(f64, &str)> = chunks
        .iter()
        .zip(&lexical)
        .map(|(c, &s)| (s, c.chunk_id.as_str()))
        .collect();
    expected.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(b.1)));
    let expected: Vec<&str> = expected.into_iter().map(|(_, id)| id).collect();

    assert_eq!(ids(&result), expected);
}

#[test]
fn test_alpha_zero_is_pure_semantic() {
    let (mut retriever, provider, _dir) = create_retriever(CacheMode::Fetch);
    provider.pin("esg query", vec![1.0, 0.0, 0.0, 0.0]);
    provider.pin("alpha", vec![0.0, 1.0, 0.0, 0.0]);
    provider.pin("beta", vec![1.0, 0.0, 0.0, 0.0]);
    provider.pin("gamma", vec![1.0, 1.0, 0.0, 0.0]);
    retriever.add_document(vec![
        Chunk::new(DOC, "a", "alpha", Some(1)),
        Chunk::new(DOC, "b", "beta", Some(2)),
        Chunk::new(DOC, "c", "gamma", Some(3)),
    ]);

    let result = retriever.rank(DOC, "esg query", 3, 0.0).unwrap();
    assert_eq!(ids(&result), vec!["b", "c", "a"]);
    assert!((result.results[0].semantic_score - 1.0).abs() < 1e-6);
    assert_eq!(result.results[0].fused_score, 1.0);
    assert_eq!(result.results[2].fused_score, 0.0);
}

#[test]
fn test_ties_break_by_chunk_id() {
    let (mut retriever, _provider, _dir) = create_retriever(CacheMode::Fetch);
    retriever.add_document(vec![
        Chunk::new(DOC, "c3", "water", None),
        Chunk::new(DOC, "c1", "waste", None),
        Chunk::new(DOC, "c2", "energy", None),
    ]);

    // No term matches: lexical is constant, normalizes to zero everywhere.
    let result = retriever.rank(DOC, "biodiversity", 3, 1.0).unwrap();
    assert_eq!(ids(&result), vec!["c1", "c2", "c3"]);
    assert!(result.results.iter().all(|r| r.fused_score == 0.0));
}

#[test]
fn test_k_larger_than_candidates() {
    let (mut retriever, _provider, _dir) = create_retriever(CacheMode::Fetch);
    retriever.add_document(climate_chunks()[..3].to_vec());

    let result = retriever.rank(DOC, "climate", 50, 0.6).unwrap();
    assert_eq!(result.len(), 3);
}

#[test]
fn test_add_document_dedups_and_replaces() {
    let (mut retriever, _provider, _dir) = create_retriever(CacheMode::Fetch);
    let kept = retriever.add_document(vec![
        Chunk::new(DOC, "c1", "Net zero by 2040", Some(1)),
        Chunk::new(DOC, "c2", "net zero by 2040", Some(2)),
    ]);
    assert_eq!(kept, 1);
    assert_eq!(retriever.chunks(DOC).unwrap()[0].chunk_id, "c1");

    retriever.add_document(vec![Chunk::new(DOC, "c9", "other", None)]);
    assert_eq!(retriever.chunks(DOC).unwrap()[0].chunk_id, "c9");
}

#[test]
fn test_add_document_keeps_first_of_repeated_chunk_id() {
    let (mut retriever, _provider, _dir) = create_retriever(CacheMode::Fetch);
    let kept = retriever.add_document(vec![
        Chunk::new(DOC, "c1", "Scope 1 emissions fell", Some(1)),
        Chunk::new(DOC, "c1", "Board oversees climate risk", Some(2)),
        Chunk::new(DOC, "c2", "Net zero by 2040", Some(3)),
    ]);
    assert_eq!(kept, 2);

    let chunks = retriever.chunks(DOC).unwrap();
    let ids: Vec<&str> = chunks.iter().map(|c| c.chunk_id.as_str()).collect();
    assert_eq!(ids, vec!["c1", "c2"]);
    assert_eq!(chunks[0].text, "scope 1 emissions fell");
}

#[test]
fn test_replay_empty_cache_fails_closed() {
    let (mut retriever, provider, dir) = create_retriever(CacheMode::Replay);
    retriever.add_document(climate_chunks());

    let err = retriever.rank(DOC, "climate risk", 5, 0.6).unwrap_err();
    assert!(err.is_cache_miss());
    assert!(matches!(
        err,
        RetrievalError::Cache(CacheError::CacheMiss { .. })
    ));
    assert_eq!(provider.calls(), 0);
    assert!(!dir.path().join("ledger.jsonl").exists());
}

#[test]
fn test_replay_matches_fetch() {
    let (mut fetcher, _provider, dir) = create_retriever(CacheMode::Fetch);
    fetcher.add_document(climate_chunks());
    let fetched = fetcher.rank(DOC, "climate risk", 5, 0.6).unwrap();

    let clock = LogicalClock::fixed(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
    let offline = Arc::new(MockEmbeddingProvider::new(DIM));
    let cache = EmbeddingCache::new(
        Arc::clone(&offline),
        CacheConfig::in_dir(dir.path(), DIM),
        clock,
    );
    let mut replayer = HybridRetriever::new(Arc::new(cache), MODEL, CacheMode::Replay);
    replayer.add_document(climate_chunks());
    let replayed = replayer.rank(DOC, "climate risk", 5, 0.6).unwrap();

    assert_eq!(fetched, replayed);
    assert_eq!(offline.calls(), 0);
}

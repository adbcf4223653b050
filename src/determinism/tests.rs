use std::cell::Cell;

use serde_json::json;

use super::*;

#[derive(Debug, thiserror::Error)]
#[error("boom")]
struct Boom;

#[test]
fn test_strip_volatile_recursive() {
    let volatile = volatile_fields::<_, String>([]);
    let value = json!({
        "run_index": 2,
        "doc": {
            "generated_at": "2025-01-01T00:00:00Z",
            "themes": [{"correlation_id": "x", "score": 3}]
        }
    });
    assert_eq!(
        strip_volatile(&value, &volatile),
        json!({"doc": {"themes": [{"score": 3}]}})
    );
}

#[test]
fn test_volatile_only_differences_hash_identically() {
    let volatile = volatile_fields::<_, String>([]);
    let a = json!({"run_index": 0, "correlation_id": "a", "timestamp": "t0", "score": 1.5});
    let b = json!({"score": 1.5, "timestamp": "t9", "correlation_id": "b", "run_index": 2});
    assert_eq!(
        stable_hash_value(&a, &volatile).unwrap(),
        stable_hash_value(&b, &volatile).unwrap()
    );

    let c = json!({"score": 1.6});
    assert_ne!(
        stable_hash_value(&a, &volatile).unwrap(),
        stable_hash_value(&c, &volatile).unwrap()
    );
}

#[test]
fn test_extra_volatile_fields() {
    let volatile = volatile_fields(["elapsed_ms"]);
    let a = json!({"elapsed_ms": 12, "k": 1});
    let b = json!({"elapsed_ms": 99, "k": 1});
    assert_eq!(
        stable_hash_value(&a, &volatile).unwrap(),
        stable_hash_value(&b, &volatile).unwrap()
    );
}

#[test]
fn test_structural_diff_paths() {
    let left = json!({"themes": [{"score": 1}, {"score": 2}], "status": "ok"});
    let right = json!({"themes": [{"score": 1}, {"score": 3}, {"score": 4}], "status": "ok"});
    let diff = structural_diff(&left, &right);

    assert_eq!(diff.len(), 2);
    assert_eq!(diff[0].path, "$.themes[1].score");
    assert_eq!(diff[0].left, Some(json!(2)));
    assert_eq!(diff[0].right, Some(json!(3)));
    assert_eq!(diff[1].path, "$.themes[2]");
    assert_eq!(diff[1].left, None);
}

#[test]
fn test_structural_diff_identical_is_empty() {
    let v = json!({"a": [1, 2, {"b": null}]});
    assert!(structural_diff(&v, &v).is_empty());
}

#[test]
fn test_harness_rejects_too_few_runs() {
    assert!(matches!(
        DeterminismHarness::new(1),
        Err(DeterminismError::InvalidRunCount { runs: 1 })
    ));
    assert!(DeterminismHarness::new(2).is_ok());
}

#[test]
fn test_harness_certifies_identical_runs() {
    let mut harness = DeterminismHarness::new(3).unwrap();
    assert_eq!(harness.state(), HarnessState::Idle);

    let report = harness
        .certify(|run_index| Ok::<_, Boom>(json!({"run_index": run_index, "ranked": ["c2", "c1"]})))
        .unwrap();

    assert!(report.identical);
    assert_eq!(report.runs(), 3);
    assert!(report.hashes.iter().all(|h| *h == report.hashes[0]));
    assert!(report.diff.is_empty());
    assert_eq!(harness.state(), HarnessState::Certified);
}

#[test]
fn test_harness_rejects_divergent_run_with_diff() {
    let mut harness = DeterminismHarness::new(3).unwrap();
    let report = harness
        .certify(|run_index| {
            let top = if run_index == 2 { "c9" } else { "c2" };
            Ok::<_, Boom>(json!({"generated_at": run_index, "top": top}))
        })
        .unwrap();

    assert!(!report.identical);
    assert_eq!(report.divergent_pair, Some((0, 2)));
    assert_eq!(report.diff.len(), 1);
    assert_eq!(report.diff[0].path, "$.top");
    assert_eq!(harness.state(), HarnessState::Rejected);
}

#[test]
fn test_harness_run_error_aborts() {
    let mut harness = DeterminismHarness::new(3).unwrap();
    let calls = Cell::new(0);
    let err = harness
        .certify(|run_index| {
            calls.set(calls.get() + 1);
            if run_index == 1 { Err(Boom) } else { Ok(json!({})) }
        })
        .unwrap_err();

    assert!(matches!(err, DeterminismError::Run { run_index: 1, .. }));
    assert_eq!(calls.get(), 2);
    assert_eq!(harness.state(), HarnessState::Rejected);
}

#[test]
fn test_harness_runs_sequentially_in_order() {
    let mut harness = DeterminismHarness::new(4).unwrap();
    let mut seen = Vec::new();
    harness
        .certify(|run_index| {
            seen.push(run_index);
            Ok::<_, Boom>(json!(1))
        })
        .unwrap();
    assert_eq!(seen, vec![0, 1, 2, 3]);
}

#[test]
fn test_report_serializes_without_empty_diff() {
    let report = DeterminismReport {
        hashes: vec!["a".into(), "a".into()],
        identical: true,
        divergent_pair: None,
        diff: Vec::new(),
    };
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json, json!({"hashes": ["a", "a"], "identical": true}));
}

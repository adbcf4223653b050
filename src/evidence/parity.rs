//! Cited evidence must come from the retrieved candidates.

use std::collections::BTreeSet;

use tracing::debug;

use crate::retrieval::RetrievalResult;

use super::types::{EvidenceRecord, ParityReport};

/// Reports whether every id in `evidence_ids` is in `topk_ids`.
pub fn validate<'a, E, T>(evidence_ids: E, topk_ids: T) -> ParityReport
where
    E: IntoIterator<Item = &'a str>,
    T: IntoIterator<Item = &'a str>,
{
    let topk: BTreeSet<&str> = topk_ids.into_iter().collect();
    let missing: BTreeSet<String> = evidence_ids
        .into_iter()
        .filter(|id| !topk.contains(id))
        .map(str::to_string)
        .collect();

    ParityReport {
        subset_ok: missing.is_empty(),
        missing,
    }
}

/// [`validate`] against a theme's retrieval result.
pub fn validate_theme(evidence: &[EvidenceRecord], result: &RetrievalResult) -> ParityReport {
    let report = validate(
        evidence.iter().map(|e| e.chunk_id.as_str()),
        result.chunk_ids(),
    );
    if !report.subset_ok {
        debug!(
            doc_id = %result.doc_id,
            missing = report.missing.len(),
            "Evidence cites chunks outside the top-K"
        );
    }
    report
}

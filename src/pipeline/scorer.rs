use std::collections::BTreeSet;

use crate::evidence::EvidenceRecord;
use crate::retrieval::RetrievalResult;

use super::error::PipelineResult;
use super::types::{Theme, ThemeScore};

/// Highest maturity stage a scorer may assign.
pub const MAX_STAGE: u8 = 4;

/// Rubric scorer seam.
///
/// Implementations must only cite chunks from `result`; anything else is
/// reported by the parity check.
pub trait Scorer {
    fn score(&self, theme: &Theme, result: &RetrievalResult) -> PipelineResult<ThemeScore>;
}

impl<S: Scorer + ?Sized> Scorer for &S {
    fn score(&self, theme: &Theme, result: &RetrievalResult) -> PipelineResult<ThemeScore> {
        (**self).score(theme, result)
    }
}

/// Cites the first `quotes` retrieved chunks verbatim.
///
/// Stage is the number of distinct cited pages, capped at [`MAX_STAGE`];
/// confidence is the mean fused score of the cited chunks.
#[derive(Debug, Clone, Copy)]
pub struct TopQuotesScorer {
    pub quotes: usize,
}

impl Default for TopQuotesScorer {
    fn default() -> Self {
        Self { quotes: 3 }
    }
}

impl TopQuotesScorer {
    pub fn new(quotes: usize) -> Self {
        Self { quotes }
    }
}

impl Scorer for TopQuotesScorer {
    fn score(&self, theme: &Theme, result: &RetrievalResult) -> PipelineResult<ThemeScore> {
        let cited = &result.results[..self.quotes.min(result.results.len())];

        let evidence: Vec<EvidenceRecord> = cited
            .iter()
            .map(|r| EvidenceRecord {
                doc_id: result.doc_id.clone(),
                theme: theme.name.clone(),
                chunk_id: r.chunk_id.clone(),
                quote: r.text.clone(),
                page_num: r.page_num,
                content_hash: r.content_hash.clone(),
            })
            .collect();

        let pages: BTreeSet<u32> = cited.iter().filter_map(|r| r.page_num).collect();
        let stage = pages.len().min(MAX_STAGE as usize) as u8;
        let confidence = if cited.is_empty() {
            0.0
        } else {
            cited.iter().map(|r| r.fused_score).sum::<f64>() / cited.len() as f64
        };

        Ok(ThemeScore {
            stage,
            confidence,
            evidence,
        })
    }
}

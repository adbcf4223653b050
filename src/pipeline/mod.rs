//! Per-document evidence pipeline.
//!
//! For each theme, in caller order: rank the document, let the [`Scorer`] pick
//! evidence from the top-K, then run the evidence gate and the parity check.
//! Failed checks mark the document `NeedsRevision`; they are never errors.

mod error;
pub mod scorer;
pub mod types;

#[cfg(test)]
mod tests;

pub use error::{PipelineError, PipelineResult};
pub use scorer::{MAX_STAGE, Scorer, TopQuotesScorer};
pub use types::{
    BatchOutcome, DocumentFailure, DocumentOutcome, RunContext, Theme, ThemeOutcome, ThemeScore,
};

use tracing::{info, warn};

use crate::chunk::pages_are_uniform;
use crate::clock::LogicalClock;
use crate::config::Config;
use crate::determinism::{DeterminismHarness, DeterminismResult, DeterminismReport};
use crate::embedding::EmbeddingProvider;
use crate::evidence::{DocumentStatus, EvidenceAudit, EvidenceGate, ThemeAudit, parity};
use crate::retrieval::{HybridRetriever, validate_params};

/// Ranking, scoring and validation for registered documents.
#[derive(Debug)]
pub struct DocumentPipeline<P> {
    retriever: HybridRetriever<P>,
    k: usize,
    alpha: f64,
    gate: EvidenceGate,
    seed: u64,
    clock: LogicalClock,
}

impl<P: EmbeddingProvider> DocumentPipeline<P> {
    pub fn new(retriever: HybridRetriever<P>, k: usize, alpha: f64, gate: EvidenceGate) -> Self {
        Self {
            retriever,
            k,
            alpha,
            gate,
            seed: crate::constants::DEFAULT_SEED,
            clock: LogicalClock::System,
        }
    }

    pub fn from_config(config: &Config, retriever: HybridRetriever<P>) -> Self {
        Self {
            retriever,
            k: config.k,
            alpha: config.alpha,
            gate: EvidenceGate::from_config(config),
            seed: config.seed,
            clock: config.clock(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_clock(mut self, clock: LogicalClock) -> Self {
        self.clock = clock;
        self
    }

    pub fn retriever(&self) -> &HybridRetriever<P> {
        &self.retriever
    }

    pub fn retriever_mut(&mut self) -> &mut HybridRetriever<P> {
        &mut self.retriever
    }

    /// Context for run `run_index` with this pipeline's seed and clock.
    pub fn context(&self, run_index: usize) -> RunContext {
        RunContext::new(run_index, self.seed, self.clock)
    }

    /// Runs every theme against `doc_id`.
    pub fn run<S: Scorer + ?Sized>(
        &self,
        doc_id: &str,
        themes: &[Theme],
        scorer: &S,
        ctx: RunContext,
    ) -> PipelineResult<DocumentOutcome> {
        if themes.is_empty() {
            return Err(PipelineError::NoThemes {
                doc_id: doc_id.to_string(),
            });
        }
        validate_params(self.k, self.alpha)?;

        if let Some(chunks) = self.retriever.chunks(doc_id)
            && pages_are_uniform(chunks)
        {
            warn!(
                doc_id,
                page = ?chunks.first().and_then(|c| c.page_num),
                "Every chunk reports the same page; the page gate cannot pass"
            );
        }

        let mut outcomes = Vec::with_capacity(themes.len());
        for theme in themes {
            let retrieval = self.retriever.rank(doc_id, &theme.query, self.k, self.alpha)?;
            let score = scorer.score(theme, &retrieval)?;
            let gate = self.gate.validate(&theme.name, &score.evidence);
            let parity = parity::validate_theme(&score.evidence, &retrieval);

            outcomes.push(ThemeOutcome {
                theme: theme.name.clone(),
                query: theme.query.clone(),
                retrieval,
                stage: score.stage,
                confidence: score.confidence,
                evidence: score.evidence,
                gate,
                parity,
            });
        }

        let status = DocumentStatus::from_passed(outcomes.iter().all(ThemeOutcome::passed));
        info!(
            doc_id,
            run_index = ctx.run_index,
            themes = outcomes.len(),
            status = %status,
            "Document evaluated"
        );

        Ok(DocumentOutcome {
            doc_id: doc_id.to_string(),
            run_index: ctx.run_index,
            generated_at: ctx.clock.now_rfc3339(),
            correlation_id: ctx.correlation_id(doc_id),
            model_id: self.retriever.model_id().to_string(),
            status,
            themes: outcomes,
        })
    }

    /// Runs several documents, recording per-document failures.
    pub fn run_batch<S: Scorer + ?Sized>(
        &self,
        docs: &[(String, Vec<Theme>)],
        scorer: &S,
        ctx: RunContext,
    ) -> BatchOutcome {
        let mut batch = BatchOutcome::default();
        for (doc_id, themes) in docs {
            match self.run(doc_id, themes, scorer, ctx) {
                Ok(outcome) => batch.outcomes.push(outcome),
                Err(e) => {
                    warn!(doc_id = %doc_id, error = %e, "Document failed; continuing batch");
                    batch.failures.push(DocumentFailure {
                        doc_id: doc_id.clone(),
                        cache_miss: e.is_cache_miss(),
                        error: e.to_string(),
                    });
                }
            }
        }
        batch
    }

    /// Runs `doc_id` under `harness` with this pipeline's seed and clock.
    pub fn certify<S: Scorer + ?Sized>(
        &self,
        harness: &mut DeterminismHarness,
        doc_id: &str,
        themes: &[Theme],
        scorer: &S,
    ) -> DeterminismResult<DeterminismReport> {
        harness.certify(|run_index| self.run(doc_id, themes, scorer, self.context(run_index)))
    }
}

/// Per-document audit of an outcome: recorded gate results, parity recomputed.
pub fn audit(outcome: &DocumentOutcome) -> EvidenceAudit {
    let themes = outcome
        .themes
        .iter()
        .map(|t| ThemeAudit {
            theme: t.theme.clone(),
            gate: t.gate.clone(),
            parity: parity::validate_theme(&t.evidence, &t.retrieval),
        })
        .collect();
    EvidenceAudit::new(outcome.doc_id.clone(), themes)
}

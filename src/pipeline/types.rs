use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::LogicalClock;
use crate::evidence::{DocumentStatus, EvidenceRecord, GateResult, ParityReport};
use crate::retrieval::RetrievalResult;

/// A rubric theme and the query used to retrieve evidence for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    pub name: String,
    pub query: String,
}

impl Theme {
    pub fn new(name: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            query: query.into(),
        }
    }

    /// Parses `name=query`.
    pub fn parse(spec: &str) -> Option<Self> {
        let (name, query) = spec.split_once('=')?;
        let (name, query) = (name.trim(), query.trim());
        if name.is_empty() || query.is_empty() {
            return None;
        }
        Some(Self::new(name, query))
    }
}

/// What a scorer returns for one theme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeScore {
    pub stage: u8,
    pub confidence: f64,
    pub evidence: Vec<EvidenceRecord>,
}

/// Identity of one pipeline execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunContext {
    pub run_index: usize,
    pub seed: u64,
    pub clock: LogicalClock,
}

impl RunContext {
    pub fn new(run_index: usize, seed: u64, clock: LogicalClock) -> Self {
        Self {
            run_index,
            seed,
            clock,
        }
    }

    /// UUID v5 over seed, run index and document.
    pub fn correlation_id(&self, doc_id: &str) -> Uuid {
        let name = format!("verdant:{}:{}:{}", self.seed, self.run_index, doc_id);
        Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeOutcome {
    pub theme: String,
    pub query: String,
    pub retrieval: RetrievalResult,
    pub stage: u8,
    pub confidence: f64,
    pub evidence: Vec<EvidenceRecord>,
    pub gate: GateResult,
    pub parity: ParityReport,
}

impl ThemeOutcome {
    pub fn passed(&self) -> bool {
        self.gate.passed && self.parity.subset_ok
    }
}

/// Result of one document run. `run_index`, `generated_at` and
/// `correlation_id` vary between runs and are stripped before hashing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentOutcome {
    pub doc_id: String,
    pub run_index: usize,
    pub generated_at: String,
    pub correlation_id: Uuid,
    pub model_id: String,
    pub status: DocumentStatus,
    pub themes: Vec<ThemeOutcome>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentFailure {
    pub doc_id: String,
    pub error: String,
    pub cache_miss: bool,
}

/// Outcomes of a multi-document batch. Failed documents do not stop the batch.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub outcomes: Vec<DocumentOutcome>,
    pub failures: Vec<DocumentFailure>,
}

impl BatchOutcome {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

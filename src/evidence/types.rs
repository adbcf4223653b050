use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A quote cited as evidence for one theme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceRecord {
    pub doc_id: String,
    pub theme: String,
    /// Must name a chunk in the theme's retrieval result.
    pub chunk_id: String,
    pub quote: String,
    pub page_num: Option<u32>,
    pub content_hash: String,
}

/// Why a theme passed or failed the evidence gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GateReason {
    Passed,
    InsufficientQuotes { found: usize, required: usize },
    InsufficientPages { found: usize, required: usize },
}

impl fmt::Display for GateReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passed => f.write_str("passed"),
            Self::InsufficientQuotes { found, required } => {
                write!(f, "insufficient quotes: found {found}, need {required}")
            }
            Self::InsufficientPages { found, required } => {
                write!(f, "insufficient distinct pages: found {found}, need {required}")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateResult {
    pub theme: String,
    pub passed: bool,
    pub reason: GateReason,
    pub quotes: usize,
    pub distinct_pages: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ParityReport {
    /// Every cited chunk appears in the top-K.
    pub subset_ok: bool,
    /// Cited chunk ids absent from the top-K, sorted.
    pub missing: BTreeSet<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Ok,
    NeedsRevision,
}

impl DocumentStatus {
    pub fn from_passed(passed: bool) -> Self {
        if passed { Self::Ok } else { Self::NeedsRevision }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => f.write_str("ok"),
            Self::NeedsRevision => f.write_str("needs_revision"),
        }
    }
}

/// Gate and parity outcome for one theme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeAudit {
    pub theme: String,
    pub gate: GateResult,
    pub parity: ParityReport,
}

impl ThemeAudit {
    pub fn passed(&self) -> bool {
        self.gate.passed && self.parity.subset_ok
    }
}

/// Per-document summary, recomputed on every validation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceAudit {
    pub doc_id: String,
    pub themes: Vec<ThemeAudit>,
    pub status: DocumentStatus,
}

impl EvidenceAudit {
    pub fn new(doc_id: impl Into<String>, themes: Vec<ThemeAudit>) -> Self {
        let status = DocumentStatus::from_passed(themes.iter().all(ThemeAudit::passed));
        Self {
            doc_id: doc_id.into(),
            themes,
            status,
        }
    }

    /// Themes that failed either check, in input order.
    pub fn failing_themes(&self) -> impl Iterator<Item = &str> {
        self.themes
            .iter()
            .filter(|t| !t.passed())
            .map(|t| t.theme.as_str())
    }
}

//! Minimum-evidence checks per theme.

use std::collections::BTreeSet;

use tracing::debug;

use crate::config::Config;

use super::types::{EvidenceRecord, GateReason, GateResult};

/// Checks that `evidence` has at least `min_quotes` records spread over at
/// least `min_pages` distinct pages. Records without a page count as quotes
/// only.
pub fn validate(
    theme: &str,
    evidence: &[EvidenceRecord],
    min_quotes: usize,
    min_pages: usize,
) -> GateResult {
    let quotes = evidence.len();
    let distinct_pages = evidence
        .iter()
        .filter_map(|e| e.page_num)
        .collect::<BTreeSet<u32>>()
        .len();

    let reason = if quotes < min_quotes {
        GateReason::InsufficientQuotes {
            found: quotes,
            required: min_quotes,
        }
    } else if distinct_pages < min_pages {
        GateReason::InsufficientPages {
            found: distinct_pages,
            required: min_pages,
        }
    } else {
        GateReason::Passed
    };
    let passed = reason == GateReason::Passed;

    debug!(theme, quotes, distinct_pages, passed, "Evidence gate evaluated");

    GateResult {
        theme: theme.to_string(),
        passed,
        reason,
        quotes,
        distinct_pages,
    }
}

/// Gate thresholds bound to a configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvidenceGate {
    pub min_quotes: usize,
    pub min_pages: usize,
}

impl Default for EvidenceGate {
    fn default() -> Self {
        Self {
            min_quotes: crate::constants::DEFAULT_MIN_QUOTES,
            min_pages: crate::constants::DEFAULT_MIN_PAGES,
        }
    }
}

impl EvidenceGate {
    pub fn from_config(config: &Config) -> Self {
        Self {
            min_quotes: config.min_quotes,
            min_pages: config.min_pages,
        }
    }

    pub fn validate(&self, theme: &str, evidence: &[EvidenceRecord]) -> GateResult {
        validate(theme, evidence, self.min_quotes, self.min_pages)
    }
}

//! Run-N-times certification.

use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::constants::DEFAULT_RUNS;

use super::diff::{DiffEntry, structural_diff};
use super::error::{BoxError, DeterminismError, DeterminismResult};
use super::stable::{stable_hash_value, strip_volatile, volatile_fields};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarnessState {
    Idle,
    /// Executing run `run_index` (0-based).
    Running { run_index: usize },
    Certified,
    Rejected,
}

/// Outcome of a certification attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeterminismReport {
    /// Stable hash of each run, in run order.
    pub hashes: Vec<String>,
    pub identical: bool,
    /// Runs compared by `diff` (the first run and the first that diverged).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub divergent_pair: Option<(usize, usize)>,
    /// Structural diff of the stripped outputs of `divergent_pair`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diff: Vec<DiffEntry>,
}

impl DeterminismReport {
    pub fn runs(&self) -> usize {
        self.hashes.len()
    }
}

/// Runs a closure `runs` times and certifies that every output hashes the same.
#[derive(Debug, Clone)]
pub struct DeterminismHarness {
    runs: usize,
    volatile: BTreeSet<String>,
    state: HarnessState,
}

impl Default for DeterminismHarness {
    fn default() -> Self {
        Self {
            runs: DEFAULT_RUNS,
            volatile: volatile_fields::<_, String>([]),
            state: HarnessState::Idle,
        }
    }
}

impl DeterminismHarness {
    pub fn new(runs: usize) -> DeterminismResult<Self> {
        if runs < 2 {
            return Err(DeterminismError::InvalidRunCount { runs });
        }
        Ok(Self {
            runs,
            ..Default::default()
        })
    }

    pub fn from_config(config: &Config) -> DeterminismResult<Self> {
        Self::new(config.runs)
    }

    /// Adds field names to strip in addition to the built-in volatile set.
    pub fn with_extra_volatile<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.volatile.extend(extra.into_iter().map(Into::into));
        self
    }

    pub fn runs(&self) -> usize {
        self.runs
    }

    pub fn state(&self) -> HarnessState {
        self.state
    }

    pub fn volatile_fields(&self) -> &BTreeSet<String> {
        &self.volatile
    }

    /// Executes `run` sequentially for run indices `0..runs`.
    ///
    /// Any run error aborts with [`DeterminismError::Run`] and leaves the
    /// harness `Rejected`. Otherwise the state ends `Certified` when all hashes
    /// match and `Rejected` (with a diff) when they do not.
    pub fn certify<T, E, F>(&mut self, mut run: F) -> DeterminismResult<DeterminismReport>
    where
        T: Serialize,
        E: Into<BoxError>,
        F: FnMut(usize) -> Result<T, E>,
    {
        if matches!(self.state, HarnessState::Running { .. }) {
            return Err(DeterminismError::AlreadyRunning);
        }

        let mut hashes = Vec::with_capacity(self.runs);
        let mut stripped: Vec<Value> = Vec::with_capacity(self.runs);

        for run_index in 0..self.runs {
            self.state = HarnessState::Running { run_index };
            debug!(run_index, runs = self.runs, "Determinism run started");

            let output = match run(run_index) {
                Ok(output) => output,
                Err(e) => {
                    self.state = HarnessState::Rejected;
                    return Err(DeterminismError::Run {
                        run_index,
                        source: e.into(),
                    });
                }
            };

            let (raw, hash) = match self.fingerprint(&output) {
                Ok(pair) => pair,
                Err(source) => {
                    self.state = HarnessState::Rejected;
                    return Err(DeterminismError::Serialize { run_index, source });
                }
            };

            debug!(run_index, hash = %hash, "Determinism run finished");
            hashes.push(hash);
            stripped.push(strip_volatile(&raw, &self.volatile));
        }

        let divergent = hashes.iter().position(|h| *h != hashes[0]);
        let report = match divergent {
            None => {
                self.state = HarnessState::Certified;
                info!(runs = self.runs, hash = %hashes[0], "Output certified deterministic");
                DeterminismReport {
                    hashes,
                    identical: true,
                    divergent_pair: None,
                    diff: Vec::new(),
                }
            }
            Some(j) => {
                self.state = HarnessState::Rejected;
                let diff = structural_diff(&stripped[0], &stripped[j]);
                warn!(
                    runs = self.runs,
                    divergent_run = j,
                    differences = diff.len(),
                    "Output rejected as non-deterministic"
                );
                DeterminismReport {
                    hashes,
                    identical: false,
                    divergent_pair: Some((0, j)),
                    diff,
                }
            }
        };
        Ok(report)
    }

    fn fingerprint<T: Serialize>(&self, output: &T) -> serde_json::Result<(Value, String)> {
        let raw = serde_json::to_value(output)?;
        let hash = stable_hash_value(&raw, &self.volatile)?;
        Ok((raw, hash))
    }
}

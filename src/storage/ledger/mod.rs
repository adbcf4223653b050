//! Append-only write ledger.
//!
//! Every fetch-mode cache write appends one JSON line. A replay run is proven
//! to have made zero live calls when the ledger holds no record whose mode is
//! `replay` and no record was appended during the run.


use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::warn;

use crate::cache::CacheMode;

use super::error::{LedgerError, LedgerResult};
use super::model::LedgerRecord;

/// Append-only JSON-lines log.
///
/// The file is opened lazily on first append, so a run that never writes
/// leaves no trace on disk.
pub struct Ledger {
    path: PathBuf,
    file: Mutex<Option<File>>,
}

impl std::fmt::Debug for Ledger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger").field("path", &self.path).finish()
    }
}

impl Ledger {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            file: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends `record` as one line and flushes it to disk.
    pub fn append(&self, record: &LedgerRecord) -> LedgerResult<()> {
        let mut line = serde_json::to_string(record).map_err(LedgerError::Encode)?;
        line.push('\n');

        let mut guard = self.file.lock();
        if guard.is_none() {
            if let Some(parent) = self.path.parent()
                && !parent.as_os_str().is_empty()
            {
                fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)?;
            *guard = Some(file);
        }

        if let Some(file) = guard.as_mut() {
            file.write_all(line.as_bytes())?;
            file.sync_data()?;
        }
        Ok(())
    }

    /// Reads every record currently on disk, in append order.
    pub fn records(&self) -> LedgerResult<Vec<LedgerRecord>> {
        read_records(&self.path)
    }

    /// Number of records currently on disk.
    pub fn len(&self) -> LedgerResult<usize> {
        Ok(self.records()?.len())
    }

    pub fn is_empty(&self) -> LedgerResult<bool> {
        Ok(self.len()? == 0)
    }
}

/// Reads a ledger file. A missing file is an empty ledger.
pub fn read_records(path: &Path) -> LedgerResult<Vec<LedgerRecord>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line).map_err(|source| LedgerError::Parse {
            line: idx + 1,
            source,
        })?;
        records.push(record);
    }
    Ok(records)
}

/// Result of scanning a ledger for live calls made in replay mode.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct LedgerAudit {
    pub total: usize,
    pub fetch_writes: usize,
    /// Records tagged `replay`; must be empty.
    pub replay_entries: Vec<LedgerRecord>,
}

impl LedgerAudit {
    /// `true` when no replay-mode write was ever recorded.
    pub fn is_clean(&self) -> bool {
        self.replay_entries.is_empty()
    }
}

/// Scans `records` for entries whose mode is `replay`.
///
/// The cache never writes in replay mode, so a clean audit is a consistency
/// check on the file. The stronger evidence is that a replay run leaves the
/// ledger length unchanged.
pub fn audit_replay(records: &[LedgerRecord]) -> LedgerAudit {
    let replay_entries: Vec<LedgerRecord> = records
        .iter()
        .filter(|r| r.mode == CacheMode::Replay)
        .cloned()
        .collect();

    if !replay_entries.is_empty() {
        warn!(
            count = replay_entries.len(),
            "Ledger contains replay-mode writes"
        );
    }

    LedgerAudit {
        total: records.len(),
        fetch_writes: records
            .iter()
            .filter(|r| r.mode == CacheMode::Fetch)
            .count(),
        replay_entries,
    }
}

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
/// Errors returned by the on-disk embedding store.
pub enum StoreError {
    /// IO error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Entry on disk does not match the key it was stored under.
    #[error("corrupt cache entry at {path}: {reason}")]
    Corrupt {
        /// Entry file path.
        path: PathBuf,
        /// What did not match.
        reason: String,
    },

    /// Storage root path is missing/unavailable.
    #[error("storage path unavailable: {path}")]
    StorageUnavailable {
        /// Path that was unavailable.
        path: PathBuf,
    },
}

/// Convenience result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Error, Debug)]
/// Errors returned by the write ledger.
pub enum LedgerError {
    #[error("ledger I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode ledger record: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("malformed ledger record at line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Convenience result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

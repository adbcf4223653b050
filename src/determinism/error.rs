use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum DeterminismError {
    #[error("invalid run count {runs}: at least 2 runs are needed to compare")]
    InvalidRunCount { runs: usize },

    /// A run failed; certification is abandoned.
    #[error("run {run_index} failed: {source}")]
    Run {
        run_index: usize,
        #[source]
        source: BoxError,
    },

    #[error("failed to serialize run {run_index} output: {source}")]
    Serialize {
        run_index: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("harness is already running")]
    AlreadyRunning,
}

pub type DeterminismResult<T> = Result<T, DeterminismError>;

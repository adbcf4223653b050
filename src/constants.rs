//! Cross-cutting, shared constants.
//!
//! Retrieval, gating and determinism defaults live here so that the config layer,
//! the pipeline and the tests agree on a single source of truth.

/// Default fusion weight for the lexical signal.
pub const DEFAULT_ALPHA: f64 = 0.6;

/// Default number of retrieval results per theme.
pub const DEFAULT_TOP_K: usize = 5;

/// Canonical number of determinism runs.
pub const DEFAULT_RUNS: usize = 3;

pub const DEFAULT_SEED: u64 = 42;

/// Logical clock value used when none is configured (RFC 3339).
pub const DEFAULT_FIXED_CLOCK: &str = "2025-01-01T00:00:00Z";

pub const DEFAULT_MIN_QUOTES: usize = 2;
pub const DEFAULT_MIN_PAGES: usize = 2;

pub const DEFAULT_EMBEDDING_DIM: usize = 1536;
pub const DEFAULT_MODEL_ID: &str = "text-embedding-3-small";

/// BM25 term-frequency saturation.
pub const BM25_K1: f64 = 1.2;
/// BM25 length normalization.
pub const BM25_B: f64 = 0.75;

/// Field names removed from run output before stable hashing.
pub const VOLATILE_FIELDS: &[&str] = &[
    "run_index",
    "generated_at",
    "correlation_id",
    "fetched_at",
    "timestamp",
];

/// Error returned when an embedding dimension does not match the configured one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DimValidationError {
    /// Embedding dimension cannot be zero.
    ZeroDimension,
    /// Runtime dimension does not match expected dimension.
    DimensionMismatch { expected: usize, actual: usize },
}

impl std::fmt::Display for DimValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroDimension => write!(f, "embedding dimension cannot be zero"),
            Self::DimensionMismatch { expected, actual } => {
                write!(
                    f,
                    "dimension mismatch: expected {}, got {}",
                    expected, actual
                )
            }
        }
    }
}

impl std::error::Error for DimValidationError {}

/// Validates that a runtime embedding dimension matches the expected dimension.
///
/// Use this where vectors enter the crate (provider responses, cache reads) so a
/// mismatched model never reaches cosine scoring.
///
/// # Example
///
/// ```
/// use verdant::constants::{validate_embedding_dim, DEFAULT_EMBEDDING_DIM};
///
/// validate_embedding_dim(1536, DEFAULT_EMBEDDING_DIM).unwrap();
/// assert!(validate_embedding_dim(768, DEFAULT_EMBEDDING_DIM).is_err());
/// ```
pub fn validate_embedding_dim(actual: usize, expected: usize) -> Result<(), DimValidationError> {
    if expected == 0 {
        return Err(DimValidationError::ZeroDimension);
    }
    if actual != expected {
        return Err(DimValidationError::DimensionMismatch { expected, actual });
    }
    Ok(())
}

//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Mode string is neither `fetch` nor `replay`.
    #[error("invalid mode '{value}': expected 'fetch' or 'replay'")]
    InvalidMode { value: String },

    /// Provider string is not a known provider kind.
    #[error("invalid provider '{value}': expected 'http' or 'stub'")]
    InvalidProvider { value: String },

    /// Integer variable could not be parsed.
    #[error("failed to parse {name}='{value}': {source}")]
    IntParseError {
        name: &'static str,
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    /// Float variable could not be parsed.
    #[error("failed to parse {name}='{value}': {source}")]
    FloatParseError {
        name: &'static str,
        value: String,
        #[source]
        source: std::num::ParseFloatError,
    },

    /// Fixed clock value is not RFC 3339.
    #[error("failed to parse fixed clock '{value}': {source}")]
    InvalidClock {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    /// Fusion weight outside `[0, 1]` (or NaN).
    #[error("invalid alpha {value}: must be within [0, 1]")]
    InvalidAlpha { value: f64 },

    /// `k` must be at least 1.
    #[error("invalid top-k {value}: must be >= 1")]
    InvalidTopK { value: usize },

    /// Determinism needs at least two runs to compare.
    #[error("invalid run count {value}: must be >= 2")]
    InvalidRunCount { value: usize },

    /// Embedding dimension cannot be zero.
    #[error("embedding dimension cannot be zero")]
    ZeroEmbeddingDim,

    /// A required environment variable was not set.
    #[error("missing required environment variable: {name}")]
    MissingEnvVar { name: &'static str },

    /// Path exists but is not a directory (when a directory was expected).
    #[error("path is not a directory: {path}")]
    NotADirectory { path: PathBuf },
}

use thiserror::Error;

/// Failure of the external embedding provider.
///
/// Surfaced to the caller as-is: the cache never retries, degrades, or stores a
/// partial batch when one of these is returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    #[error("embedding provider rejected credentials (status {status})")]
    Authentication { status: u16 },

    #[error("embedding provider rate limit exceeded")]
    RateLimited {
        /// Raw `Retry-After` header, if the provider sent one.
        retry_after: Option<String>,
    },

    #[error("embedding provider transport error: {reason}")]
    Transport { reason: String },

    #[error("embedding provider request timed out: {reason}")]
    Timeout { reason: String },

    #[error("embedding provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid embedding response: {reason}")]
    InvalidResponse { reason: String },

    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("embedding provider unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("invalid provider configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl ProviderError {
    /// Returns `true` for failures a caller may reasonably retry later.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ProviderError::RateLimited { .. }
                | ProviderError::Transport { .. }
                | ProviderError::Timeout { .. }
        )
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout {
                reason: err.to_string(),
            }
        } else if err.is_decode() {
            ProviderError::InvalidResponse {
                reason: err.to_string(),
            }
        } else {
            ProviderError::Transport {
                reason: err.to_string(),
            }
        }
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        ProviderError::InvalidResponse {
            reason: err.to_string(),
        }
    }
}

/// Convenience result type for provider calls.
pub type ProviderResult<T> = Result<T, ProviderError>;

use std::env;

use crate::config::ConfigError;

use super::error::{ProviderError, ProviderResult};

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_EMBEDDINGS_PATH: &str = "/embeddings";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Which [`EmbeddingProvider`](super::EmbeddingProvider) backs fetch mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// OpenAI-compatible HTTP endpoint.
    Http,
    /// Deterministic hash-seeded vectors (offline demos and tests).
    Stub,
}

impl ProviderKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "http" => Some(Self::Http),
            "stub" => Some(Self::Stub),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Stub => "stub",
        }
    }
}

#[derive(Debug, Clone)]
/// Connection settings for the embedding provider.
pub struct ProviderConfig {
    pub kind: ProviderKind,
    /// Base URL, e.g. `https://api.openai.com/v1`.
    pub api_base: String,
    /// Path appended to `api_base`.
    pub path: String,
    /// Bearer token. Required for [`ProviderKind::Http`] in fetch mode.
    pub api_key: Option<String>,
    /// Per-request timeout.
    pub timeout_ms: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::Http,
            api_base: DEFAULT_API_BASE.to_string(),
            path: DEFAULT_EMBEDDINGS_PATH.to_string(),
            api_key: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl ProviderConfig {
    pub const ENV_PROVIDER: &'static str = "VERDANT_PROVIDER";
    pub const ENV_API_BASE: &'static str = "VERDANT_API_BASE";
    pub const ENV_API_KEY: &'static str = "VERDANT_API_KEY";
    pub const ENV_TIMEOUT_MS: &'static str = "VERDANT_TIMEOUT_MS";

    /// Loads provider settings from `VERDANT_*` variables on top of defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let kind = match env::var(Self::ENV_PROVIDER) {
            Ok(value) => {
                ProviderKind::parse(&value).ok_or(ConfigError::InvalidProvider { value })?
            }
            Err(_) => defaults.kind,
        };

        let api_base = env::var(Self::ENV_API_BASE)
            .ok()
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.api_base);

        let api_key = env::var(Self::ENV_API_KEY)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        let timeout_ms = match env::var(Self::ENV_TIMEOUT_MS) {
            Ok(value) => value.parse().map_err(|e| ConfigError::IntParseError {
                name: Self::ENV_TIMEOUT_MS,
                value: value.clone(),
                source: e,
            })?,
            Err(_) => defaults.timeout_ms,
        };

        Ok(Self {
            kind,
            api_base,
            path: defaults.path,
            api_key,
            timeout_ms,
        })
    }

    /// Creates a stub-provider config (no credentials, no network).
    pub fn stub() -> Self {
        Self {
            kind: ProviderKind::Stub,
            ..Default::default()
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}{}", self.api_base, self.path)
    }

    /// Checks the settings needed to actually reach an HTTP provider.
    pub fn validate(&self) -> ProviderResult<()> {
        if self.kind == ProviderKind::Stub {
            return Ok(());
        }
        if self.api_key.is_none() {
            return Err(ProviderError::InvalidConfig {
                reason: format!("{} is required for the http provider", Self::ENV_API_KEY),
            });
        }
        if self.timeout_ms == 0 {
            return Err(ProviderError::InvalidConfig {
                reason: "timeout_ms must be > 0".to_string(),
            });
        }
        if !self.api_base.starts_with("http://") && !self.api_base.starts_with("https://") {
            return Err(ProviderError::InvalidConfig {
                reason: format!("api_base must be an http(s) URL, got '{}'", self.api_base),
            });
        }
        Ok(())
    }
}

//! Explicit run configuration.
//!
//! Every entry point takes a [`Config`]; nothing reads ambient flags on its own.
//! [`Config::from_env`] applies `VERDANT_*` overrides on top of defaults.

pub mod error;


pub use error::ConfigError;

use std::env;
use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::cache::{CacheMode, DEFAULT_HOT_CAPACITY};
use crate::clock::LogicalClock;
use crate::constants::{
    DEFAULT_ALPHA, DEFAULT_EMBEDDING_DIM, DEFAULT_FIXED_CLOCK, DEFAULT_MIN_PAGES,
    DEFAULT_MIN_QUOTES, DEFAULT_MODEL_ID, DEFAULT_RUNS, DEFAULT_SEED, DEFAULT_TOP_K,
};
use crate::embedding::{ProviderConfig, ProviderKind};

/// Run configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Fetch may call the provider; replay is cache-only. Default: `replay`.
    pub mode: CacheMode,

    /// Seed for every derived identifier. Default: `42`.
    pub seed: u64,

    /// Pinned logical time; `None` reads the system clock.
    pub fixed_clock: Option<DateTime<Utc>>,

    /// Lexical fusion weight in `[0, 1]`. Default: `0.6`.
    pub alpha: f64,

    /// Results per theme. Default: `5`.
    pub k: usize,

    /// Determinism runs. Default: `3`.
    pub runs: usize,

    /// Evidence gate: minimum quotes per theme. Default: `2`.
    pub min_quotes: usize,

    /// Evidence gate: minimum distinct pages per theme. Default: `2`.
    pub min_pages: usize,

    /// Embedding store directory. Default: `./.verdant/cache`.
    pub cache_dir: PathBuf,

    /// Write ledger path. Default: `./.verdant/ledger.jsonl`.
    pub ledger_path: PathBuf,

    /// Embedding model identifier.
    pub model_id: String,

    /// Expected embedding dimension. Default: `1536`.
    pub embedding_dim: usize,

    /// Max entries in the in-memory cache layer. Default: `10_000`.
    pub hot_capacity: u64,

    /// Embedding provider settings (fetch mode only).
    pub provider: ProviderConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: CacheMode::Replay,
            seed: DEFAULT_SEED,
            fixed_clock: DateTime::parse_from_rfc3339(DEFAULT_FIXED_CLOCK)
                .ok()
                .map(|t| t.with_timezone(&Utc)),
            alpha: DEFAULT_ALPHA,
            k: DEFAULT_TOP_K,
            runs: DEFAULT_RUNS,
            min_quotes: DEFAULT_MIN_QUOTES,
            min_pages: DEFAULT_MIN_PAGES,
            cache_dir: PathBuf::from("./.verdant/cache"),
            ledger_path: PathBuf::from("./.verdant/ledger.jsonl"),
            model_id: DEFAULT_MODEL_ID.to_string(),
            embedding_dim: DEFAULT_EMBEDDING_DIM,
            hot_capacity: DEFAULT_HOT_CAPACITY,
            provider: ProviderConfig::default(),
        }
    }
}

impl Config {
    const ENV_MODE: &'static str = "VERDANT_MODE";
    const ENV_SEED: &'static str = "VERDANT_SEED";
    const ENV_FIXED_CLOCK: &'static str = "VERDANT_FIXED_CLOCK";
    const ENV_ALPHA: &'static str = "VERDANT_ALPHA";
    const ENV_TOP_K: &'static str = "VERDANT_TOP_K";
    const ENV_RUNS: &'static str = "VERDANT_RUNS";
    const ENV_MIN_QUOTES: &'static str = "VERDANT_MIN_QUOTES";
    const ENV_MIN_PAGES: &'static str = "VERDANT_MIN_PAGES";
    const ENV_CACHE_DIR: &'static str = "VERDANT_CACHE_DIR";
    const ENV_LEDGER_PATH: &'static str = "VERDANT_LEDGER_PATH";
    const ENV_MODEL_ID: &'static str = "VERDANT_MODEL_ID";
    const ENV_EMBEDDING_DIM: &'static str = "VERDANT_EMBEDDING_DIM";
    const ENV_HOT_CAPACITY: &'static str = "VERDANT_HOT_CAPACITY";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let mode = match env::var(Self::ENV_MODE) {
            Ok(value) => CacheMode::parse(&value).ok_or(ConfigError::InvalidMode { value })?,
            Err(_) => defaults.mode,
        };
        let seed = Self::parse_u64_from_env(Self::ENV_SEED, defaults.seed)?;
        let fixed_clock = Self::parse_clock_from_env(defaults.fixed_clock)?;
        let alpha = Self::parse_f64_from_env(Self::ENV_ALPHA, defaults.alpha)?;
        let k = Self::parse_usize_from_env(Self::ENV_TOP_K, defaults.k)?;
        let runs = Self::parse_usize_from_env(Self::ENV_RUNS, defaults.runs)?;
        let min_quotes = Self::parse_usize_from_env(Self::ENV_MIN_QUOTES, defaults.min_quotes)?;
        let min_pages = Self::parse_usize_from_env(Self::ENV_MIN_PAGES, defaults.min_pages)?;
        let cache_dir = Self::parse_path_from_env(Self::ENV_CACHE_DIR, defaults.cache_dir);
        let ledger_path = Self::parse_path_from_env(Self::ENV_LEDGER_PATH, defaults.ledger_path);
        let model_id = Self::parse_string_from_env(Self::ENV_MODEL_ID, defaults.model_id);
        let embedding_dim =
            Self::parse_usize_from_env(Self::ENV_EMBEDDING_DIM, defaults.embedding_dim)?;
        let hot_capacity = Self::parse_u64_from_env(Self::ENV_HOT_CAPACITY, defaults.hot_capacity)?;
        let provider = ProviderConfig::from_env()?;

        Ok(Self {
            mode,
            seed,
            fixed_clock,
            alpha,
            k,
            runs,
            min_quotes,
            min_pages,
            cache_dir,
            ledger_path,
            model_id,
            embedding_dim,
            hot_capacity,
            provider,
        })
    }

    /// Validates value ranges and paths (does not create directories).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.alpha) {
            return Err(ConfigError::InvalidAlpha { value: self.alpha });
        }
        if self.k == 0 {
            return Err(ConfigError::InvalidTopK { value: self.k });
        }
        if self.runs < 2 {
            return Err(ConfigError::InvalidRunCount { value: self.runs });
        }
        if self.embedding_dim == 0 {
            return Err(ConfigError::ZeroEmbeddingDim);
        }
        if self.cache_dir.exists() && !self.cache_dir.is_dir() {
            return Err(ConfigError::NotADirectory {
                path: self.cache_dir.clone(),
            });
        }
        if self.mode == CacheMode::Fetch
            && self.provider.kind == ProviderKind::Http
            && self.provider.api_key.is_none()
        {
            return Err(ConfigError::MissingEnvVar {
                name: ProviderConfig::ENV_API_KEY,
            });
        }
        Ok(())
    }

    /// The clock every timestamp in a run is read from.
    pub fn clock(&self) -> LogicalClock {
        match self.fixed_clock {
            Some(at) => LogicalClock::Fixed(at),
            None => LogicalClock::System,
        }
    }

    /// Same config in a different mode.
    pub fn with_mode(mut self, mode: CacheMode) -> Self {
        self.mode = mode;
        self
    }

    /// Same config with the store and ledger under `dir`.
    pub fn with_cache_root(mut self, dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        self.cache_dir = dir.join("cache");
        self.ledger_path = dir.join("ledger.jsonl");
        self
    }

    fn parse_clock_from_env(
        default: Option<DateTime<Utc>>,
    ) -> Result<Option<DateTime<Utc>>, ConfigError> {
        match env::var(Self::ENV_FIXED_CLOCK) {
            Ok(value) if value.trim().eq_ignore_ascii_case("system") => Ok(None),
            Ok(value) => DateTime::parse_from_rfc3339(value.trim())
                .map(|t| Some(t.with_timezone(&Utc)))
                .map_err(|e| ConfigError::InvalidClock { value, source: e }),
            Err(_) => Ok(default),
        }
    }

    fn parse_path_from_env(var_name: &str, default: PathBuf) -> PathBuf {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or(default)
    }

    fn parse_string_from_env(var_name: &str, default: String) -> String {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(default)
    }

    fn parse_u64_from_env(var_name: &'static str, default: u64) -> Result<u64, ConfigError> {
        match env::var(var_name) {
            Ok(value) => value
                .trim()
                .parse()
                .map_err(|e| ConfigError::IntParseError {
                    name: var_name,
                    value: value.clone(),
                    source: e,
                }),
            Err(_) => Ok(default),
        }
    }

    fn parse_usize_from_env(var_name: &'static str, default: usize) -> Result<usize, ConfigError> {
        match env::var(var_name) {
            Ok(value) => value
                .trim()
                .parse()
                .map_err(|e| ConfigError::IntParseError {
                    name: var_name,
                    value: value.clone(),
                    source: e,
                }),
            Err(_) => Ok(default),
        }
    }

    fn parse_f64_from_env(var_name: &'static str, default: f64) -> Result<f64, ConfigError> {
        match env::var(var_name) {
            Ok(value) => value
                .trim()
                .parse()
                .map_err(|e| ConfigError::FloatParseError {
                    name: var_name,
                    value: value.clone(),
                    source: e,
                }),
            Err(_) => Ok(default),
        }
    }
}

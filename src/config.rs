use crate::error::{Error, Result};
use std::env;

pub const DEFAULT_TOKEN_BUDGET: usize = 100_000;
pub const DEFAULT_CHARS_PER_TOKEN: f64 = 4.0;
pub const DEFAULT_SUB_CHUNK_DIVISOR: usize = 3;
/// Only one fallback attempt is made after an overflow. Raising this makes the
/// orchestrator walk further down the chunk list on repeated overflows.
pub const DEFAULT_FALLBACK_DEPTH: usize = 1;
pub const DEFAULT_REMAINING_REVIEW_LIMIT: usize = 3;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub model: Option<String>,
    pub request_timeout_secs: u64,
    pub chunking: ChunkingConfig,
    pub orchestrator: OrchestratorConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let anthropic_api_key = env::var("ANTHROPIC_API_KEY")
            .map_err(|_| Error::Config("ANTHROPIC_API_KEY environment variable not set".to_string()))?;

        let model = env::var("DIFFCHUNK_MODEL").ok().filter(|m| !m.trim().is_empty());

        let request_timeout_secs =
            parse_env("DIFFCHUNK_REQUEST_TIMEOUT_SECS").unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);

        let chunking = ChunkingConfig::from_env()?;
        let orchestrator = OrchestratorConfig::from_env();

        Ok(Self {
            anthropic_api_key,
            model,
            request_timeout_secs,
            chunking,
            orchestrator,
        })
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

/// Size limits shared by every chunking component.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChunkingConfig {
    pub token_budget: usize,
    pub chars_per_token: f64,
    pub sub_chunk_divisor: usize,
}

impl ChunkingConfig {
    pub fn new(token_budget: usize, chars_per_token: f64, sub_chunk_divisor: usize) -> Result<Self> {
        if token_budget == 0 {
            return Err(Error::Config("token budget must be greater than zero".to_string()));
        }
        if !chars_per_token.is_finite() || chars_per_token <= 0.0 {
            return Err(Error::Config(format!(
                "chars per token must be a positive number, got {}",
                chars_per_token
            )));
        }
        if sub_chunk_divisor == 0 {
            return Err(Error::Config("sub-chunk divisor must be at least 1".to_string()));
        }

        Ok(Self {
            token_budget,
            chars_per_token,
            sub_chunk_divisor,
        })
    }

    /// Read overrides from `DIFFCHUNK_*` variables; unset or unparseable
    /// values keep their defaults.
    pub fn from_env() -> Result<Self> {
        Self::new(
            parse_env("DIFFCHUNK_TOKEN_BUDGET").unwrap_or(DEFAULT_TOKEN_BUDGET),
            parse_env("DIFFCHUNK_CHARS_PER_TOKEN").unwrap_or(DEFAULT_CHARS_PER_TOKEN),
            parse_env("DIFFCHUNK_SUB_CHUNK_DIVISOR").unwrap_or(DEFAULT_SUB_CHUNK_DIVISOR),
        )
    }

    pub fn with_token_budget(self, token_budget: usize) -> Result<Self> {
        Self::new(token_budget, self.chars_per_token, self.sub_chunk_divisor)
    }

    pub fn sub_chunk_budget(&self) -> usize {
        (self.token_budget / self.sub_chunk_divisor).max(1)
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            token_budget: DEFAULT_TOKEN_BUDGET,
            chars_per_token: DEFAULT_CHARS_PER_TOKEN,
            sub_chunk_divisor: DEFAULT_SUB_CHUNK_DIVISOR,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorConfig {
    pub fallback_depth: usize,
    pub remaining_review_limit: usize,
}

impl OrchestratorConfig {
    pub fn from_env() -> Self {
        Self {
            fallback_depth: parse_env("DIFFCHUNK_FALLBACK_DEPTH").unwrap_or(DEFAULT_FALLBACK_DEPTH),
            remaining_review_limit: parse_env("DIFFCHUNK_REMAINING_LIMIT")
                .unwrap_or(DEFAULT_REMAINING_REVIEW_LIMIT),
        }
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            fallback_depth: DEFAULT_FALLBACK_DEPTH,
            remaining_review_limit: DEFAULT_REMAINING_REVIEW_LIMIT,
        }
    }
}

impl From<&Config> for OrchestratorConfig {
    fn from(config: &Config) -> Self {
        config.orchestrator
    }
}

use crate::config::ChunkingConfig;

/// Approximates model-token cost from character length.
#[derive(Debug, Clone, Copy)]
pub struct SizeEstimator {
    config: ChunkingConfig,
}

impl SizeEstimator {
    pub fn new(config: ChunkingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    pub fn estimate_tokens(&self, text: &str) -> usize {
        self.tokens_for_chars(text.chars().count())
    }

    pub fn tokens_for_chars(&self, chars: usize) -> usize {
        (chars as f64 / self.config.chars_per_token).ceil() as usize
    }

    /// Whether `text` fits the full token budget.
    pub fn fits(&self, text: &str) -> bool {
        self.fits_within(text, self.config.token_budget)
    }

    pub fn fits_sub_budget(&self, text: &str) -> bool {
        self.fits_within(text, self.config.sub_chunk_budget())
    }

    pub fn fits_within(&self, text: &str, tokens: usize) -> bool {
        self.estimate_tokens(text) <= tokens
    }

    /// Largest character count whose estimate stays within `tokens`.
    pub fn char_capacity(&self, tokens: usize) -> usize {
        (tokens as f64 * self.config.chars_per_token).floor() as usize
    }
}

use async_trait::async_trait;
use thiserror::Error;

/// Failure of a single generation request, classified at the provider boundary.
#[derive(Error, Debug)]
pub enum GenerationError {
    /// The prompt exceeded the model's context window.
    #[error("input too large for the model: {0}")]
    Overflow(String),

    #[error("{0}")]
    Transport(String),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl GenerationError {
    pub fn is_overflow(&self) -> bool {
        matches!(self, GenerationError::Overflow(_))
    }
}

pub type GenerationResult<T> = std::result::Result<T, GenerationError>;

#[async_trait]
pub trait LLMProvider: Send + Sync {
    async fn generate(
        &self,
        system_role: &str,
        user_content: &str,
        max_output_tokens: u32,
    ) -> GenerationResult<String>;

    fn name(&self) -> &str;
}

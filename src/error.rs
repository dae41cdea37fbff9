use thiserror::Error;

use crate::llm::GenerationError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("No diff content to analyze")]
    EmptyInput,

    #[error("Chunk '{label}' is too large for the model and no smaller chunk is available: {message}")]
    ContextOverflow { label: String, message: String },

    #[error(
        "Even the reduced input could not be analyzed ('{original_label}' overflowed, fallback '{fallback_label}' failed: {source}). Narrow the scope of the diff and try again"
    )]
    FallbackExhausted {
        original_label: String,
        fallback_label: String,
        #[source]
        source: GenerationError,
    },

    #[error("LLM request failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("Git error: {0}")]
    Git(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Empty input is a no-op for callers, not a failure worth reporting loudly.
    pub fn is_empty_input(&self) -> bool {
        matches!(self, Error::EmptyInput)
    }

    pub fn is_overflow(&self) -> bool {
        match self {
            Error::ContextOverflow { .. } | Error::FallbackExhausted { .. } => true,
            Error::Generation(e) => e.is_overflow(),
            _ => false,
        }
    }
}

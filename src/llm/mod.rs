pub mod provider;
pub mod claude;
pub mod prompts;

pub use provider::{GenerationError, GenerationResult, LLMProvider};
pub use claude::ClaudeProvider;
pub use prompts::GenerationTask;

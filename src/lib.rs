pub mod config;
pub mod error;
pub mod models;
pub mod chunking;
pub mod git;
pub mod llm;
pub mod analysis;

pub use config::{ChunkingConfig, Config, OrchestratorConfig};
pub use error::{Error, Result};
pub use chunking::DiffChunker;
pub use git::GitClient;
pub use llm::{ClaudeProvider, GenerationError, GenerationTask, LLMProvider};
pub use analysis::{ContinuationPolicy, RequestOrchestrator};

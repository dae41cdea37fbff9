pub mod orchestrator;

pub use orchestrator::{ContinuationPolicy, OrchestrationState, RequestOrchestrator};

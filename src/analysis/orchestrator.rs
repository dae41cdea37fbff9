use std::sync::Arc;

use crate::config::OrchestratorConfig;
use crate::error::{Error, Result};
use crate::llm::{GenerationError, GenerationResult, GenerationTask, LLMProvider};
use crate::models::{Chunk, ChunkReview, ChunkSource, OrchestratedResult, PreviewResult};

/// Stages of a single orchestrated request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestrationState {
    Idle,
    AwaitingPrimary,
    Retrying,
    AwaitingFallback,
    Success,
    ExhaustedFallback,
}

impl std::fmt::Display for OrchestrationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            OrchestrationState::Idle => "idle",
            OrchestrationState::AwaitingPrimary => "awaiting-primary",
            OrchestrationState::Retrying => "retrying",
            OrchestrationState::AwaitingFallback => "awaiting-fallback",
            OrchestrationState::Success => "success",
            OrchestrationState::ExhaustedFallback => "exhausted-fallback",
        };
        write!(f, "{}", name)
    }
}

/// What to do when one chunk fails during a remaining-chunks walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContinuationPolicy {
    #[default]
    ContinueOnError,
    StopOnError,
}

/// Drives LLM requests over an ordered chunk list, falling back to smaller
/// chunks when the model reports an overflow.
pub struct RequestOrchestrator {
    llm: Arc<dyn LLMProvider>,
    config: OrchestratorConfig,
}

impl RequestOrchestrator {
    pub fn new(llm: impl LLMProvider + 'static, config: OrchestratorConfig) -> Self {
        Self::with_shared(Arc::new(llm), config)
    }

    pub fn with_shared(llm: Arc<dyn LLMProvider>, config: OrchestratorConfig) -> Self {
        Self { llm, config }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Analyze the top chunk. On overflow, retry with the following chunks up
    /// to `fallback_depth` times; any other failure is returned unchanged.
    pub async fn run(&self, task: GenerationTask, chunks: &[Chunk]) -> Result<OrchestratedResult> {
        let Some(primary) = chunks.first() else {
            tracing::debug!("No chunks to analyze, skipping {}", task);
            return Err(Error::EmptyInput);
        };

        transition(OrchestrationState::Idle, OrchestrationState::AwaitingPrimary, &primary.label);
        let overflow = match self.analyze_chunk(task, primary).await {
            Ok(text) => {
                transition(OrchestrationState::AwaitingPrimary, OrchestrationState::Success, &primary.label);
                return Ok(OrchestratedResult::new(text, primary, 0, chunks.len(), ChunkSource::Primary));
            }
            Err(GenerationError::Overflow(message)) => message,
            Err(other) => {
                tracing::warn!("Request for '{}' failed: {}", primary.label, other);
                return Err(other.into());
            }
        };

        let end = chunks.len().min(self.config.fallback_depth.saturating_add(1));
        let Some((last, earlier)) = chunks[1..end].split_last() else {
            tracing::warn!("'{}' overflowed and no smaller chunk is available", primary.label);
            return Err(Error::ContextOverflow {
                label: primary.label.clone(),
                message: overflow,
            });
        };

        tracing::warn!(
            "'{}' ({} priority) is too large for the model, falling back to the next chunk",
            primary.label,
            primary.priority
        );

        let fallback_result = |index: usize, chunk: &Chunk, text: String| {
            transition(OrchestrationState::AwaitingFallback, OrchestrationState::Success, &chunk.label);
            OrchestratedResult::new(
                text,
                chunk,
                index,
                chunks.len(),
                ChunkSource::Fallback {
                    original_label: primary.label.clone(),
                    original_priority: primary.priority,
                },
            )
        };

        for (offset, chunk) in earlier.iter().enumerate() {
            let index = offset + 1;
            transition(OrchestrationState::Retrying, OrchestrationState::AwaitingFallback, &chunk.label);
            match self.analyze_chunk(task, chunk).await {
                Ok(text) => return Ok(fallback_result(index, chunk, text)),
                Err(e) if e.is_overflow() => {
                    tracing::warn!("Fallback '{}' also overflowed, trying the next chunk", chunk.label);
                }
                Err(e) => return Err(self.exhausted(primary, chunk, e)),
            }
        }

        let index = earlier.len() + 1;
        transition(OrchestrationState::Retrying, OrchestrationState::AwaitingFallback, &last.label);
        match self.analyze_chunk(task, last).await {
            Ok(text) => Ok(fallback_result(index, last, text)),
            Err(e) => Err(self.exhausted(primary, last, e)),
        }
    }

    /// Run `task` and a review pass over the primary chunk concurrently.
    /// Both requests complete before either failure is reported.
    pub async fn preview(&self, task: GenerationTask, chunks: &[Chunk]) -> Result<PreviewResult> {
        let Some(primary) = chunks.first() else {
            return Err(Error::EmptyInput);
        };

        tracing::info!("Previewing {} and code review for '{}'", task, primary.label);
        let (content, review) = futures::join!(
            self.analyze_chunk(task, primary),
            self.analyze_chunk(GenerationTask::CodeReview, primary)
        );

        let content = content?;
        let review = review?;

        Ok(PreviewResult {
            content: OrchestratedResult::new(content, primary, 0, chunks.len(), ChunkSource::Primary),
            review: OrchestratedResult::new(review, primary, 0, chunks.len(), ChunkSource::Primary),
        })
    }

    /// Analyze chunks after the one that produced `analyzed`, at most
    /// `remaining_review_limit` of them. Each chunk's failure is recorded
    /// without aborting the walk unless `policy` says otherwise.
    pub async fn review_remaining(
        &self,
        task: GenerationTask,
        chunks: &[Chunk],
        analyzed: &OrchestratedResult,
        policy: ContinuationPolicy,
    ) -> Vec<ChunkReview> {
        let remaining = chunks
            .iter()
            .skip(analyzed.chunk_index + 1)
            .take(self.config.remaining_review_limit);

        let mut reviews = Vec::new();
        for chunk in remaining {
            let outcome = self.analyze_chunk(task, chunk).await;
            let failed = outcome.is_err();
            if let Err(e) = &outcome {
                tracing::warn!("Analysis of '{}' failed: {}", chunk.label, e);
            }

            reviews.push(ChunkReview {
                label: chunk.label.clone(),
                priority: chunk.priority,
                outcome,
            });

            if failed && policy == ContinuationPolicy::StopOnError {
                tracing::info!("Stopping remaining-chunk review after failure");
                break;
            }
        }

        reviews
    }

    /// Single request for one explicitly chosen chunk. No fallback.
    pub async fn analyze_chunk(&self, task: GenerationTask, chunk: &Chunk) -> GenerationResult<String> {
        tracing::debug!(
            "Requesting {} from {} for '{}' ({} chars)",
            task,
            self.llm.name(),
            chunk.label,
            chunk.content.len()
        );
        self.llm
            .generate(task.system_prompt(), &task.to_prompt(chunk), task.max_output_tokens())
            .await
    }

    fn exhausted(&self, primary: &Chunk, fallback: &Chunk, source: GenerationError) -> Error {
        transition(
            OrchestrationState::AwaitingFallback,
            OrchestrationState::ExhaustedFallback,
            &fallback.label,
        );
        Error::FallbackExhausted {
            original_label: primary.label.clone(),
            fallback_label: fallback.label.clone(),
            source,
        }
    }
}

fn transition(from: OrchestrationState, to: OrchestrationState, label: &str) {
    tracing::debug!("Orchestrator {} -> {} ('{}')", from, to, label);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PriorityTier;
    use async_trait::async_trait;
    use std::sync::Mutex;

    type Responder = Box<dyn Fn(&str, &str) -> GenerationResult<String> + Send + Sync>;

    /// Replies through a closure and records every user prompt it receives.
    struct ScriptedProvider {
        respond: Responder,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl ScriptedProvider {
        fn new(
            respond: impl Fn(&str, &str) -> GenerationResult<String> + Send + Sync + 'static,
        ) -> (Self, Arc<Mutex<Vec<String>>>) {
            let calls = Arc::new(Mutex::new(Vec::new()));
            (
                Self {
                    respond: Box::new(respond),
                    calls: calls.clone(),
                },
                calls,
            )
        }
    }

    #[async_trait]
    impl LLMProvider for ScriptedProvider {
        async fn generate(
            &self,
            system_role: &str,
            user_content: &str,
            _max_output_tokens: u32,
        ) -> GenerationResult<String> {
            self.calls.lock().unwrap().push(user_content.to_string());
            (self.respond)(system_role, user_content)
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn chunk(label: &str, priority: PriorityTier) -> Chunk {
        Chunk {
            label: label.to_string(),
            path: label.to_string(),
            part: None,
            ordinal: 0,
            content: format!("+changes in {}\n", label),
            priority,
        }
    }

    fn chunks() -> Vec<Chunk> {
        vec![
            chunk("src/App.cs", PriorityTier::High),
            chunk("src/Util.cs", PriorityTier::High),
            chunk("App.csproj", PriorityTier::Medium),
            chunk("README.md", PriorityTier::Low),
        ]
    }

    fn overflow_on(label: &'static str) -> impl Fn(&str, &str) -> GenerationResult<String> {
        move |_, prompt| {
            if prompt.contains(&format!("({})", label)) {
                Err(GenerationError::Overflow("prompt is too long".to_string()))
            } else {
                Ok("ok".to_string())
            }
        }
    }

    fn orchestrator(provider: ScriptedProvider) -> RequestOrchestrator {
        RequestOrchestrator::new(provider, OrchestratorConfig::default())
    }

    #[tokio::test]
    async fn test_empty_chunks_issue_no_request() {
        let (provider, calls) = ScriptedProvider::new(|_, _| Ok("unused".to_string()));
        let err = orchestrator(provider)
            .run(GenerationTask::CommitMessage, &[])
            .await
            .unwrap_err();

        assert!(err.is_empty_input());
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_primary_success() {
        let (provider, calls) = ScriptedProvider::new(|_, _| Ok("Add login flow".to_string()));
        let result = orchestrator(provider)
            .run(GenerationTask::CommitMessage, &chunks())
            .await
            .unwrap();

        assert_eq!(result.text, "Add login flow");
        assert_eq!(result.chunk_label, "src/App.cs");
        assert_eq!(result.chunk_index, 0);
        assert_eq!(result.remaining_chunks, 3);
        assert_eq!(result.source, ChunkSource::Primary);
        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_overflow_falls_back_once_to_second_chunk() {
        let (provider, calls) = ScriptedProvider::new(overflow_on("src/App.cs"));
        let result = orchestrator(provider)
            .run(GenerationTask::CommitMessage, &chunks())
            .await
            .unwrap();

        assert!(result.is_fallback());
        assert_eq!(result.chunk_label, "src/Util.cs");
        assert_eq!(result.chunk_index, 1);
        assert_eq!(
            result.source,
            ChunkSource::Fallback {
                original_label: "src/App.cs".to_string(),
                original_priority: PriorityTier::High,
            }
        );
        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert!(calls[1].contains("+changes in src/Util.cs"));
    }

    #[tokio::test]
    async fn test_overflow_with_single_chunk_is_terminal() {
        let (provider, calls) = ScriptedProvider::new(overflow_on("src/App.cs"));
        let err = orchestrator(provider)
            .run(GenerationTask::CommitMessage, &chunks()[..1])
            .await
            .unwrap_err();

        assert!(matches!(err, Error::ContextOverflow { ref label, .. } if label == "src/App.cs"));
        assert!(err.is_overflow());
        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_fallback_failure_is_exhausted_without_more_retries() {
        let (provider, calls) = ScriptedProvider::new(|_, _| {
            Err(GenerationError::Overflow("context length exceeded".to_string()))
        });
        let err = orchestrator(provider)
            .run(GenerationTask::CodeReview, &chunks())
            .await
            .unwrap_err();

        match err {
            Error::FallbackExhausted {
                original_label,
                fallback_label,
                source,
            } => {
                assert_eq!(original_label, "src/App.cs");
                assert_eq!(fallback_label, "src/Util.cs");
                assert!(source.is_overflow());
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_fallback_transport_failure_is_exhausted() {
        let (provider, _) = ScriptedProvider::new(|_, prompt| {
            if prompt.contains("(src/App.cs)") {
                Err(GenerationError::Overflow("too many tokens".to_string()))
            } else {
                Err(GenerationError::Transport("timed out".to_string()))
            }
        });
        let err = orchestrator(provider)
            .run(GenerationTask::CommitMessage, &chunks())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::FallbackExhausted { .. }));
        assert!(err.to_string().contains("Even the reduced input could not be analyzed"));
    }

    #[tokio::test]
    async fn test_transport_error_is_not_retried() {
        let (provider, calls) =
            ScriptedProvider::new(|_, _| Err(GenerationError::Transport("503 overloaded".to_string())));
        let err = orchestrator(provider)
            .run(GenerationTask::CommitMessage, &chunks())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Generation(GenerationError::Transport(_))));
        assert!(!err.is_overflow());
        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_deeper_fallback_walks_past_overflows() {
        let (provider, calls) = ScriptedProvider::new(|_, prompt| {
            if prompt.contains("(App.csproj)") {
                Ok("third".to_string())
            } else {
                Err(GenerationError::Overflow("too long".to_string()))
            }
        });
        let config = OrchestratorConfig {
            fallback_depth: 2,
            ..OrchestratorConfig::default()
        };
        let result = RequestOrchestrator::new(provider, config)
            .run(GenerationTask::CommitMessage, &chunks())
            .await
            .unwrap();

        assert_eq!(result.chunk_label, "App.csproj");
        assert_eq!(result.chunk_index, 2);
        assert_eq!(calls.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_zero_fallback_depth_never_retries() {
        let (provider, calls) = ScriptedProvider::new(overflow_on("src/App.cs"));
        let config = OrchestratorConfig {
            fallback_depth: 0,
            ..OrchestratorConfig::default()
        };
        let err = RequestOrchestrator::new(provider, config)
            .run(GenerationTask::CommitMessage, &chunks())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::ContextOverflow { .. }));
        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_preview_runs_both_requests() {
        let (provider, calls) = ScriptedProvider::new(|system, _| {
            if system == GenerationTask::CodeReview.system_prompt() {
                Ok("looks fine".to_string())
            } else {
                Ok("Add feature".to_string())
            }
        });
        let preview = orchestrator(provider)
            .preview(GenerationTask::CommitMessage, &chunks())
            .await
            .unwrap();

        assert_eq!(preview.content.text, "Add feature");
        assert_eq!(preview.review.text, "looks fine");
        assert_eq!(preview.content.chunk_label, "src/App.cs");
        assert_eq!(preview.review.chunk_label, "src/App.cs");
        assert_eq!(calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_preview_surfaces_failure_after_join() {
        let (provider, calls) = ScriptedProvider::new(|system, _| {
            if system == GenerationTask::CodeReview.system_prompt() {
                Err(GenerationError::Transport("boom".to_string()))
            } else {
                Ok("Add feature".to_string())
            }
        });
        let err = orchestrator(provider)
            .preview(GenerationTask::CommitMessage, &chunks())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("boom"));
        assert_eq!(calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_review_remaining_isolates_failures() {
        let (provider, _) = ScriptedProvider::new(|_, prompt| {
            if prompt.contains("(App.csproj)") {
                Err(GenerationError::Transport("timeout".to_string()))
            } else {
                Ok("reviewed".to_string())
            }
        });
        let orch = orchestrator(provider);
        let chunks = chunks();
        let primary = orch.run(GenerationTask::CodeReview, &chunks).await.unwrap();
        let reviews = orch
            .review_remaining(
                GenerationTask::CodeReview,
                &chunks,
                &primary,
                ContinuationPolicy::ContinueOnError,
            )
            .await;

        let labels: Vec<_> = reviews.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["src/Util.cs", "App.csproj", "README.md"]);
        assert!(reviews[0].is_success());
        assert!(!reviews[1].is_success());
        assert!(reviews[2].is_success());
    }

    #[tokio::test]
    async fn test_review_remaining_stops_on_error_when_asked() {
        let (provider, _) = ScriptedProvider::new(|_, prompt| {
            if prompt.contains("(src/Util.cs)") {
                Err(GenerationError::Transport("timeout".to_string()))
            } else {
                Ok("reviewed".to_string())
            }
        });
        let orch = orchestrator(provider);
        let chunks = chunks();
        let primary = orch.run(GenerationTask::CodeReview, &chunks).await.unwrap();
        let reviews = orch
            .review_remaining(GenerationTask::CodeReview, &chunks, &primary, ContinuationPolicy::StopOnError)
            .await;

        assert_eq!(reviews.len(), 1);
        assert!(!reviews[0].is_success());
    }

    #[tokio::test]
    async fn test_review_remaining_respects_limit_and_skips_fallback_prefix() {
        let mut many: Vec<Chunk> = (0..8)
            .map(|i| chunk(&format!("src/f{}.rs", i), PriorityTier::High))
            .collect();
        many[0].label = "big.rs".to_string();
        let (provider, _) = ScriptedProvider::new(overflow_on("big.rs"));
        let orch = orchestrator(provider);

        let result = orch.run(GenerationTask::CodeReview, &many).await.unwrap();
        assert_eq!(result.chunk_index, 1);

        let reviews = orch
            .review_remaining(
                GenerationTask::CodeReview,
                &many,
                &result,
                ContinuationPolicy::ContinueOnError,
            )
            .await;
        let labels: Vec<_> = reviews.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["src/f2.rs", "src/f3.rs", "src/f4.rs"]);
    }
}

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::llm::GenerationError;
use crate::models::chunk::{Chunk, PriorityTier};

/// Which chunk produced a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChunkSource {
    Primary,
    /// The primary chunk overflowed; these identify the chunk that was skipped.
    Fallback {
        original_label: String,
        original_priority: PriorityTier,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct OrchestratedResult {
    pub text: String,
    pub chunk_label: String,
    pub chunk_priority: PriorityTier,
    /// Position of the analyzed chunk in the ordered chunk list.
    pub chunk_index: usize,
    /// Chunks that were not analyzed by this request.
    pub remaining_chunks: usize,
    pub source: ChunkSource,
    pub generated_at: DateTime<Utc>,
}

impl OrchestratedResult {
    pub fn new(
        text: String,
        chunk: &Chunk,
        chunk_index: usize,
        total_chunks: usize,
        source: ChunkSource,
    ) -> Self {
        Self {
            text,
            chunk_label: chunk.label.clone(),
            chunk_priority: chunk.priority,
            chunk_index,
            remaining_chunks: total_chunks.saturating_sub(1),
            source,
            generated_at: Utc::now(),
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self.source, ChunkSource::Fallback { .. })
    }
}

/// Content generation and review over the same primary chunk.
#[derive(Debug, Clone, Serialize)]
pub struct PreviewResult {
    pub content: OrchestratedResult,
    pub review: OrchestratedResult,
}

/// Outcome of analyzing one chunk during a remaining-chunks walk.
#[derive(Debug)]
pub struct ChunkReview {
    pub label: String,
    pub priority: PriorityTier,
    pub outcome: std::result::Result<String, GenerationError>,
}

impl ChunkReview {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Serializable view of a [`ChunkReview`] for JSON output.
#[derive(Debug, Serialize)]
pub struct ChunkReviewReport {
    pub label: String,
    pub priority: PriorityTier,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&ChunkReview> for ChunkReviewReport {
    fn from(review: &ChunkReview) -> Self {
        let (text, error) = match &review.outcome {
            Ok(text) => (Some(text.clone()), None),
            Err(e) => (None, Some(e.to_string())),
        };
        Self {
            label: review.label.clone(),
            priority: review.priority,
            text,
            error,
        }
    }
}

//! Diff partitioning and prioritization.
//!
//! A diff that fits the token budget becomes a single full-diff chunk. Anything
//! larger is split per file, oversized files are split again into parts, and
//! the resulting chunks are ordered by priority.

pub mod classifier;
pub mod estimator;
pub mod orderer;
pub mod partitioner;
pub mod subchunker;

pub use classifier::PriorityClassifier;
pub use estimator::SizeEstimator;
pub use orderer::ChunkOrderer;
pub use partitioner::FilePartitioner;
pub use subchunker::SubChunker;

use crate::config::ChunkingConfig;
use crate::models::{Chunk, ChunkSummary};

#[derive(Debug, Clone, Copy)]
pub struct DiffChunker {
    estimator: SizeEstimator,
    partitioner: FilePartitioner,
    classifier: PriorityClassifier,
    sub_chunker: SubChunker,
    orderer: ChunkOrderer,
}

impl DiffChunker {
    pub fn new(config: ChunkingConfig) -> Self {
        let estimator = SizeEstimator::new(config);
        let classifier = PriorityClassifier::new();
        Self {
            estimator,
            partitioner: FilePartitioner::new(),
            classifier,
            sub_chunker: SubChunker::new(estimator, classifier),
            orderer: ChunkOrderer::new(),
        }
    }

    pub fn estimator(&self) -> &SizeEstimator {
        &self.estimator
    }

    /// Partition `diff` and order the chunks for analysis. Blank input
    /// produces no chunks.
    pub fn chunk(&self, diff: &str) -> Vec<Chunk> {
        if diff.trim().is_empty() {
            return Vec::new();
        }

        if self.estimator.fits(diff) {
            tracing::debug!(
                "Diff fits the budget (~{} tokens), using a single chunk",
                self.estimator.estimate_tokens(diff)
            );
            return vec![Chunk::full_diff(diff)];
        }

        let segments = self.partitioner.partition(diff);
        tracing::debug!("Partitioned oversized diff into {} file segment(s)", segments.len());

        let mut chunks = Vec::new();
        for segment in &segments {
            if self.estimator.fits(&segment.content) {
                chunks.push(Chunk {
                    label: segment.display_name().to_string(),
                    path: segment.path.clone(),
                    part: None,
                    ordinal: 0,
                    content: segment.content.clone(),
                    priority: self.classifier.classify(&segment.path),
                });
            } else {
                chunks.extend(self.sub_chunker.split(segment));
            }
        }

        for (ordinal, chunk) in chunks.iter_mut().enumerate() {
            chunk.ordinal = ordinal;
        }

        self.orderer.order(chunks)
    }

    pub fn summarize(&self, chunks: &[Chunk]) -> ChunkSummary {
        ChunkSummary::from_chunks(chunks)
    }
}

impl Default for DiffChunker {
    fn default() -> Self {
        Self::new(ChunkingConfig::default())
    }
}

use crate::chunking::classifier::PriorityClassifier;
use crate::chunking::estimator::SizeEstimator;
use crate::models::{Chunk, DiffSegment};

/// Splits an oversized file segment into sequential parts that each fit the
/// sub-chunk budget.
#[derive(Debug, Clone, Copy)]
pub struct SubChunker {
    estimator: SizeEstimator,
    classifier: PriorityClassifier,
}

impl SubChunker {
    pub fn new(estimator: SizeEstimator, classifier: PriorityClassifier) -> Self {
        Self {
            estimator,
            classifier,
        }
    }

    /// Always yields at least one part. Parts are whole lines, with one
    /// exception: a line longer than the sub-budget is cut at character
    /// boundaries and its pieces land in consecutive parts, so no part
    /// exceeds the sub-budget. Joining the parts still gives back the
    /// segment exactly.
    pub fn split(&self, segment: &DiffSegment) -> Vec<Chunk> {
        let sub_budget = self.estimator.config().sub_chunk_budget();
        let capacity = self.estimator.char_capacity(sub_budget).max(1);
        let priority = self.classifier.classify(&segment.path);

        let mut parts: Vec<String> = Vec::new();
        let mut buffer = String::new();
        let mut buffer_chars = 0;

        for line in segment.content.split_inclusive('\n') {
            for piece in split_by_chars(line, capacity) {
                let piece_chars = piece.chars().count();
                if !buffer.is_empty() && buffer_chars + piece_chars > capacity {
                    parts.push(std::mem::take(&mut buffer));
                    buffer_chars = 0;
                }
                buffer.push_str(piece);
                buffer_chars += piece_chars;
            }
        }

        if !buffer.is_empty() || parts.is_empty() {
            parts.push(buffer);
        }

        tracing::debug!(
            "Split {} into {} part(s) of at most {} chars",
            segment.display_name(),
            parts.len(),
            capacity
        );

        parts
            .into_iter()
            .enumerate()
            .map(|(i, content)| Chunk {
                label: format!("{} (Part {})", segment.display_name(), i + 1),
                path: segment.path.clone(),
                part: Some(i + 1),
                ordinal: i,
                content,
                priority,
            })
            .collect()
    }
}

/// Cut `text` into consecutive slices of at most `max_chars` characters.
fn split_by_chars(text: &str, max_chars: usize) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut count = 0;

    for (idx, _) in text.char_indices() {
        if count == max_chars {
            pieces.push(&text[start..idx]);
            start = idx;
            count = 0;
        }
        count += 1;
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }

    pieces
}

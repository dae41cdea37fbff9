use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Label used for the single chunk produced when the whole diff fits.
pub const FULL_DIFF_LABEL: &str = "Full diff";

/// One file's worth of diff text, including its `diff --git` header line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffSegment {
    pub path: String,
    pub content: String,
}

impl DiffSegment {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    /// Name shown to users. Segments without a recognized header have no path.
    pub fn display_name(&self) -> &str {
        if self.path.is_empty() {
            "diff"
        } else {
            &self.path
        }
    }
}

/// Analysis priority of a chunk. Variants are declared lowest first so the
/// derived ordering is `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityTier {
    Low,
    Medium,
    High,
}

impl PriorityTier {
    pub const HIGHEST: PriorityTier = PriorityTier::High;
}

impl std::fmt::Display for PriorityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PriorityTier::Low => write!(f, "Low"),
            PriorityTier::Medium => write!(f, "Medium"),
            PriorityTier::High => write!(f, "High"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
    pub label: String,
    /// Source file path; empty for the full-diff chunk and header-less input.
    pub path: String,
    /// 1-based part index when the file was sub-chunked.
    pub part: Option<usize>,
    /// Position in the unsorted chunk sequence.
    pub ordinal: usize,
    #[serde(skip_serializing)]
    pub content: String,
    pub priority: PriorityTier,
}

impl Chunk {
    pub fn full_diff(content: impl Into<String>) -> Self {
        Self {
            label: FULL_DIFF_LABEL.to_string(),
            path: String::new(),
            part: None,
            ordinal: 0,
            content: content.into(),
            priority: PriorityTier::HIGHEST,
        }
    }

    pub fn is_full_diff(&self) -> bool {
        self.label == FULL_DIFF_LABEL && self.path.is_empty()
    }

    pub fn char_count(&self) -> usize {
        self.content.chars().count()
    }

    /// Lowercased file extension of the chunk's source path, if any.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.path)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChunkSummary {
    pub total_chunks: usize,
    pub total_chars: usize,
    pub by_extension: BTreeMap<String, usize>,
}

impl ChunkSummary {
    pub fn from_chunks(chunks: &[Chunk]) -> Self {
        let mut by_extension = BTreeMap::new();
        for chunk in chunks {
            let ext = chunk.extension().unwrap_or_else(|| "(none)".to_string());
            *by_extension.entry(ext).or_insert(0) += 1;
        }

        Self {
            total_chunks: chunks.len(),
            total_chars: chunks.iter().map(Chunk::char_count).sum(),
            by_extension,
        }
    }
}

impl std::fmt::Display for ChunkSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} chunk(s), {} chars", self.total_chunks, self.total_chars)?;
        if !self.by_extension.is_empty() {
            let breakdown = self
                .by_extension
                .iter()
                .map(|(ext, count)| format!("{}: {}", ext, count))
                .collect::<Vec<_>>()
                .join(", ");
            write!(f, " [{}]", breakdown)?;
        }
        Ok(())
    }
}

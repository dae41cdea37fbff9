use crate::models::Chunk;

#[derive(Debug, Clone, Copy, Default)]
pub struct ChunkOrderer;

impl ChunkOrderer {
    pub fn new() -> Self {
        Self
    }

    /// Highest priority first. `sort_by` is stable, so equal tiers keep their
    /// encounter order and a file's parts stay ascending.
    pub fn order(&self, mut chunks: Vec<Chunk>) -> Vec<Chunk> {
        chunks.sort_by(|a, b| b.priority.cmp(&a.priority));
        chunks
    }
}
